//! Boundary adapters: routing CSV input, previous-plan JSON persistence.
//!
//! The core works on [`RoutingModel`] and [`PreviousPlan`] values; this
//! module is where tabular files become those values. Two conventions live
//! only here and never leak inward:
//!
//! - Routing CSV columns are `Routing_ID, Operation, Machine,
//!   Processing Time` (whitespace-tolerant), machines as integer ids.
//! - Persisted plan records carry 1-based operation numbers; the core is
//!   0-based. Translation happens on load and save.
//!
//! A missing previous-plan file is a normal first round. A malformed one
//! is downgraded to "missing" with a warning, and the round proceeds with
//! the policy's no-history behavior instead of refusing to plan.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::models::{
    JobId, MachineId, OpRef, PreviousPlan, RoutingError, RoutingModel, RoutingRecord, Schedule,
};

/// Failures of the file adapters.
#[derive(Debug, Error)]
pub enum IoError {
    /// Filesystem failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// CSV syntax or field failure.
    #[error(transparent)]
    Csv(#[from] csv::Error),
    /// The rows parsed but do not form a valid routing.
    #[error(transparent)]
    Routing(#[from] RoutingError),
    /// JSON encoding failure on save.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// One row of the routing CSV.
#[derive(Debug, Deserialize)]
struct RoutingRow {
    #[serde(rename = "Routing_ID")]
    job: JobId,
    #[serde(rename = "Operation")]
    index: usize,
    #[serde(rename = "Machine")]
    machine: MachineId,
    #[serde(rename = "Processing Time")]
    duration: i64,
}

/// One persisted plan record. `op` is 1-based in this form.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PlanRecord {
    job: JobId,
    op: usize,
    machine: MachineId,
    start: i64,
    end: i64,
}

/// Reads a routing from CSV.
///
/// Validation failures (gaps in operation indices, non-positive durations)
/// are surfaced to the caller as errors, not planned around.
pub fn read_routing_csv(path: impl AsRef<Path>) -> Result<RoutingModel, IoError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path.as_ref())?;

    let mut records = Vec::new();
    for row in reader.deserialize() {
        let row: RoutingRow = row?;
        records.push(RoutingRecord {
            job: row.job,
            index: row.index,
            machine: row.machine,
            duration: row.duration,
        });
    }

    let routing = RoutingModel::from_records(records)?;
    info!(
        jobs = routing.jobs().len(),
        operations = routing.operation_count(),
        "routing loaded"
    );
    Ok(routing)
}

/// Loads the previous plan, if a usable one exists.
///
/// `None` means "plan without history": the file is absent (first round)
/// or unreadable/malformed (downgraded with a warning, never fatal).
pub fn load_previous_plan(path: impl AsRef<Path>) -> Option<PreviousPlan> {
    let path = path.as_ref();
    if !path.exists() {
        info!(path = %path.display(), "no previous plan, starting fresh");
        return None;
    }

    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "previous plan unreadable, ignoring it");
            return None;
        }
    };

    let records: Vec<PlanRecord> = match serde_json::from_str(&text) {
        Ok(records) => records,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "previous plan malformed, ignoring it");
            return None;
        }
    };

    if records.iter().any(|r| r.op == 0) {
        warn!(path = %path.display(), "previous plan has a 0 operation number, ignoring it");
        return None;
    }

    Some(PreviousPlan::from_parts(records.into_iter().map(|r| {
        (
            OpRef::new(r.job, r.op - 1),
            r.machine,
            r.start,
            r.end,
        )
    })))
}

/// Persists a schedule as the next round's previous plan.
///
/// Entries are written in (machine, start) order with 1-based operation
/// numbers, matching what [`load_previous_plan`] reads back.
pub fn save_previous_plan(path: impl AsRef<Path>, schedule: &Schedule) -> Result<(), IoError> {
    let records: Vec<PlanRecord> = schedule
        .sorted_entries()
        .into_iter()
        .map(|e| PlanRecord {
            job: e.op.job,
            op: e.op.index + 1,
            machine: e.machine,
            start: e.start,
            end: e.end,
        })
        .collect();

    fs::write(path.as_ref(), serde_json::to_string_pretty(&records)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScheduleEntry;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_read_routing_csv() {
        let file = write_file(
            "Routing_ID,Operation,Machine,Processing Time\n\
             1,0,1,2\n\
             1,1,2,5\n\
             2,0,2,2\n",
        );
        let routing = read_routing_csv(file.path()).unwrap();
        assert_eq!(routing.jobs().len(), 2);
        assert_eq!(routing.operation_count(), 3);
        assert_eq!(routing.operation(OpRef::new(1, 1)).unwrap().duration, 5);
    }

    #[test]
    fn test_read_routing_csv_tolerates_padding() {
        let file = write_file(
            "Routing_ID, Operation, Machine, Processing Time\n\
             1, 0, 3, 7\n",
        );
        let routing = read_routing_csv(file.path()).unwrap();
        assert_eq!(routing.operation(OpRef::new(1, 0)).unwrap().machine, 3);
    }

    #[test]
    fn test_read_routing_csv_rejects_bad_routing() {
        // Operation indices 0,2 leave a gap.
        let file = write_file(
            "Routing_ID,Operation,Machine,Processing Time\n\
             1,0,1,2\n\
             1,2,2,5\n",
        );
        let err = read_routing_csv(file.path()).unwrap_err();
        assert!(matches!(err, IoError::Routing(_)));
    }

    #[test]
    fn test_read_routing_csv_rejects_garbage_fields() {
        let file = write_file(
            "Routing_ID,Operation,Machine,Processing Time\n\
             1,zero,1,2\n",
        );
        assert!(matches!(
            read_routing_csv(file.path()).unwrap_err(),
            IoError::Csv(_)
        ));
    }

    #[test]
    fn test_plan_round_trip_translates_indices() {
        let mut schedule = Schedule::new();
        schedule.push(ScheduleEntry {
            op: OpRef::new(1, 0),
            machine: 1,
            start: 0,
            end: 2,
        });
        schedule.push(ScheduleEntry {
            op: OpRef::new(1, 1),
            machine: 2,
            start: 2,
            end: 7,
        });

        let file = NamedTempFile::new().unwrap();
        save_previous_plan(file.path(), &schedule).unwrap();

        // The persisted form is 1-based.
        let text = fs::read_to_string(file.path()).unwrap();
        assert!(text.contains("\"op\": 1"));
        assert!(text.contains("\"op\": 2"));
        assert!(!text.contains("\"op\": 0"));

        // Loading translates back to the 0-based core representation.
        let plan = load_previous_plan(file.path()).unwrap();
        assert_eq!(plan.start_of(OpRef::new(1, 0)), Some(0));
        assert_eq!(plan.start_of(OpRef::new(1, 1)), Some(2));
        assert_eq!(plan.makespan(), 7);
    }

    #[test]
    fn test_missing_plan_is_none() {
        assert!(load_previous_plan("/nonexistent/previous_schedule.json").is_none());
    }

    #[test]
    fn test_malformed_plan_degrades_to_none() {
        let file = write_file("{ this is not json ");
        assert!(load_previous_plan(file.path()).is_none());

        // Valid JSON, wrong shape.
        let file = write_file("{\"job\": 1}");
        assert!(load_previous_plan(file.path()).is_none());

        // 0-based op in the persisted form is out of contract.
        let file = write_file(
            "[{\"job\": 1, \"op\": 0, \"machine\": 1, \"start\": 0, \"end\": 2}]",
        );
        assert!(load_previous_plan(file.path()).is_none());
    }
}
