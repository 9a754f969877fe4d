//! Routing model: jobs, operations, machine assignments.
//!
//! The routing is the static description of a job-shop instance: each job
//! is a fixed, ordered chain of operations, each operation occupying one
//! machine for a known nominal duration. It is read-only configuration for
//! a planning round; the scheduler never mutates it.
//!
//! # Time Representation
//! All times are integer minutes relative to the planning epoch (t=0).
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 1

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Job identifier. Arbitrary, need not be contiguous.
pub type JobId = u32;

/// Machine identifier. Arbitrary, need not be contiguous.
pub type MachineId = u32;

/// Reference to one operation: a job and the 0-based position within it.
///
/// The persisted/displayed form is 1-based; translation happens at the
/// serialization boundary, never inside the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OpRef {
    /// Owning job.
    pub job: JobId,
    /// Position within the job's operation chain (0-based).
    pub index: usize,
}

impl OpRef {
    /// Creates an operation reference.
    pub fn new(job: JobId, index: usize) -> Self {
        Self { job, index }
    }
}

/// A single operation: one machine, one nominal duration.
///
/// Immutable once the routing is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Machine this operation occupies exclusively.
    pub machine: MachineId,
    /// Nominal processing time (minutes, strictly positive).
    pub duration: i64,
}

/// A job: an ordered chain of operations executed strictly in index order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique job identifier.
    pub id: JobId,
    /// Operations in technological order.
    pub ops: Vec<Operation>,
}

/// One input record, as read from a tabular routing source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingRecord {
    /// Job identifier.
    pub job: JobId,
    /// Operation index within the job (0-based, dense).
    pub index: usize,
    /// Machine identifier.
    pub machine: MachineId,
    /// Nominal processing time (minutes).
    pub duration: i64,
}

/// Routing input rejected at construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoutingError {
    /// Operation indices of a job must be dense and start at 0.
    #[error("job {job}: operation indices must be dense from 0, found {found} where {expected} was expected")]
    NonDenseOperations {
        /// Offending job.
        job: JobId,
        /// Index found in the input.
        found: usize,
        /// Index that was expected at this position.
        expected: usize,
    },
    /// The same (job, operation) pair appeared twice.
    #[error("job {job}: operation {index} defined more than once")]
    DuplicateOperation {
        /// Offending job.
        job: JobId,
        /// Duplicated operation index.
        index: usize,
    },
    /// An operation must occupy realistically positive time.
    #[error("job {job} operation {index}: processing time {duration} is not positive")]
    NonPositiveDuration {
        /// Offending job.
        job: JobId,
        /// Offending operation index.
        index: usize,
        /// Rejected duration value.
        duration: i64,
    },
}

/// Static job-shop instance: all jobs with their operation chains.
///
/// Jobs keep the order in which they first appeared in the input. The
/// scheduler seeds its ready list in that order and tie-breaks depend on
/// it, so the order is part of the model, not an accident of storage.
///
/// # Example
///
/// ```
/// use replan::models::{RoutingModel, RoutingRecord};
///
/// let routing = RoutingModel::from_records([
///     RoutingRecord { job: 1, index: 0, machine: 1, duration: 2 },
///     RoutingRecord { job: 1, index: 1, machine: 2, duration: 5 },
/// ]).unwrap();
/// assert_eq!(routing.operation_count(), 2);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutingModel {
    jobs: Vec<Job>,
}

impl RoutingModel {
    /// Builds a routing from input records.
    ///
    /// Records may arrive in any order; within each job they are sorted by
    /// operation index and then required to be dense from 0. Non-positive
    /// durations and duplicate (job, operation) pairs are rejected here,
    /// never discovered mid-run.
    pub fn from_records<I>(records: I) -> Result<Self, RoutingError>
    where
        I: IntoIterator<Item = RoutingRecord>,
    {
        let mut order: Vec<JobId> = Vec::new();
        let mut by_job: HashMap<JobId, Vec<RoutingRecord>> = HashMap::new();

        for rec in records {
            if rec.duration <= 0 {
                return Err(RoutingError::NonPositiveDuration {
                    job: rec.job,
                    index: rec.index,
                    duration: rec.duration,
                });
            }
            by_job
                .entry(rec.job)
                .or_insert_with(|| {
                    order.push(rec.job);
                    Vec::new()
                })
                .push(rec);
        }

        let mut jobs = Vec::with_capacity(order.len());
        for job_id in order {
            let mut recs = by_job.remove(&job_id).unwrap_or_default();
            recs.sort_by_key(|r| r.index);

            let mut ops = Vec::with_capacity(recs.len());
            for (expected, rec) in recs.iter().enumerate() {
                if rec.index + 1 == expected {
                    return Err(RoutingError::DuplicateOperation {
                        job: job_id,
                        index: rec.index,
                    });
                }
                if rec.index != expected {
                    return Err(RoutingError::NonDenseOperations {
                        job: job_id,
                        found: rec.index,
                        expected,
                    });
                }
                ops.push(Operation {
                    machine: rec.machine,
                    duration: rec.duration,
                });
            }
            jobs.push(Job { id: job_id, ops });
        }

        Ok(Self { jobs })
    }

    /// Jobs in first-seen input order.
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Looks up a job by id.
    pub fn job(&self, id: JobId) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == id)
    }

    /// Looks up one operation.
    pub fn operation(&self, op: OpRef) -> Option<&Operation> {
        self.job(op.job).and_then(|j| j.ops.get(op.index))
    }

    /// Total number of operations across all jobs.
    pub fn operation_count(&self) -> usize {
        self.jobs.iter().map(|j| j.ops.len()).sum()
    }

    /// Distinct machine ids in first-seen order.
    pub fn machines(&self) -> Vec<MachineId> {
        let mut seen = Vec::new();
        for job in &self.jobs {
            for op in &job.ops {
                if !seen.contains(&op.machine) {
                    seen.push(op.machine);
                }
            }
        }
        seen
    }

    /// Whether the routing holds no operations.
    pub fn is_empty(&self) -> bool {
        self.jobs.iter().all(|j| j.ops.is_empty())
    }

    /// Copy of the routing with every duration replaced by `f`.
    ///
    /// Structure (job order, operation order, machines) is preserved. Used
    /// to feed a perturbed instance into a planning round; the caller is
    /// responsible for keeping durations positive.
    pub fn map_durations(&self, mut f: impl FnMut(OpRef, &Operation) -> i64) -> Self {
        let jobs = self
            .jobs
            .iter()
            .map(|job| Job {
                id: job.id,
                ops: job
                    .ops
                    .iter()
                    .enumerate()
                    .map(|(index, op)| Operation {
                        machine: op.machine,
                        duration: f(OpRef::new(job.id, index), op),
                    })
                    .collect(),
            })
            .collect();
        Self { jobs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(job: JobId, index: usize, machine: MachineId, duration: i64) -> RoutingRecord {
        RoutingRecord {
            job,
            index,
            machine,
            duration,
        }
    }

    #[test]
    fn test_build_and_lookup() {
        let routing = RoutingModel::from_records([
            rec(1, 0, 1, 2),
            rec(1, 1, 2, 5),
            rec(2, 0, 2, 2),
        ])
        .unwrap();

        assert_eq!(routing.jobs().len(), 2);
        assert_eq!(routing.operation_count(), 3);
        let op = routing.operation(OpRef::new(1, 1)).unwrap();
        assert_eq!(op.machine, 2);
        assert_eq!(op.duration, 5);
        assert!(routing.operation(OpRef::new(1, 2)).is_none());
        assert!(routing.operation(OpRef::new(9, 0)).is_none());
    }

    #[test]
    fn test_first_seen_job_order() {
        let routing = RoutingModel::from_records([
            rec(7, 0, 1, 1),
            rec(3, 0, 1, 1),
            rec(7, 1, 2, 1),
        ])
        .unwrap();
        let ids: Vec<JobId> = routing.jobs().iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![7, 3]);
    }

    #[test]
    fn test_out_of_order_records_accepted() {
        let routing =
            RoutingModel::from_records([rec(1, 1, 2, 5), rec(1, 0, 1, 2)]).unwrap();
        assert_eq!(routing.job(1).unwrap().ops[0].machine, 1);
        assert_eq!(routing.job(1).unwrap().ops[1].machine, 2);
    }

    #[test]
    fn test_rejects_non_positive_duration() {
        let err = RoutingModel::from_records([rec(1, 0, 1, 0)]).unwrap_err();
        assert_eq!(
            err,
            RoutingError::NonPositiveDuration {
                job: 1,
                index: 0,
                duration: 0
            }
        );

        let err = RoutingModel::from_records([rec(1, 0, 1, -3)]).unwrap_err();
        assert!(matches!(err, RoutingError::NonPositiveDuration { .. }));
    }

    #[test]
    fn test_rejects_gap_in_indices() {
        let err = RoutingModel::from_records([rec(1, 0, 1, 1), rec(1, 2, 2, 1)]).unwrap_err();
        assert_eq!(
            err,
            RoutingError::NonDenseOperations {
                job: 1,
                found: 2,
                expected: 1
            }
        );
    }

    #[test]
    fn test_rejects_one_based_indices() {
        let err = RoutingModel::from_records([rec(1, 1, 1, 1)]).unwrap_err();
        assert!(matches!(err, RoutingError::NonDenseOperations { expected: 0, .. }));
    }

    #[test]
    fn test_rejects_duplicate_operation() {
        let err = RoutingModel::from_records([rec(1, 0, 1, 1), rec(1, 0, 2, 4)]).unwrap_err();
        assert_eq!(err, RoutingError::DuplicateOperation { job: 1, index: 0 });
    }

    #[test]
    fn test_machines_first_seen() {
        let routing = RoutingModel::from_records([
            rec(1, 0, 3, 1),
            rec(1, 1, 1, 1),
            rec(2, 0, 3, 1),
        ])
        .unwrap();
        assert_eq!(routing.machines(), vec![3, 1]);
    }

    #[test]
    fn test_empty_routing() {
        let routing = RoutingModel::from_records([]).unwrap();
        assert!(routing.is_empty());
        assert_eq!(routing.operation_count(), 0);
    }
}
