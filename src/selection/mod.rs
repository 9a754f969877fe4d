//! Conflict-set selection rules and their shared contract.
//!
//! Giffler-Thompson reduces every iteration to one decision: which member
//! of the conflict set gets the critical machine next. A
//! [`SelectionPolicy`] makes that decision; everything else about the
//! algorithm stays fixed, so new rules are added without touching the
//! scheduler loop.
//!
//! # Usage
//!
//! ```
//! use replan::selection::{rules, PolicyKind};
//!
//! let policy = rules::BufferInsertion;
//! let fallback = PolicyKind::from_name("no-such-rule"); // normalizes to SPT
//! assert_eq!(fallback, PolicyKind::ShortestProcessing);
//! ```
//!
//! # Determinism
//! Rules must be pure functions of the conflict set and the previous plan:
//! identical inputs, identical output. Candidates are presented in
//! first-seen ready order, and every rule resolves residual ties by keeping
//! the earliest candidate, so no unordered iteration can leak in.
//!
//! # References
//! - Giffler & Thompson (1960), "Algorithms for Solving Production-Scheduling Problems"
//! - Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

pub mod rules;

use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{JobId, MachineId, OpRef, PreviousPlan};

/// One ready operation competing for the critical machine.
///
/// Carries everything a rule may score: the candidate start
/// (`max(t(o), free(machine))`), the earliest completion, and the duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    /// The operation itself.
    pub op: OpRef,
    /// Machine the operation runs on (the critical machine).
    pub machine: MachineId,
    /// Processing time used this round (possibly perturbed).
    pub duration: i64,
    /// Earliest feasible start if chosen now.
    pub start: i64,
    /// Earliest completion: start + duration.
    pub completion: i64,
}

impl Candidate {
    /// Owning job of the candidate operation.
    pub fn job(&self) -> JobId {
        self.op.job
    }
}

/// The conflict set of one scheduler iteration.
///
/// All candidates run on the same (critical) machine and could still start
/// before the critical completion time. Never empty: it always contains at
/// least the critical operation. Candidates keep first-seen ready order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    /// Critical machine all candidates compete for.
    pub machine: MachineId,
    /// Critical completion time (smallest earliest completion in the ready set).
    pub completion: i64,
    /// Competing operations, in first-seen ready order.
    pub candidates: Vec<Candidate>,
}

/// A rule that picks exactly one operation from a conflict set.
///
/// # Contract
/// The returned operation must be a member of the conflict set; the
/// scheduler verifies this and aborts the run otherwise. Rules with no use
/// for plan history must behave as if every previous-start lookup returned
/// "absent"; that is the degraded mode the scheduler relies on when no
/// previous plan exists.
pub trait SelectionPolicy: Send + Sync + Debug {
    /// Rule name (e.g., "SPT", "BUFFER_INSERT").
    fn name(&self) -> &'static str;

    /// Picks one candidate from the conflict set.
    fn choose(&self, conflict: &Conflict, previous: &PreviousPlan) -> OpRef;

    /// Rule description.
    fn description(&self) -> &'static str {
        self.name()
    }
}

/// Named selection rules, for configuration surfaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyKind {
    /// Shortest processing time (KOZ).
    #[default]
    ShortestProcessing,
    /// Weighted start-time / sequence-position deviation from the previous plan.
    PlanFidelity,
    /// Overdue work first, then plan fidelity (rolling horizon).
    OverduePriority,
    /// Insert new work only into free gaps, otherwise preserve legacy order.
    BufferInsertion,
    /// Squared start-time deviation from the previous plan.
    QuadraticDeviation,
}

impl PolicyKind {
    /// Parses a policy name.
    ///
    /// Unknown names normalize to [`PolicyKind::ShortestProcessing`] with a
    /// warning; the run proceeds with a degraded rule instead of refusing
    /// to plan.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "spt" | "koz" | "shortest" => Self::ShortestProcessing,
            "fidelity" | "plan-fidelity" | "plan_fidelity" | "mininv" => Self::PlanFidelity,
            "overdue" | "rolling" | "rolling-horizon" => Self::OverduePriority,
            "buffer" | "buffer-insert" | "buffer_insert" | "insert" => Self::BufferInsertion,
            "quadratic" | "quad" => Self::QuadraticDeviation,
            other => {
                warn!(policy = other, "unknown selection policy, falling back to SPT");
                Self::ShortestProcessing
            }
        }
    }

    /// Builds the rule with its default parameters.
    pub fn build(self) -> Box<dyn SelectionPolicy> {
        match self {
            Self::ShortestProcessing => Box::new(rules::ShortestProcessing),
            Self::PlanFidelity => Box::new(rules::PlanFidelity::default()),
            Self::OverduePriority => Box::new(rules::OverduePriority::default()),
            Self::BufferInsertion => Box::new(rules::BufferInsertion),
            Self::QuadraticDeviation => Box::new(rules::QuadraticDeviation),
        }
    }
}
