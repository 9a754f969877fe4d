//! Active-schedule construction and stability evaluation.
//!
//! # Algorithm
//!
//! [`GifflerThompson`] builds an active schedule: each iteration finds the
//! ready operation finishing earliest, collects every ready operation that
//! competes for its machine before that completion (the conflict set), and
//! lets the configured selection rule commit exactly one of them. No
//! operation could be moved earlier without delaying another or breaking
//! precedence.
//!
//! # Stability
//!
//! [`StabilityMetrics`] compares a fresh schedule against the previous
//! plan: aggregate start-time displacement and machine-sequence inversion
//! count, the two nervousness measures of rolling rescheduling.
//!
//! # References
//!
//! - Giffler & Thompson (1960), "Algorithms for Solving Production-Scheduling Problems"
//! - Vieira, Herrmann & Lin (2003), "Rescheduling Manufacturing Systems"

mod engine;
mod stability;
mod state;

pub use engine::GifflerThompson;
pub use stability::StabilityMetrics;
pub use state::ScheduleState;

use thiserror::Error;

use crate::models::{JobId, MachineId};

/// Fatal contract violations during schedule construction.
///
/// These indicate a bug in a custom selection rule or a broken data model,
/// never a schedulable situation; the run aborts rather than recovers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    /// The conflict set came out empty while operations were still ready.
    #[error("empty conflict set on machine {machine} with {ready} operations ready")]
    EmptyConflictSet {
        /// Critical machine of the failed iteration.
        machine: MachineId,
        /// Ready-list size at the time of failure.
        ready: usize,
    },
    /// A selection rule returned an operation outside the conflict set.
    #[error("selection rule chose job {job} operation {index}, which is not in the conflict set")]
    ChoiceOutsideConflict {
        /// Job of the offending choice.
        job: JobId,
        /// Operation index of the offending choice.
        index: usize,
    },
}
