//! Scheduling domain models.
//!
//! Core data types for one planning round: the static [`RoutingModel`]
//! (jobs → ordered operations → machine, duration), the produced
//! [`Schedule`], and the read-only [`PreviousPlan`] a later round
//! reschedules against.
//!
//! Ownership follows the round lifecycle: a routing is read-only
//! configuration, a schedule is produced exactly once per run, and a
//! previous plan is a prior schedule handed forward, never mutated.

mod plan;
mod routing;
mod schedule;

pub use plan::{PreviousPlan, RollingHorizonWindow};
pub use routing::{Job, JobId, MachineId, Operation, OpRef, RoutingError, RoutingModel, RoutingRecord};
pub use schedule::{Schedule, ScheduleEntry};
