//! Giffler-Thompson construction loop.
//!
//! # Algorithm
//!
//! 1. Recompute the ready set (first unscheduled operation per job).
//! 2. Stop when nothing is ready.
//! 3. Resolve the conflict: critical completion, critical machine, conflict set.
//! 4. Let the selection rule pick one conflict-set member.
//! 5. Commit it: start = max(earliest bound, machine free), end = start + duration.
//! 6. Losers wait until the machine clears; the winner's successor becomes ready.
//!
//! Exactly one operation commits per iteration, so the loop runs exactly
//! (operation count) times.
//!
//! # Reference
//! Giffler & Thompson (1960), "Algorithms for Solving Production-Scheduling Problems"

use std::sync::Arc;

use tracing::debug;

use crate::models::{PreviousPlan, RoutingModel, Schedule};
use crate::selection::{rules, PolicyKind, SelectionPolicy};

use super::state::ScheduleState;
use super::ScheduleError;

/// Active-schedule builder with a pluggable selection rule.
///
/// Strictly single-threaded and deterministic: identical routing, previous
/// plan, and rule reproduce an identical schedule.
///
/// # Example
///
/// ```
/// use replan::models::{RoutingModel, RoutingRecord};
/// use replan::scheduler::GifflerThompson;
///
/// let routing = RoutingModel::from_records([
///     RoutingRecord { job: 1, index: 0, machine: 1, duration: 2 },
///     RoutingRecord { job: 2, index: 0, machine: 1, duration: 5 },
/// ]).unwrap();
///
/// let schedule = GifflerThompson::new().schedule(&routing).unwrap();
/// assert_eq!(schedule.len(), 2);
/// assert_eq!(schedule.makespan(), 7);
/// ```
#[derive(Debug, Clone)]
pub struct GifflerThompson {
    policy: Arc<dyn SelectionPolicy>,
}

impl GifflerThompson {
    /// Creates a scheduler with the shortest-processing-time rule.
    pub fn new() -> Self {
        Self {
            policy: Arc::new(rules::ShortestProcessing),
        }
    }

    /// Sets the selection rule.
    pub fn with_policy<P: SelectionPolicy + 'static>(mut self, policy: P) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    /// Sets a named rule with its default parameters.
    pub fn with_policy_kind(mut self, kind: PolicyKind) -> Self {
        self.policy = Arc::from(kind.build());
        self
    }

    /// Name of the active selection rule.
    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Builds a schedule with no plan history.
    pub fn schedule(&self, routing: &RoutingModel) -> Result<Schedule, ScheduleError> {
        self.schedule_against(routing, &PreviousPlan::empty())
    }

    /// Builds a schedule, letting the rule consult a previous plan.
    ///
    /// An empty previous plan is not an error: every rule degrades to its
    /// no-history behavior, exactly as if each previous-start lookup
    /// returned "absent".
    pub fn schedule_against(
        &self,
        routing: &RoutingModel,
        previous: &PreviousPlan,
    ) -> Result<Schedule, ScheduleError> {
        let mut state = ScheduleState::new(routing);
        let mut schedule = Schedule::new();

        while !state.is_done() {
            let conflict = state.resolve_conflict()?;
            let chosen_op = self.policy.choose(&conflict, previous);
            let chosen = conflict
                .candidates
                .iter()
                .find(|c| c.op == chosen_op)
                .copied()
                .ok_or(ScheduleError::ChoiceOutsideConflict {
                    job: chosen_op.job,
                    index: chosen_op.index,
                })?;

            let entry = state.commit(routing, &conflict, &chosen);
            debug!(
                job = entry.op.job,
                op = entry.op.index,
                machine = entry.machine,
                start = entry.start,
                end = entry.end,
                rule = self.policy.name(),
                "committed operation"
            );
            schedule.push(entry);
        }

        Ok(schedule)
    }
}

impl Default for GifflerThompson {
    fn default() -> Self {
        Self::new()
    }
}
