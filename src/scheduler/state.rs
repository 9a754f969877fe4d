//! Mutable state of one schedule-construction pass.
//!
//! Owns the per-operation earliest-start bounds, the per-machine free
//! times, and the ready list. All three are confined to a single scheduler
//! run and discarded with it; nothing here is shared or global.
//!
//! The ready list is an explicitly ordered sequence: jobs seed it in
//! routing order, successors append at the tail when their predecessor
//! commits. Every argmin over it keeps the earliest element on ties, which
//! makes first-seen order part of the algorithm's observable behavior.

use std::collections::HashMap;

use crate::models::{MachineId, OpRef, RoutingModel, ScheduleEntry};
use crate::selection::{Candidate, Conflict};

use super::ScheduleError;

/// One entry of the ready list, with its routing data resolved.
#[derive(Debug, Clone, Copy)]
struct ReadyOp {
    op: OpRef,
    machine: MachineId,
    duration: i64,
}

/// Run-time state of one construction pass.
#[derive(Debug)]
pub struct ScheduleState {
    /// Earliest-allowed start per operation, t(o). Monotone non-decreasing:
    /// raised by predecessor completion or by losing a conflict.
    earliest: HashMap<OpRef, i64>,
    /// Time after which each machine accepts new work. Monotone non-decreasing.
    machine_free: HashMap<MachineId, i64>,
    /// Schedulable operations, in first-seen order.
    ready: Vec<ReadyOp>,
}

impl ScheduleState {
    /// Seeds the state: every job's first operation is ready at t=0, every
    /// machine is free at t=0.
    pub fn new(routing: &RoutingModel) -> Self {
        let mut machine_free = HashMap::new();
        let mut ready = Vec::with_capacity(routing.jobs().len());

        for job in routing.jobs() {
            for op in &job.ops {
                machine_free.entry(op.machine).or_insert(0);
            }
            if let Some(first) = job.ops.first() {
                ready.push(ReadyOp {
                    op: OpRef::new(job.id, 0),
                    machine: first.machine,
                    duration: first.duration,
                });
            }
        }

        Self {
            earliest: HashMap::new(),
            machine_free,
            ready,
        }
    }

    /// Whether every operation has been committed.
    pub fn is_done(&self) -> bool {
        self.ready.is_empty()
    }

    /// Number of operations currently schedulable.
    pub fn ready_count(&self) -> usize {
        self.ready.len()
    }

    /// Earliest-allowed start of an operation.
    pub fn earliest(&self, op: OpRef) -> i64 {
        self.earliest.get(&op).copied().unwrap_or(0)
    }

    /// Free-at time of a machine.
    pub fn machine_free(&self, machine: MachineId) -> i64 {
        self.machine_free.get(&machine).copied().unwrap_or(0)
    }

    /// Computes the critical completion, critical machine, and conflict set
    /// for the current ready list.
    ///
    /// The conflict set holds every ready operation on the critical machine
    /// that could still start before the critical completion: a genuine
    /// choice, not just the critical operation itself. It is never empty
    /// for a non-empty ready list; an empty result is a fatal contract
    /// violation, not a schedulable situation.
    pub fn resolve_conflict(&self) -> Result<Conflict, ScheduleError> {
        debug_assert!(!self.ready.is_empty(), "resolve_conflict on a finished run");

        // Earliest completion per ready operation; first-seen wins ties.
        let mut critical: Option<Candidate> = None;
        let mut candidates = Vec::with_capacity(self.ready.len());
        for r in &self.ready {
            let start = self.earliest(r.op).max(self.machine_free(r.machine));
            let candidate = Candidate {
                op: r.op,
                machine: r.machine,
                duration: r.duration,
                start,
                completion: start + r.duration,
            };
            if critical.map_or(true, |c| candidate.completion < c.completion) {
                critical = Some(candidate);
            }
            candidates.push(candidate);
        }

        let critical = critical.ok_or(ScheduleError::EmptyConflictSet {
            machine: 0,
            ready: 0,
        })?;

        let conflict_ops: Vec<Candidate> = candidates
            .into_iter()
            .filter(|c| c.machine == critical.machine && self.earliest(c.op) < critical.completion)
            .collect();

        if conflict_ops.is_empty() {
            return Err(ScheduleError::EmptyConflictSet {
                machine: critical.machine,
                ready: self.ready.len(),
            });
        }

        Ok(Conflict {
            machine: critical.machine,
            completion: critical.completion,
            candidates: conflict_ops,
        })
    }

    /// Commits the chosen operation and returns its schedule entry.
    ///
    /// Raises the losers' earliest bounds to the winner's end, seeds the
    /// winner's successor (if any) at the tail of the ready list, and
    /// removes the winner from further consideration.
    pub fn commit(
        &mut self,
        routing: &RoutingModel,
        conflict: &Conflict,
        chosen: &Candidate,
    ) -> ScheduleEntry {
        let end = chosen.completion;
        self.machine_free.insert(chosen.machine, end);

        // Losers of the conflict wait for the machine to clear.
        for c in &conflict.candidates {
            if c.op != chosen.op {
                self.earliest.insert(c.op, end);
            }
        }

        // Technological successor becomes schedulable after this end.
        if let Some(job) = routing.job(chosen.op.job) {
            let next_index = chosen.op.index + 1;
            if let Some(next) = job.ops.get(next_index) {
                let next_ref = OpRef::new(chosen.op.job, next_index);
                self.earliest.insert(next_ref, end);
                self.ready.push(ReadyOp {
                    op: next_ref,
                    machine: next.machine,
                    duration: next.duration,
                });
            }
        }

        if let Some(pos) = self.ready.iter().position(|r| r.op == chosen.op) {
            self.ready.remove(pos);
        }

        ScheduleEntry {
            op: chosen.op,
            machine: chosen.machine,
            start: chosen.start,
            end,
        }
    }
}
