//! Built-in conflict-set selection rules.
//!
//! # Categories
//!
//! - **History-free**: SPT
//! - **Plan-stability**: PLAN_FIDELITY, OVERDUE, BUFFER_INSERT, QUADRATIC
//!
//! Every rule returns one member of the conflict set and resolves residual
//! ties deterministically (first-seen candidate order, or job id where the
//! rule defines it).
//!
//! # References
//! - Giffler & Thompson (1960), "Algorithms for Solving Production-Scheduling Problems"
//! - Vieira et al. (2003), "Rescheduling Manufacturing Systems: A Framework"

use super::{Candidate, Conflict, SelectionPolicy};
use crate::models::{OpRef, PreviousPlan, RollingHorizonWindow};

/// Score tolerance for floating-point rule scores.
const EPS: f64 = 1e-9;

/// Sequence rank assigned to operations absent from the previous
/// per-machine order: effectively unranked, deprioritized.
const SEQ_UNRANKED: usize = 1_000_000;

// ======================== History-free rule ========================

/// Shortest processing time (KOZ).
///
/// Picks the conflict-set member with the smallest duration; ties keep the
/// first-seen candidate. The classic myopic rule, and the degraded mode
/// every plan-stability rule falls back to when no history exists.
///
/// # Reference
/// Smith (1956), optimal for mean flow time on a single machine.
#[derive(Debug, Clone, Copy)]
pub struct ShortestProcessing;

impl SelectionPolicy for ShortestProcessing {
    fn name(&self) -> &'static str {
        "SPT"
    }

    fn choose(&self, conflict: &Conflict, _previous: &PreviousPlan) -> OpRef {
        let mut best = &conflict.candidates[0];
        for c in &conflict.candidates[1..] {
            if c.duration < best.duration {
                best = c;
            }
        }
        best.op
    }

    fn description(&self) -> &'static str {
        "Shortest Processing Time"
    }
}

// ======================== Plan-stability rules ========================

/// How start times are compared against the previous plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeDeviation {
    /// Absolute difference on the time axis.
    Linear,
    /// Shorter way around a recurring period (time-of-day slots).
    Cyclic {
        /// Cycle length, e.g. 24 for daily slots.
        period: i64,
    },
}

impl Default for TimeDeviation {
    fn default() -> Self {
        Self::Linear
    }
}

impl TimeDeviation {
    /// Distance between two instants under this mode.
    pub fn distance(&self, a: i64, b: i64) -> i64 {
        match self {
            Self::Linear => (a - b).abs(),
            Self::Cyclic { period } => {
                let forward = (a - b).rem_euclid(*period);
                let backward = (b - a).rem_euclid(*period);
                forward.min(backward)
            }
        }
    }
}

/// Weighted deviation from the previous plan.
///
/// `score = w_time · timeDeviation(candidateStart, previousStart)
///        + w_seq · sequencePositionDeviation`, smaller is better;
/// duration breaks score ties, first-seen order breaks the rest.
/// Operations without a previous start contribute no time deviation;
/// operations absent from the previous machine order rank as
/// [`SEQ_UNRANKED`].
#[derive(Debug, Clone, Copy)]
pub struct PlanFidelity {
    /// Weight of the start-time deviation term.
    pub w_time: f64,
    /// Weight of the sequence-position term.
    pub w_seq: f64,
    /// Linear or cyclic start-time comparison.
    pub deviation: TimeDeviation,
}

impl Default for PlanFidelity {
    fn default() -> Self {
        Self {
            w_time: 1.0,
            w_seq: 0.1,
            deviation: TimeDeviation::Linear,
        }
    }
}

impl PlanFidelity {
    /// Creates a rule with explicit weights.
    pub fn new(w_time: f64, w_seq: f64) -> Self {
        Self {
            w_time,
            w_seq,
            deviation: TimeDeviation::Linear,
        }
    }

    /// Sets cyclic time comparison with the given period.
    pub fn with_cyclic_period(mut self, period: i64) -> Self {
        self.deviation = TimeDeviation::Cyclic { period };
        self
    }

    /// Deviation score of one candidate (lower = closer to the plan).
    pub fn score(&self, candidate: &Candidate, previous: &PreviousPlan) -> f64 {
        let time_dev = previous
            .start_of(candidate.op)
            .map(|prev| self.deviation.distance(candidate.start, prev))
            .unwrap_or(0);
        let seq_dev = previous
            .position_on(candidate.machine, candidate.op)
            .unwrap_or(SEQ_UNRANKED);
        self.w_time * time_dev as f64 + self.w_seq * seq_dev as f64
    }
}

impl SelectionPolicy for PlanFidelity {
    fn name(&self) -> &'static str {
        "PLAN_FIDELITY"
    }

    fn choose(&self, conflict: &Conflict, previous: &PreviousPlan) -> OpRef {
        let mut best = &conflict.candidates[0];
        let mut best_score = self.score(best, previous);
        for c in &conflict.candidates[1..] {
            let score = self.score(c, previous);
            let tied = (score - best_score).abs() <= EPS;
            if score + EPS < best_score || (tied && c.duration < best.duration) {
                best = c;
                best_score = score;
            }
        }
        best.op
    }

    fn description(&self) -> &'static str {
        "Weighted start-time and sequence deviation from the previous plan"
    }
}

/// Overdue work first, then plan fidelity (rolling horizon).
///
/// If any candidate is overdue (previous start before the planning
/// instant), only the overdue subset is considered. Otherwise, when a
/// finite window is set and some candidates are in scope, the pool narrows
/// to those. Within the pool: minimal [`PlanFidelity`] score, earliest
/// completion on ties.
#[derive(Debug, Clone, Copy)]
pub struct OverduePriority {
    /// Attention window; `cutoff = i64::MAX` disables the scope filter.
    pub window: RollingHorizonWindow,
    /// Scoring applied inside the candidate pool.
    pub fidelity: PlanFidelity,
}

impl Default for OverduePriority {
    fn default() -> Self {
        Self::at(0)
    }
}

impl OverduePriority {
    /// Creates a rule planning at the given instant with an open window.
    pub fn at(now: i64) -> Self {
        Self {
            window: RollingHorizonWindow::new(now, i64::MAX),
            fidelity: PlanFidelity::default(),
        }
    }

    /// Bounds the look-ahead window.
    pub fn with_cutoff(mut self, cutoff: i64) -> Self {
        self.window.cutoff = cutoff;
        self
    }

    /// Sets the fidelity scoring used inside the pool.
    pub fn with_fidelity(mut self, fidelity: PlanFidelity) -> Self {
        self.fidelity = fidelity;
        self
    }

    fn pick<'a>(&self, pool: &[&'a Candidate], previous: &PreviousPlan) -> &'a Candidate {
        let mut best = pool[0];
        let mut best_score = self.fidelity.score(best, previous);
        for &c in &pool[1..] {
            let score = self.fidelity.score(c, previous);
            let tied = (score - best_score).abs() <= EPS;
            if score + EPS < best_score || (tied && c.completion < best.completion) {
                best = c;
                best_score = score;
            }
        }
        best
    }
}

impl SelectionPolicy for OverduePriority {
    fn name(&self) -> &'static str {
        "OVERDUE"
    }

    fn choose(&self, conflict: &Conflict, previous: &PreviousPlan) -> OpRef {
        let all: Vec<&Candidate> = conflict.candidates.iter().collect();

        let overdue: Vec<&Candidate> = all
            .iter()
            .copied()
            .filter(|c| {
                previous
                    .start_of(c.op)
                    .map_or(false, |prev| self.window.is_overdue(prev))
            })
            .collect();

        let pool = if !overdue.is_empty() {
            overdue
        } else {
            // New operations carry no previous start and stay in scope.
            let in_scope: Vec<&Candidate> = all
                .iter()
                .copied()
                .filter(|c| {
                    previous
                        .start_of(c.op)
                        .map_or(true, |prev| self.window.in_scope(prev))
                })
                .collect();
            if in_scope.is_empty() { all } else { in_scope }
        };

        self.pick(&pool, previous).op
    }

    fn description(&self) -> &'static str {
        "Overdue operations first, then plan fidelity"
    }
}

/// Insert new work only where it is free; otherwise preserve legacy order.
///
/// Splits the conflict set into operations with a recorded previous start
/// ("old") and without ("new"). The best old candidate is the one planned
/// earliest before; the best new candidate is the shortest. The new one is
/// chosen only when it finishes before the old one was planned to begin
/// (a free buffer), so known work is never pushed past its own plan.
#[derive(Debug, Clone, Copy)]
pub struct BufferInsertion;

impl SelectionPolicy for BufferInsertion {
    fn name(&self) -> &'static str {
        "BUFFER_INSERT"
    }

    fn choose(&self, conflict: &Conflict, previous: &PreviousPlan) -> OpRef {
        let mut best_old: Option<(&Candidate, i64)> = None;
        let mut best_new: Option<&Candidate> = None;

        for c in &conflict.candidates {
            match previous.start_of(c.op) {
                Some(prev) => {
                    let better = best_old
                        .map_or(true, |(b, bp)| (prev, c.job()) < (bp, b.job()));
                    if better {
                        best_old = Some((c, prev));
                    }
                }
                None => {
                    let better = best_new
                        .map_or(true, |b| (c.duration, c.job()) < (b.duration, b.job()));
                    if better {
                        best_new = Some(c);
                    }
                }
            }
        }

        match (best_old, best_new) {
            (Some((old, prev_start)), Some(new)) => {
                if prev_start - new.completion >= 0 {
                    new.op
                } else {
                    old.op
                }
            }
            (Some((old, _)), None) => old.op,
            (None, Some(new)) => new.op,
            (None, None) => conflict.candidates[0].op,
        }
    }

    fn description(&self) -> &'static str {
        "Insert new work into free buffers, preserve legacy order otherwise"
    }
}

/// Squared start-time deviation from the previous plan.
///
/// `score = (candidateStart − previousStart)²`, or +∞ without history
/// (absolute last resort). Ties resolve by earliest completion, then by
/// job id. Punishes large displacements much harder than small ones.
#[derive(Debug, Clone, Copy)]
pub struct QuadraticDeviation;

impl QuadraticDeviation {
    fn score(candidate: &Candidate, previous: &PreviousPlan) -> f64 {
        previous
            .start_of(candidate.op)
            .map(|prev| {
                let dev = (candidate.start - prev) as f64;
                dev * dev
            })
            .unwrap_or(f64::INFINITY)
    }
}

impl SelectionPolicy for QuadraticDeviation {
    fn name(&self) -> &'static str {
        "QUADRATIC"
    }

    fn choose(&self, conflict: &Conflict, previous: &PreviousPlan) -> OpRef {
        let mut best = &conflict.candidates[0];
        let mut best_score = Self::score(best, previous);
        for c in &conflict.candidates[1..] {
            let score = Self::score(c, previous);
            // Two +∞ scores compare equal; epsilon covers the finite case.
            let tied = score == best_score || (score - best_score).abs() <= EPS;
            if score + EPS < best_score
                || (tied && (c.completion, c.job()) < (best.completion, best.job()))
            {
                best = c;
                best_score = score;
            }
        }
        best.op
    }

    fn description(&self) -> &'static str {
        "Squared start-time deviation from the previous plan"
    }
}
