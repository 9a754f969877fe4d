//! Stochastic duration perturbation and rolling-round simulation.
//!
//! Process times rarely hold: the [`DurationSimulator`] draws a
//! multiplicative log-normal factor per operation before a planning round,
//! optionally under the delay-only guarantee (actual ≥ planned: work can
//! run late, never early). [`RollingSimulation`] chains rounds: each
//! round's schedule becomes the next round's previous plan, and the
//! per-round [`StabilityMetrics`] show how nervous the policy is under
//! repeated replanning.
//!
//! The random source is always injected, so seeded runs reproduce exactly.
//!
//! # Reference
//! Law (2015), "Simulation Modeling and Analysis", Ch. 6 (log-normal
//! process times)

use rand::Rng;
use rand_distr::{Distribution, LogNormal};
use tracing::{debug, warn};

use crate::models::{PreviousPlan, RoutingModel, Schedule};
use crate::scheduler::{GifflerThompson, ScheduleError, StabilityMetrics};
use crate::selection::{rules, SelectionPolicy};

/// How simulated durations relate to planned ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SimulationMode {
    /// Actual ≥ planned: operations may only run late.
    #[default]
    DelayOnly,
    /// Actual may undercut the plan, but never drops below 1.
    Unconstrained,
}

/// Log-normal duration perturbation.
///
/// Draws a factor from `LogNormal(mu = -sigma^2/2, sigma)`, whose mean is
/// near 1 for small sigma, and rounds `planned * factor`. With sigma = 0
/// the planned duration passes through untouched; negative or non-finite
/// spreads normalize to 0.
#[derive(Debug, Clone, Copy)]
pub struct DurationSimulator {
    sigma: f64,
    mode: SimulationMode,
    factor: Option<LogNormal<f64>>,
}

impl DurationSimulator {
    /// Creates a simulator; invalid spreads normalize to σ = 0.
    pub fn new(sigma: f64, mode: SimulationMode) -> Self {
        let sigma = if sigma.is_finite() && sigma > 0.0 {
            sigma
        } else {
            if sigma != 0.0 {
                warn!(sigma, "invalid spread, using 0 (deterministic)");
            }
            0.0
        };

        let mu = -(sigma * sigma) / 2.0;
        let factor = if sigma > 0.0 {
            LogNormal::new(mu, sigma).ok()
        } else {
            None
        };

        Self {
            sigma,
            mode,
            factor,
        }
    }

    /// A σ = 0 simulator: every duration passes through unchanged.
    pub fn deterministic() -> Self {
        Self::new(0.0, SimulationMode::DelayOnly)
    }

    /// The (normalized) spread parameter.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Whether durations pass through unperturbed.
    pub fn is_deterministic(&self) -> bool {
        self.factor.is_none()
    }

    /// Simulates one duration.
    pub fn sample<R: Rng + ?Sized>(&self, planned: i64, rng: &mut R) -> i64 {
        let Some(factor) = &self.factor else {
            return planned;
        };
        let drawn = (planned as f64 * factor.sample(rng)).round() as i64;
        match self.mode {
            SimulationMode::DelayOnly => planned.max(drawn),
            SimulationMode::Unconstrained => drawn.max(1),
        }
    }

    /// Perturbs every duration of a routing for one planning round.
    pub fn perturb<R: Rng + ?Sized>(&self, routing: &RoutingModel, rng: &mut R) -> RoutingModel {
        if self.is_deterministic() {
            return routing.clone();
        }
        routing.map_durations(|op, operation| {
            let simulated = self.sample(operation.duration, rng);
            if simulated != operation.duration {
                debug!(
                    job = op.job,
                    index = op.index,
                    planned = operation.duration,
                    simulated,
                    "perturbed duration"
                );
            }
            simulated
        })
    }
}

impl Default for DurationSimulator {
    fn default() -> Self {
        Self::deterministic()
    }
}

/// Outcome of one rolling planning round.
#[derive(Debug, Clone)]
pub struct RoundOutcome {
    /// Round number, 1-based.
    pub round: usize,
    /// The timetable this round produced.
    pub schedule: Schedule,
    /// Stability against the previous round's plan (zeros in round 1).
    pub metrics: StabilityMetrics,
    /// Makespan of this round's timetable.
    pub makespan: i64,
}

/// Sequential multi-round planning simulation.
///
/// Each round perturbs the nominal routing, schedules it against the
/// previous round's plan, measures stability, and hands its schedule
/// forward. Rounds never overlap: plain single-writer handoff.
///
/// # Example
///
/// ```
/// use rand::SeedableRng;
/// use rand::rngs::SmallRng;
/// use replan::models::{RoutingModel, RoutingRecord};
/// use replan::sim::RollingSimulation;
///
/// let routing = RoutingModel::from_records([
///     RoutingRecord { job: 1, index: 0, machine: 1, duration: 2 },
///     RoutingRecord { job: 2, index: 0, machine: 1, duration: 3 },
/// ]).unwrap();
///
/// let mut rng = SmallRng::seed_from_u64(7);
/// let outcomes = RollingSimulation::new(3).run(&routing, &mut rng).unwrap();
/// assert_eq!(outcomes.len(), 3);
/// // Deterministic replanning reaches a fixed point immediately.
/// assert!(outcomes[1].metrics.is_stable());
/// ```
#[derive(Debug, Clone)]
pub struct RollingSimulation {
    rounds: usize,
    simulator: DurationSimulator,
    engine: GifflerThompson,
}

impl RollingSimulation {
    /// Creates a simulation: σ = 0, buffer-insertion rule.
    pub fn new(rounds: usize) -> Self {
        Self {
            rounds,
            simulator: DurationSimulator::deterministic(),
            engine: GifflerThompson::new().with_policy(rules::BufferInsertion),
        }
    }

    /// Sets the duration perturbation.
    pub fn with_simulator(mut self, simulator: DurationSimulator) -> Self {
        self.simulator = simulator;
        self
    }

    /// Sets the selection rule used in every round.
    pub fn with_policy<P: SelectionPolicy + 'static>(mut self, policy: P) -> Self {
        self.engine = GifflerThompson::new().with_policy(policy);
        self
    }

    /// Sets a pre-built scheduler.
    pub fn with_engine(mut self, engine: GifflerThompson) -> Self {
        self.engine = engine;
        self
    }

    /// Runs all rounds, returning one outcome per round.
    pub fn run<R: Rng + ?Sized>(
        &self,
        routing: &RoutingModel,
        rng: &mut R,
    ) -> Result<Vec<RoundOutcome>, ScheduleError> {
        let mut previous = PreviousPlan::empty();
        let mut outcomes = Vec::with_capacity(self.rounds);

        for round in 1..=self.rounds {
            let perturbed = self.simulator.perturb(routing, rng);
            let schedule = self.engine.schedule_against(&perturbed, &previous)?;
            let metrics = StabilityMetrics::calculate(&schedule, &previous);
            debug!(
                round,
                makespan = schedule.makespan(),
                start_deviation = metrics.start_deviation,
                sequence_deviation = metrics.sequence_deviation,
                "round complete"
            );

            previous = PreviousPlan::from_schedule(&schedule);
            outcomes.push(RoundOutcome {
                round,
                makespan: schedule.makespan(),
                metrics,
                schedule,
            });
        }

        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoutingRecord;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn rec(job: u32, index: usize, machine: u32, duration: i64) -> RoutingRecord {
        RoutingRecord {
            job,
            index,
            machine,
            duration,
        }
    }

    fn reference_routing() -> RoutingModel {
        RoutingModel::from_records([
            rec(1, 0, 1, 2),
            rec(1, 1, 2, 5),
            rec(1, 2, 3, 4),
            rec(2, 0, 2, 2),
            rec(2, 1, 3, 3),
            rec(2, 2, 1, 5),
            rec(3, 0, 3, 4),
            rec(3, 1, 1, 2),
            rec(3, 2, 2, 3),
        ])
        .unwrap()
    }

    #[test]
    fn test_zero_sigma_is_identity() {
        let sim = DurationSimulator::deterministic();
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(sim.is_deterministic());
        assert_eq!(sim.sample(42, &mut rng), 42);
    }

    #[test]
    fn test_invalid_sigma_normalizes_to_zero() {
        for bad in [-0.5, f64::NAN, f64::INFINITY] {
            let sim = DurationSimulator::new(bad, SimulationMode::DelayOnly);
            assert!(sim.is_deterministic(), "sigma {bad} should normalize");
            assert_eq!(sim.sigma(), 0.0);
        }
    }

    #[test]
    fn test_delay_only_never_shortens() {
        let sim = DurationSimulator::new(0.4, SimulationMode::DelayOnly);
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..500 {
            assert!(sim.sample(50, &mut rng) >= 50);
        }
    }

    #[test]
    fn test_unconstrained_can_shorten_but_stays_positive() {
        let sim = DurationSimulator::new(0.5, SimulationMode::Unconstrained);
        let mut rng = SmallRng::seed_from_u64(42);
        let samples: Vec<i64> = (0..500).map(|_| sim.sample(50, &mut rng)).collect();
        assert!(samples.iter().all(|&d| d >= 1));
        assert!(samples.iter().any(|&d| d < 50));
        // Tiny planned durations with wild factors still stay at least 1.
        let mut rng = SmallRng::seed_from_u64(7);
        assert!((0..500).all(|_| sim.sample(1, &mut rng) >= 1));
    }

    #[test]
    fn test_seeded_sampling_reproduces() {
        let sim = DurationSimulator::new(0.3, SimulationMode::DelayOnly);
        let a: Vec<i64> = {
            let mut rng = SmallRng::seed_from_u64(9);
            (0..32).map(|_| sim.sample(60, &mut rng)).collect()
        };
        let b: Vec<i64> = {
            let mut rng = SmallRng::seed_from_u64(9);
            (0..32).map(|_| sim.sample(60, &mut rng)).collect()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn test_perturb_preserves_structure() {
        let routing = reference_routing();
        let sim = DurationSimulator::new(0.3, SimulationMode::DelayOnly);
        let mut rng = SmallRng::seed_from_u64(3);
        let perturbed = sim.perturb(&routing, &mut rng);

        assert_eq!(perturbed.operation_count(), routing.operation_count());
        for (job, orig) in perturbed.jobs().iter().zip(routing.jobs()) {
            assert_eq!(job.id, orig.id);
            for (op, orig_op) in job.ops.iter().zip(&orig.ops) {
                assert_eq!(op.machine, orig_op.machine);
                assert!(op.duration >= orig_op.duration);
            }
        }
    }

    #[test]
    fn test_rolling_fixed_point_without_noise() {
        let routing = reference_routing();
        let mut rng = SmallRng::seed_from_u64(0);
        let outcomes = RollingSimulation::new(5).run(&routing, &mut rng).unwrap();

        assert_eq!(outcomes.len(), 5);
        // Round 1 has no reference plan.
        assert!(outcomes[0].metrics.is_stable());
        // Every later round reproduces round 1 exactly.
        for outcome in &outcomes[1..] {
            assert!(outcome.metrics.is_stable(), "round {}", outcome.round);
            assert_eq!(outcome.metrics.makespan_delta, 0);
            assert_eq!(
                outcome.schedule.sorted_entries(),
                outcomes[0].schedule.sorted_entries()
            );
        }
    }

    #[test]
    fn test_rolling_is_reproducible_under_seed() {
        let routing = reference_routing();
        let sim = DurationSimulator::new(0.2, SimulationMode::DelayOnly);

        let run = |seed: u64| {
            let mut rng = SmallRng::seed_from_u64(seed);
            RollingSimulation::new(4)
                .with_simulator(sim)
                .run(&routing, &mut rng)
                .unwrap()
        };

        let a = run(11);
        let b = run(11);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.schedule, y.schedule);
            assert_eq!(x.metrics, y.metrics);
        }
    }

    #[test]
    fn test_rolling_rounds_stay_feasible_under_noise() {
        let routing = reference_routing();
        let sim = DurationSimulator::new(0.3, SimulationMode::DelayOnly);
        let mut rng = SmallRng::seed_from_u64(5);
        let outcomes = RollingSimulation::new(6)
            .with_simulator(sim)
            .run(&routing, &mut rng)
            .unwrap();

        for outcome in &outcomes {
            assert_eq!(outcome.schedule.len(), routing.operation_count());
            // Delay-only durations never drop below nominal, so no round
            // can beat the busiest machine's nominal workload (11).
            assert!(outcome.makespan >= 11);
            assert!(outcome.metrics.start_deviation >= 0);
        }
    }
}
