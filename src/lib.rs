//! Job-shop active-schedule construction with plan stability.
//!
//! Builds operation-level timetables via the Giffler-Thompson algorithm,
//! generalized with pluggable conflict-set selection rules. Beyond the
//! classic shortest-processing-time construction, the rules cover
//! minimally invasive rescheduling: keeping a new timetable close to a
//! previously published plan in start times and machine order, measured by
//! explicit stability metrics and stress-tested under stochastic duration
//! noise across rolling planning rounds.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `RoutingModel`, `Schedule`,
//!   `PreviousPlan`, `RollingHorizonWindow`
//! - **`selection`**: The `SelectionPolicy` strategy trait and the built-in
//!   rules (SPT, plan fidelity, overdue priority, buffer insertion,
//!   quadratic deviation)
//! - **`scheduler`**: The `GifflerThompson` construction loop and
//!   `StabilityMetrics`
//! - **`sim`**: Log-normal duration perturbation and the rolling
//!   multi-round simulation
//! - **`io`**: Routing CSV input and previous-plan JSON persistence
//!
//! # Guarantees
//!
//! Construction is single-threaded and deterministic: identical routing,
//! previous plan, and rule reproduce an identical schedule. The only
//! randomness lives in the duration simulator, behind an injected, seedable
//! generator.
//!
//! # References
//!
//! - Giffler & Thompson (1960), "Algorithms for Solving Production-Scheduling Problems"
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Vieira, Herrmann & Lin (2003), "Rescheduling Manufacturing Systems: A Framework"

pub mod io;
pub mod models;
pub mod scheduler;
pub mod selection;
pub mod sim;
