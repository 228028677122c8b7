//! Hazard scenarios for the concurrency simulator.
//!
//! Each scenario manufactures one classic pathology of shared mutable state
//! under mutual exclusion, under timing that makes the outcome reproducible:
//!
//! - [`deadlock`]: two tasks lock the same pair of values in opposite order
//! - [`livelock`]: walkers step in lockstep on a shared [`Cadence`] and keep
//!   colliding on the same direction
//! - [`starvation`]: a greedy and a polite worker contend on one lock for a
//!   fixed wall-clock window
//!
//! Scenarios are self-contained: shared state is created on the scenario's
//! stack, workers run as scoped threads that borrow it, and the scope is the
//! completion barrier. None of the modelled hazards is an error. A deadlock
//! shows up as a call that never returns, a livelock as walkers that give up,
//! and starvation as a lopsided [`StarvationOutcome`].
//!
//! [`Cadence`]: hazard_core::Cadence

pub mod deadlock;
mod error;
pub mod livelock;
pub mod starvation;

pub use deadlock::{DeadlockConfig, DeadlockOutcome, LockOrder};
pub use error::ScenarioError;
pub use livelock::{LivelockConfig, LivelockOutcome, WalkOutcome, WalkerReport};
pub use starvation::{StarvationConfig, StarvationOutcome, WaitSummary, WorkerTally};

/// Run the deadlock scenario with its default constants and print the result.
///
/// With the default opposite lock order this never returns.
pub fn run_deadlock() -> Result<(), ScenarioError> {
    deadlock::run(&DeadlockConfig::default())?.print_summary();
    Ok(())
}

/// Run the livelock scenario with its default constants and print the result.
pub fn run_livelock() -> Result<(), ScenarioError> {
    livelock::run(&LivelockConfig::default())?.print_summary();
    Ok(())
}

/// Run the starvation scenario with its default constants and print the result.
pub fn run_starvation() -> Result<(), ScenarioError> {
    starvation::run(&StarvationConfig::default())?.print_summary();
    Ok(())
}
