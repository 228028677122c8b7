//! Hazard simulator harness.
//!
//! Selects a scenario from [`hazard_simulation`], runs it under the harness
//! policy and produces a [`RunReport`]:
//!
//! - **Deadlock**: runs the scenario on a detached observer thread and waits
//!   at most [`SimulatorConfig::deadlock_timeout`]. A run that is still
//!   blocked at the deadline is the expected reproduction, reported as
//!   [`DeadlockVerdict::Hung`].
//! - **Livelock**: runs once and returns the walkers' reports.
//! - **Starvation**: runs [`SimulatorConfig::starvation_trials`] times and
//!   aggregates the greedy/polite loop ratios.

mod config;
pub mod metrics;
mod runner;

pub use config::SimulatorConfig;
pub use metrics::{StarvationTrialsReport, TrialCollector};
pub use runner::{
    DeadlockReport, DeadlockVerdict, RunReport, ScenarioKind, Simulator, SimulatorError,
};
