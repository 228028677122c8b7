//! Main simulator runner.
//!
//! Selects a scenario, applies the harness policy for it (external deadline,
//! repeated trials) and returns a report.

use crate::config::SimulatorConfig;
use crate::metrics::{StarvationTrialsReport, TrialCollector};
use hazard_simulation::{
    deadlock, livelock, starvation, DeadlockOutcome, LivelockOutcome, LockOrder, ScenarioError,
};
use serde::Serialize;
use std::fmt;
use std::io;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// The scenario to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    Deadlock,
    Livelock,
    Starvation,
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScenarioKind::Deadlock => "deadlock",
            ScenarioKind::Livelock => "livelock",
            ScenarioKind::Starvation => "starvation",
        };
        f.write_str(name)
    }
}

/// What the external deadline observed about the deadlock scenario.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeadlockVerdict {
    /// Still blocked at the deadline. The expected reproduction.
    Hung { waited: Duration },
    /// Finished before the deadline.
    Completed { outcome: DeadlockOutcome },
}

/// Report for one observed deadlock run.
#[derive(Debug, Clone, Serialize)]
pub struct DeadlockReport {
    pub lock_order: LockOrder,
    pub hold_delay: Duration,
    pub timeout: Duration,
    pub verdict: DeadlockVerdict,
}

impl DeadlockReport {
    /// True if the scenario was still blocked at the deadline.
    pub fn is_hung(&self) -> bool {
        matches!(self.verdict, DeadlockVerdict::Hung { .. })
    }

    /// Print a summary of the report.
    pub fn print_summary(&self) {
        match &self.verdict {
            DeadlockVerdict::Hung { waited } => {
                println!(
                    "Deadlock: both tasks still blocked after {:?} ({:?} lock order, {:?} hold)",
                    waited, self.lock_order, self.hold_delay
                );
            }
            DeadlockVerdict::Completed { outcome } => outcome.print_summary(),
        }
    }
}

/// Report for any scenario.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "scenario", rename_all = "snake_case")]
pub enum RunReport {
    Deadlock(DeadlockReport),
    Livelock(LivelockOutcome),
    Starvation(StarvationTrialsReport),
}

impl RunReport {
    pub fn kind(&self) -> ScenarioKind {
        match self {
            RunReport::Deadlock(_) => ScenarioKind::Deadlock,
            RunReport::Livelock(_) => ScenarioKind::Livelock,
            RunReport::Starvation(_) => ScenarioKind::Starvation,
        }
    }

    /// Print a summary of the report.
    pub fn print_summary(&self) {
        match self {
            RunReport::Deadlock(report) => report.print_summary(),
            RunReport::Livelock(outcome) => outcome.print_summary(),
            RunReport::Starvation(report) => report.print_summary(),
        }
    }
}

/// Runs hazard scenarios under the harness policy.
pub struct Simulator {
    config: SimulatorConfig,
}

impl Simulator {
    /// Create a new simulator with the given configuration.
    pub fn new(config: SimulatorConfig) -> Result<Self, SimulatorError> {
        config.validate()?;

        debug!(
            deadlock_timeout_ms = config.deadlock_timeout.as_millis() as u64,
            starvation_trials = config.starvation_trials,
            ratio_threshold = config.ratio_threshold,
            "Simulator created"
        );

        Ok(Self { config })
    }

    /// The simulator's configuration.
    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Run one scenario and return its report.
    pub fn run(&self, kind: ScenarioKind) -> Result<RunReport, SimulatorError> {
        info!(scenario = %kind, "Running scenario");
        let report = match kind {
            ScenarioKind::Deadlock => RunReport::Deadlock(self.observe_deadlock()?),
            ScenarioKind::Livelock => RunReport::Livelock(self.run_livelock()?),
            ScenarioKind::Starvation => RunReport::Starvation(self.run_starvation_trials()?),
        };
        Ok(report)
    }

    /// Run the deadlock scenario against the external deadline.
    ///
    /// The scenario runs on a detached observer thread. If the deadline passes
    /// first, the observer and both scenario tasks are left blocked; they end
    /// with the process.
    pub fn observe_deadlock(&self) -> Result<DeadlockReport, SimulatorError> {
        let scenario = self.config.deadlock.clone();
        let timeout = self.config.deadlock_timeout;
        let (tx, rx) = mpsc::channel();

        thread::Builder::new()
            .name("deadlock-observer".to_string())
            .spawn(move || {
                // The receiver is gone if the deadline already passed.
                let _ = tx.send(deadlock::run(&scenario));
            })
            .map_err(SimulatorError::Spawn)?;

        let start = Instant::now();
        let verdict = match rx.recv_timeout(timeout) {
            Ok(result) => {
                let outcome = result?;
                info!(
                    elapsed_ms = outcome.elapsed.as_millis() as u64,
                    "Deadlock scenario finished before the deadline"
                );
                DeadlockVerdict::Completed { outcome }
            }
            Err(RecvTimeoutError::Timeout) => {
                let waited = start.elapsed();
                info!(
                    waited_ms = waited.as_millis() as u64,
                    "Deadlock reproduced: scenario still blocked at the deadline"
                );
                DeadlockVerdict::Hung { waited }
            }
            Err(RecvTimeoutError::Disconnected) => {
                warn!("Deadlock observer exited without a result");
                return Err(SimulatorError::ObserverLost);
            }
        };

        Ok(DeadlockReport {
            lock_order: self.config.deadlock.lock_order,
            hold_delay: self.config.deadlock.hold_delay,
            timeout,
            verdict,
        })
    }

    /// Run the livelock scenario once.
    pub fn run_livelock(&self) -> Result<LivelockOutcome, SimulatorError> {
        Ok(livelock::run(&self.config.livelock)?)
    }

    /// Run the starvation scenario `starvation_trials` times and aggregate.
    pub fn run_starvation_trials(&self) -> Result<StarvationTrialsReport, SimulatorError> {
        let mut collector = TrialCollector::new(self.config.ratio_threshold)
            .map_err(|e| SimulatorError::Metrics(e.to_string()))?;

        for trial in 1..=self.config.starvation_trials {
            let outcome = starvation::run(&self.config.starvation)?;
            debug!(
                trial,
                greedy_loops = outcome.greedy.loops,
                polite_loops = outcome.polite.loops,
                "Starvation trial finished"
            );
            collector.record(outcome);
        }

        let report = collector.finalize();
        info!(
            trials = report.trials,
            above_threshold = report.above_threshold,
            median_ratio = format!("{:.2}", report.median_ratio),
            "Starvation trials complete"
        );
        Ok(report)
    }
}

/// Errors that can occur while running the simulator.
///
/// The hazards themselves are reported through [`RunReport`], never here.
#[derive(Debug, thiserror::Error)]
pub enum SimulatorError {
    #[error("Scenario error: {0}")]
    Scenario(#[from] ScenarioError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to spawn deadlock observer: {0}")]
    Spawn(#[source] io::Error),

    #[error("Deadlock observer exited without reporting")]
    ObserverLost,

    #[error("Metrics error: {0}")]
    Metrics(String),
}
