//! Concurrency Hazard Simulator CLI
//!
//! Reproduce a deadlock, livelock or starvation scenario and report what
//! happened.
//!
//! # Example
//!
//! ```bash
//! # Watch two tasks deadlock, giving up after 5 seconds
//! hazard-sim deadlock
//!
//! # Two walkers in lockstep on a 1ms cadence
//! hazard-sim livelock
//!
//! # Twenty 1-second starvation trials, as JSON
//! hazard-sim starvation --trials 20 --json
//! ```

use clap::Parser;
use hazard_simulation::LockOrder;
use hazard_simulator::{RunReport, ScenarioKind, Simulator, SimulatorConfig};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Concurrency Hazard Simulator
///
/// Manufactures deadlock, livelock and starvation under controlled timing.
/// A deadlock that is still blocked at the deadline is the expected result
/// and exits successfully.
#[derive(Parser, Debug)]
#[command(name = "hazard-sim")]
#[command(version, about, long_about = None)]
struct Args {
    /// Scenario to run
    #[arg(value_enum)]
    scenario: ScenarioKind,

    /// Deadlock: seconds to wait before declaring the scenario hung
    #[arg(short = 't', long, default_value = "5")]
    timeout_secs: u64,

    /// Deadlock: milliseconds each task holds its first lock
    #[arg(long, default_value = "2000")]
    hold_ms: u64,

    /// Deadlock: lock in the same order in both tasks (control run)
    #[arg(long)]
    consistent_order: bool,

    /// Livelock: cadence tick interval in milliseconds
    #[arg(long, default_value = "1")]
    tick_ms: u64,

    /// Livelock: rounds before a walker gives up
    #[arg(long, default_value = "5")]
    rounds: u32,

    /// Starvation: run window in milliseconds
    #[arg(short = 'w', long, default_value = "1000")]
    window_ms: u64,

    /// Starvation: number of trials to aggregate
    #[arg(short = 'n', long, default_value = "1")]
    trials: usize,

    /// Starvation: loop ratio a trial must exceed to count as starved
    #[arg(long, default_value = "1.5")]
    threshold: f64,

    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,
}

impl Args {
    fn to_config(&self) -> SimulatorConfig {
        let defaults = SimulatorConfig::default();
        let lock_order = if self.consistent_order {
            LockOrder::Consistent
        } else {
            LockOrder::Opposite
        };

        SimulatorConfig::new()
            .with_deadlock_timeout(Duration::from_secs(self.timeout_secs))
            .with_starvation_trials(self.trials)
            .with_ratio_threshold(self.threshold)
            .with_deadlock(
                defaults
                    .deadlock
                    .with_hold_delay(Duration::from_millis(self.hold_ms))
                    .with_lock_order(lock_order)
                    .with_echo_sums(!self.json),
            )
            .with_livelock(
                defaults
                    .livelock
                    .with_tick_interval(Duration::from_millis(self.tick_ms))
                    .with_max_rounds(self.rounds)
                    .with_echo_narratives(!self.json),
            )
            .with_starvation(
                defaults
                    .starvation
                    .with_window(Duration::from_millis(self.window_ms)),
            )
    }
}

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("warn,hazard_simulator=info,hazard_simulation=info")
        }))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    info!(
        scenario = %args.scenario,
        timeout_secs = args.timeout_secs,
        trials = args.trials,
        "Starting hazard simulator"
    );

    let simulator = match Simulator::new(args.to_config()) {
        Ok(simulator) => simulator,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let report = match simulator.run(args.scenario) {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "Simulation failed");
            return ExitCode::FAILURE;
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                error!(error = %e, "Failed to serialize report");
                return ExitCode::FAILURE;
            }
        }
    } else {
        report.print_summary();
    }

    if let RunReport::Deadlock(deadlock) = &report {
        if deadlock.is_hung() {
            // The scenario tasks are still blocked; returning ends the process.
            info!("Exiting with deadlocked tasks still blocked");
        }
    }

    ExitCode::SUCCESS
}
