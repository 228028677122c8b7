//! Starvation scenario: greedy versus polite lock contention.
//!
//! Two workers share one exclusive lock for a fixed wall-clock window:
//!
//! - the **greedy** worker takes the lock once per loop and holds it for
//!   `greedy_hold`;
//! - the **polite** worker takes it `polite_acquisitions` times per loop, each
//!   for the shorter `polite_hold`, releasing in between.
//!
//! Both do roughly the same amount of work inside the lock per loop, but the
//! polite worker gives the lock back more often and has to win it back every
//! time. The lock makes no fairness promise, so the greedy worker ends up
//! completing far more loops. Both make progress; the symptom is the ratio.

use crate::error::ScenarioError;
use hdrhistogram::Histogram;
use parking_lot::Mutex;
use serde::Serialize;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Configuration for the starvation scenario.
#[derive(Debug, Clone)]
pub struct StarvationConfig {
    /// Wall-clock window both workers run for.
    pub window: Duration,
    /// How long the greedy worker holds the lock per acquisition.
    pub greedy_hold: Duration,
    /// How long the polite worker holds the lock per acquisition.
    pub polite_hold: Duration,
    /// Lock acquisitions per polite loop.
    pub polite_acquisitions: u32,
}

impl Default for StarvationConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(1),
            greedy_hold: Duration::from_nanos(3),
            polite_hold: Duration::from_nanos(1),
            polite_acquisitions: 3,
        }
    }
}

impl StarvationConfig {
    /// Set the run window.
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Set the greedy worker's hold time.
    pub fn with_greedy_hold(mut self, hold: Duration) -> Self {
        self.greedy_hold = hold;
        self
    }

    /// Set the polite worker's hold time.
    pub fn with_polite_hold(mut self, hold: Duration) -> Self {
        self.polite_hold = hold;
        self
    }

    /// Set the polite worker's acquisitions per loop.
    pub fn with_polite_acquisitions(mut self, acquisitions: u32) -> Self {
        self.polite_acquisitions = acquisitions;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.window.is_zero() {
            return Err(ScenarioError::InvalidConfig(
                "window must be non-zero".to_string(),
            ));
        }
        if self.polite_acquisitions == 0 {
            return Err(ScenarioError::InvalidConfig(
                "polite_acquisitions must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Lock wait times for one worker (nanoseconds).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WaitSummary {
    pub p50_ns: u64,
    pub p99_ns: u64,
    pub max_ns: u64,
    pub mean_ns: f64,
}

impl WaitSummary {
    fn from_histogram(histogram: &Histogram<u64>) -> Self {
        if histogram.is_empty() {
            return Self::default();
        }
        Self {
            p50_ns: histogram.value_at_quantile(0.50),
            p99_ns: histogram.value_at_quantile(0.99),
            max_ns: histogram.max(),
            mean_ns: histogram.mean(),
        }
    }
}

/// What one worker managed to do within the window.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerTally {
    /// Completed outer loops.
    pub loops: u64,
    /// Individual lock acquisitions.
    pub acquisitions: u64,
    /// Time from start until the worker noticed the deadline.
    pub elapsed: Duration,
    /// How long the worker waited to get the lock.
    pub wait: WaitSummary,
}

/// Result of a starvation scenario run.
#[derive(Debug, Clone, Serialize)]
pub struct StarvationOutcome {
    pub window: Duration,
    pub greedy: WorkerTally,
    pub polite: WorkerTally,
}

impl StarvationOutcome {
    /// Greedy loops per polite loop. Infinite if the polite worker never
    /// finished a loop.
    pub fn ratio(&self) -> f64 {
        if self.polite.loops == 0 {
            return f64::INFINITY;
        }
        self.greedy.loops as f64 / self.polite.loops as f64
    }

    /// Print a summary of the run.
    pub fn print_summary(&self) {
        println!(
            "Greedy worker was able to execute {} work loops",
            self.greedy.loops
        );
        println!(
            "Polite worker was able to execute {} work loops",
            self.polite.loops
        );
        println!("  Window:        {:?}", self.window);
        println!("  Loop ratio:    {:.2}", self.ratio());
        println!(
            "  Wait p99 (ns): greedy={} polite={}",
            self.greedy.wait.p99_ns, self.polite.wait.p99_ns
        );
    }
}

/// Run the starvation scenario.
///
/// Returns after both workers have seen the window elapse.
pub fn run(config: &StarvationConfig) -> Result<StarvationOutcome, ScenarioError> {
    config.validate()?;

    let shared = Mutex::new(());

    info!(
        window_ms = config.window.as_millis() as u64,
        greedy_hold_ns = config.greedy_hold.as_nanos() as u64,
        polite_hold_ns = config.polite_hold.as_nanos() as u64,
        polite_acquisitions = config.polite_acquisitions,
        "Starting starvation scenario"
    );

    let (greedy, polite) = thread::scope(|s| -> Result<_, ScenarioError> {
        let shared = &shared;

        let greedy = thread::Builder::new()
            .name("greedy-worker".to_string())
            .spawn_scoped(s, move || {
                contend(shared, config.window, config.greedy_hold, 1)
            })
            .map_err(|e| ScenarioError::spawn("greedy-worker", e))?;

        let polite = thread::Builder::new()
            .name("polite-worker".to_string())
            .spawn_scoped(s, move || {
                contend(
                    shared,
                    config.window,
                    config.polite_hold,
                    config.polite_acquisitions,
                )
            })
            .map_err(|e| ScenarioError::spawn("polite-worker", e))?;

        let greedy = greedy
            .join()
            .map_err(|_| ScenarioError::WorkerPanicked("greedy-worker".to_string()))??;
        let polite = polite
            .join()
            .map_err(|_| ScenarioError::WorkerPanicked("polite-worker".to_string()))??;
        Ok((greedy, polite))
    })?;

    let outcome = StarvationOutcome {
        window: config.window,
        greedy,
        polite,
    };

    info!(
        greedy_loops = outcome.greedy.loops,
        polite_loops = outcome.polite.loops,
        ratio = format!("{:.2}", outcome.ratio()),
        "Starvation scenario completed"
    );

    Ok(outcome)
}

/// Contend on `shared` until `window` has elapsed.
///
/// Each loop takes the lock `acquisitions` times, holding it for `hold` each
/// time, and counts as one completed loop. The deadline is checked only at the
/// loop head.
fn contend(
    shared: &Mutex<()>,
    window: Duration,
    hold: Duration,
    acquisitions: u32,
) -> Result<WorkerTally, ScenarioError> {
    // Auto-resizing, so long waits widen the range instead of being clamped.
    let mut waits =
        Histogram::<u64>::new(3).map_err(|e| ScenarioError::Metrics(e.to_string()))?;
    let mut loops = 0u64;

    let begin = Instant::now();
    while begin.elapsed() <= window {
        for _ in 0..acquisitions {
            let asked = Instant::now();
            let guard = shared.lock();
            let waited = asked.elapsed();
            thread::sleep(hold);
            drop(guard);

            waits
                .record(waited.as_nanos() as u64)
                .map_err(|e| ScenarioError::Metrics(e.to_string()))?;
        }
        loops += 1;
    }
    let elapsed = begin.elapsed();

    debug!(
        loops,
        acquisitions = waits.len(),
        elapsed_ms = elapsed.as_millis() as u64,
        "Worker reached deadline"
    );

    Ok(WorkerTally {
        loops,
        acquisitions: waits.len(),
        elapsed,
        wait: WaitSummary::from_histogram(&waits),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StarvationConfig::default();
        assert_eq!(config.window, Duration::from_secs(1));
        assert_eq!(config.greedy_hold, Duration::from_nanos(3));
        assert_eq!(config.polite_hold, Duration::from_nanos(1));
        assert_eq!(config.polite_acquisitions, 3);
    }

    #[test]
    fn test_validation() {
        assert!(StarvationConfig::default()
            .with_window(Duration::ZERO)
            .validate()
            .is_err());
        assert!(StarvationConfig::default()
            .with_polite_acquisitions(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_uncontended_worker_counts_acquisitions() {
        let shared = Mutex::new(());
        let tally = contend(&shared, Duration::from_millis(20), Duration::ZERO, 3).unwrap();

        assert!(tally.loops > 0);
        assert_eq!(tally.acquisitions, tally.loops * 3);
        assert!(tally.elapsed > Duration::from_millis(20));
    }

    #[test]
    fn test_wait_summary_captures_long_wait() {
        let shared = Mutex::new(());
        let held = shared.lock();

        let tally = thread::scope(|s| {
            let worker =
                s.spawn(|| contend(&shared, Duration::from_millis(5), Duration::ZERO, 1));
            thread::sleep(Duration::from_millis(30));
            drop(held);
            worker.join().unwrap()
        })
        .unwrap();

        // The first acquisition waited out the whole hold above.
        assert!(
            tally.wait.max_ns >= 10_000_000,
            "max wait {}ns",
            tally.wait.max_ns
        );
        assert!(tally.wait.mean_ns > 0.0);
    }

    #[test]
    fn test_ratio_with_idle_polite_worker() {
        let tally = |loops| WorkerTally {
            loops,
            acquisitions: loops,
            elapsed: Duration::from_secs(1),
            wait: WaitSummary::default(),
        };
        let outcome = StarvationOutcome {
            window: Duration::from_secs(1),
            greedy: tally(10),
            polite: tally(0),
        };
        assert!(outcome.ratio().is_infinite());

        let outcome = StarvationOutcome {
            polite: tally(4),
            ..outcome
        };
        assert_eq!(outcome.ratio(), 2.5);
    }
}
