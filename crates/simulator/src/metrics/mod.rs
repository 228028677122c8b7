//! Metrics collection and reporting for repeated starvation trials.
//!
//! A single starvation run is noisy. [`TrialCollector`] gathers many runs and
//! reports how often, and by how much, the greedy worker out-ran the polite
//! one.

use hazard_simulation::StarvationOutcome;
use hdrhistogram::Histogram;
use serde::Serialize;

/// Ratios are stored in the histogram as thousandths.
const RATIO_SCALE: f64 = 1000.0;

/// Upper bound for a recorded ratio (in thousandths), and the highest value the
/// ratio histogram tracks. A trial where the polite worker finished no loops
/// has an infinite ratio and is clamped to this.
const RATIO_CAP: u64 = 1_000_000_000;

/// Collects starvation outcomes across trials.
pub struct TrialCollector {
    /// Ratio a trial must exceed to count as starved.
    threshold: f64,

    /// Trials where greedy completed more loops than polite.
    greedy_ahead: u64,

    /// Trials whose ratio exceeded the threshold.
    above_threshold: u64,

    /// Greedy/polite ratio histogram (thousandths).
    ratios: Histogram<u64>,

    /// Every recorded outcome, in trial order.
    outcomes: Vec<StarvationOutcome>,
}

impl TrialCollector {
    /// Create a new collector.
    pub fn new(threshold: f64) -> Result<Self, hdrhistogram::errors::CreationError> {
        Ok(Self {
            threshold,
            greedy_ahead: 0,
            above_threshold: 0,
            ratios: Histogram::new_with_bounds(1, RATIO_CAP, 3)?,
            outcomes: Vec::new(),
        })
    }

    /// Record one trial.
    pub fn record(&mut self, outcome: StarvationOutcome) {
        let ratio = outcome.ratio();

        if outcome.greedy.loops > outcome.polite.loops {
            self.greedy_ahead += 1;
        }
        if ratio > self.threshold {
            self.above_threshold += 1;
        }

        // `as` saturates, so an infinite ratio lands on the cap.
        let scaled = ((ratio * RATIO_SCALE) as u64).min(RATIO_CAP);
        self.ratios.saturating_record(scaled);

        self.outcomes.push(outcome);
    }

    /// Number of trials recorded so far.
    pub fn trials(&self) -> usize {
        self.outcomes.len()
    }

    /// Finalize and generate a report.
    pub fn finalize(self) -> StarvationTrialsReport {
        let unscale = |v: u64| v as f64 / RATIO_SCALE;
        let (min_ratio, median_ratio, max_ratio) = if self.ratios.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            (
                unscale(self.ratios.min()),
                unscale(self.ratios.value_at_quantile(0.50)),
                unscale(self.ratios.max()),
            )
        };

        StarvationTrialsReport {
            trials: self.outcomes.len() as u64,
            threshold: self.threshold,
            greedy_ahead: self.greedy_ahead,
            above_threshold: self.above_threshold,
            min_ratio,
            median_ratio,
            max_ratio,
            total_greedy_loops: self.outcomes.iter().map(|o| o.greedy.loops).sum(),
            total_polite_loops: self.outcomes.iter().map(|o| o.polite.loops).sum(),
            outcomes: self.outcomes,
        }
    }
}

/// Aggregated result of repeated starvation trials.
#[derive(Debug, Clone, Serialize)]
pub struct StarvationTrialsReport {
    /// Number of trials run.
    pub trials: u64,
    /// Ratio threshold used for `above_threshold`.
    pub threshold: f64,
    /// Trials where greedy completed more loops than polite.
    pub greedy_ahead: u64,
    /// Trials whose loop ratio exceeded the threshold.
    pub above_threshold: u64,
    /// Smallest greedy/polite ratio observed.
    pub min_ratio: f64,
    /// Median greedy/polite ratio.
    pub median_ratio: f64,
    /// Largest greedy/polite ratio observed (capped).
    pub max_ratio: f64,
    /// Greedy loops summed over all trials.
    pub total_greedy_loops: u64,
    /// Polite loops summed over all trials.
    pub total_polite_loops: u64,
    /// Per-trial outcomes.
    pub outcomes: Vec<StarvationOutcome>,
}

impl StarvationTrialsReport {
    /// Fraction of trials whose ratio exceeded the threshold.
    pub fn fraction_above_threshold(&self) -> f64 {
        if self.trials == 0 {
            return 0.0;
        }
        self.above_threshold as f64 / self.trials as f64
    }

    /// Print a summary of the report.
    pub fn print_summary(&self) {
        if let [only] = self.outcomes.as_slice() {
            only.print_summary();
            return;
        }

        println!("\n═══════════════════════════════════════════");
        println!("           STARVATION TRIALS                ");
        println!("═══════════════════════════════════════════");
        println!();
        println!("Trials:           {}", self.trials);
        println!("Greedy ahead:     {}", self.greedy_ahead);
        println!(
            "Ratio > {:.2}:     {} ({:.1}%)",
            self.threshold,
            self.above_threshold,
            self.fraction_above_threshold() * 100.0
        );
        println!();
        println!("Loop ratio (greedy / polite):");
        println!("  Min:     {:.2}", self.min_ratio);
        println!("  Median:  {:.2}", self.median_ratio);
        println!("  Max:     {:.2}", self.max_ratio);
        println!();
        println!("Total loops:");
        println!("  Greedy:  {}", self.total_greedy_loops);
        println!("  Polite:  {}", self.total_polite_loops);
        println!("═══════════════════════════════════════════\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hazard_simulation::{WaitSummary, WorkerTally};
    use std::time::Duration;

    fn outcome(greedy: u64, polite: u64) -> StarvationOutcome {
        let tally = |loops| WorkerTally {
            loops,
            acquisitions: loops,
            elapsed: Duration::from_secs(1),
            wait: WaitSummary::default(),
        };
        StarvationOutcome {
            window: Duration::from_secs(1),
            greedy: tally(greedy),
            polite: tally(polite),
        }
    }

    #[test]
    fn test_trial_collection() {
        let mut collector = TrialCollector::new(1.5).unwrap();
        collector.record(outcome(300, 100));
        collector.record(outcome(200, 100));
        collector.record(outcome(120, 100));
        collector.record(outcome(90, 100));
        assert_eq!(collector.trials(), 4);

        let report = collector.finalize();
        assert_eq!(report.trials, 4);
        assert_eq!(report.greedy_ahead, 3);
        assert_eq!(report.above_threshold, 2);
        assert_eq!(report.fraction_above_threshold(), 0.5);
        assert_eq!(report.total_greedy_loops, 710);
        assert_eq!(report.total_polite_loops, 400);
        assert!((report.min_ratio - 0.9).abs() < 0.01);
        assert!((report.max_ratio - 3.0).abs() < 0.01);
    }

    #[test]
    fn test_large_ratios_keep_their_magnitude() {
        let mut collector = TrialCollector::new(1.5).unwrap();
        collector.record(outcome(400, 100));
        collector.record(outcome(500, 100));
        collector.record(outcome(600, 100));

        let report = collector.finalize();
        assert!((report.min_ratio - 4.0).abs() < 0.01, "min {}", report.min_ratio);
        assert!(report.median_ratio > 3.9, "median {}", report.median_ratio);
        assert!((report.max_ratio - 6.0).abs() < 0.01, "max {}", report.max_ratio);
    }

    #[test]
    fn test_starved_polite_worker_is_capped() {
        let mut collector = TrialCollector::new(1.5).unwrap();
        collector.record(outcome(500, 0));

        let report = collector.finalize();
        assert_eq!(report.above_threshold, 1);
        assert!(report.max_ratio.is_finite());
        assert!(report.max_ratio >= 999_000.0);
    }

    #[test]
    fn test_empty_report() {
        let report = TrialCollector::new(1.5).unwrap().finalize();
        assert_eq!(report.trials, 0);
        assert_eq!(report.fraction_above_threshold(), 0.0);
        assert_eq!(report.median_ratio, 0.0);
    }
}
