//! Simulator configuration.

use crate::runner::SimulatorError;
use hazard_simulation::{DeadlockConfig, LivelockConfig, StarvationConfig};
use std::time::Duration;

/// Configuration for a simulator run.
///
/// Harness policy (deadline, trial count, ratio threshold) plus the
/// configuration of each scenario. Defaults reproduce the scenarios' design
/// constants.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// How long to wait for the deadlock scenario before declaring it hung.
    pub deadlock_timeout: Duration,
    /// Number of starvation runs to aggregate.
    pub starvation_trials: usize,
    /// Greedy/polite loop ratio a trial must exceed to count as starved.
    pub ratio_threshold: f64,
    /// Deadlock scenario configuration.
    pub deadlock: DeadlockConfig,
    /// Livelock scenario configuration.
    pub livelock: LivelockConfig,
    /// Starvation scenario configuration.
    pub starvation: StarvationConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            deadlock_timeout: Duration::from_secs(5),
            starvation_trials: 1,
            ratio_threshold: 1.5,
            deadlock: DeadlockConfig::default(),
            livelock: LivelockConfig::default(),
            starvation: StarvationConfig::default(),
        }
    }
}

impl SimulatorConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the external deadline for the deadlock scenario.
    pub fn with_deadlock_timeout(mut self, timeout: Duration) -> Self {
        self.deadlock_timeout = timeout;
        self
    }

    /// Set the number of starvation trials.
    pub fn with_starvation_trials(mut self, trials: usize) -> Self {
        self.starvation_trials = trials;
        self
    }

    /// Set the starvation ratio threshold.
    pub fn with_ratio_threshold(mut self, threshold: f64) -> Self {
        self.ratio_threshold = threshold;
        self
    }

    /// Set the deadlock scenario configuration.
    pub fn with_deadlock(mut self, deadlock: DeadlockConfig) -> Self {
        self.deadlock = deadlock;
        self
    }

    /// Set the livelock scenario configuration.
    pub fn with_livelock(mut self, livelock: LivelockConfig) -> Self {
        self.livelock = livelock;
        self
    }

    /// Set the starvation scenario configuration.
    pub fn with_starvation(mut self, starvation: StarvationConfig) -> Self {
        self.starvation = starvation;
        self
    }

    /// Validate the harness policy and every scenario configuration.
    pub fn validate(&self) -> Result<(), SimulatorError> {
        if self.deadlock_timeout.is_zero() {
            return Err(SimulatorError::InvalidConfig(
                "deadlock_timeout must be non-zero".to_string(),
            ));
        }
        if self.starvation_trials == 0 {
            return Err(SimulatorError::InvalidConfig(
                "starvation_trials must be at least 1".to_string(),
            ));
        }
        if !self.ratio_threshold.is_finite() || self.ratio_threshold <= 0.0 {
            return Err(SimulatorError::InvalidConfig(format!(
                "ratio_threshold must be a positive number, got {}",
                self.ratio_threshold
            )));
        }

        self.deadlock.validate()?;
        self.livelock.validate()?;
        self.starvation.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SimulatorConfig::new();
        assert_eq!(config.deadlock_timeout, Duration::from_secs(5));
        assert_eq!(config.starvation_trials, 1);
        assert_eq!(config.ratio_threshold, 1.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = SimulatorConfig::new()
            .with_deadlock_timeout(Duration::from_secs(1))
            .with_starvation_trials(10)
            .with_ratio_threshold(2.0)
            .with_starvation(StarvationConfig::default().with_window(Duration::from_millis(50)));

        assert_eq!(config.deadlock_timeout, Duration::from_secs(1));
        assert_eq!(config.starvation_trials, 10);
        assert_eq!(config.ratio_threshold, 2.0);
        assert_eq!(config.starvation.window, Duration::from_millis(50));
    }

    #[test]
    fn test_validation_rejects_bad_policy() {
        assert!(SimulatorConfig::new()
            .with_starvation_trials(0)
            .validate()
            .is_err());
        assert!(SimulatorConfig::new()
            .with_ratio_threshold(f64::NAN)
            .validate()
            .is_err());
        assert!(SimulatorConfig::new()
            .with_deadlock_timeout(Duration::ZERO)
            .validate()
            .is_err());
    }

    #[test]
    fn test_validation_checks_scenarios() {
        let config = SimulatorConfig::new()
            .with_livelock(LivelockConfig::default().with_max_rounds(0));
        assert!(matches!(
            config.validate(),
            Err(SimulatorError::Scenario(_))
        ));
    }
}
