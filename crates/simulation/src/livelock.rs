//! Livelock scenario: walkers stepping aside in lockstep.
//!
//! Two walkers meet in a narrow hallway. Each tries to step left, then right,
//! to let the other pass. Both follow the same [`Cadence`], so they always try
//! the same direction on the same tick, see a claim count of 2, back off, and
//! try the other side, again together. Neither is blocked and neither is
//! favoured, yet neither gets through.
//!
//! # Walker state machine
//!
//! ```text
//!            ┌──────────────────────── round < max_rounds ───────────────────────┐
//!            v                                                                   │
//! Idle ─> ClaimLeft ─step─> CheckLeft ─step─> ReleaseLeft ─> ClaimRight ─step─> CheckRight ─step─> ReleaseRight
//!                              │                                                  │                     │
//!                              └── count == 1: Scooted <──────────────────────────┘                     └─> GaveUp
//! ```
//!
//! Every claim waits two ticks: one before checking and one before releasing.
//! A walker that succeeds still waits the second tick and releases, so each
//! claim/check/release round trip leaves the counter where it found it.

use crate::error::ScenarioError;
use hazard_core::{Cadence, Direction, DirectionCounter, Narrative};
use serde::Serialize;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// Configuration for the livelock scenario.
#[derive(Debug, Clone)]
pub struct LivelockConfig {
    /// Interval between cadence ticks.
    pub tick_interval: Duration,
    /// Rounds (left + right attempts) before a walker gives up.
    pub max_rounds: u32,
    /// Names of the walkers in the hallway.
    pub walkers: Vec<String>,
    /// Whether each walker prints its narrative to stdout when it finishes.
    pub echo_narratives: bool,
}

impl Default for LivelockConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(1),
            max_rounds: 5,
            walkers: vec!["Alice".to_string(), "Bob".to_string()],
            echo_narratives: true,
        }
    }
}

impl LivelockConfig {
    /// Set the cadence tick interval.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Set the retry bound.
    pub fn with_max_rounds(mut self, rounds: u32) -> Self {
        self.max_rounds = rounds;
        self
    }

    /// Replace the walkers.
    pub fn with_walkers<I, S>(mut self, walkers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.walkers = walkers.into_iter().map(Into::into).collect();
        self
    }

    /// Set whether walkers print their narratives.
    pub fn with_echo_narratives(mut self, echo: bool) -> Self {
        self.echo_narratives = echo;
        self
    }

    /// Upper bound on the ticks a single walker can wait.
    ///
    /// Two ticks per claim, two directions per round.
    pub fn max_ticks_per_walker(&self) -> u32 {
        self.max_rounds
            .saturating_mul(2)
            .saturating_mul(Direction::ALL.len() as u32)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.walkers.is_empty() {
            return Err(ScenarioError::InvalidConfig(
                "at least one walker is required".to_string(),
            ));
        }
        if self.max_rounds == 0 {
            return Err(ScenarioError::InvalidConfig(
                "max_rounds must be at least 1".to_string(),
            ));
        }
        if self.tick_interval.is_zero() {
            return Err(ScenarioError::InvalidConfig(
                "tick_interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// How a walker's attempts ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WalkOutcome {
    /// Found a direction nobody else claimed.
    Scooted { direction: Direction, round: u32 },
    /// Exhausted the retry budget. A normal terminal state, not a fault.
    GaveUp { rounds: u32 },
}

impl WalkOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, WalkOutcome::Scooted { .. })
    }
}

/// Everything one walker observed.
#[derive(Debug, Clone, Serialize)]
pub struct WalkerReport {
    pub name: String,
    pub outcome: WalkOutcome,
    pub narrative: Narrative,
    /// Cadence ticks this walker waited for.
    pub ticks_waited: u32,
    /// Claims that found another walker on the same side.
    pub collisions: u32,
}

/// Result of a livelock scenario run.
#[derive(Debug, Clone, Serialize)]
pub struct LivelockOutcome {
    /// One report per walker, in configuration order.
    pub walkers: Vec<WalkerReport>,
    /// Left counter after every walker returned.
    pub left_residual: i32,
    /// Right counter after every walker returned.
    pub right_residual: i32,
    /// Cadence generation when the scenario ended.
    pub ticks_elapsed: u64,
}

impl LivelockOutcome {
    /// True if no walker got through.
    pub fn is_livelocked(&self) -> bool {
        self.walkers.iter().all(|w| !w.outcome.is_success())
    }

    /// Print a summary of the run.
    ///
    /// Walkers print their own narratives as they finish; this adds the
    /// totals.
    pub fn print_summary(&self) {
        for walker in &self.walkers {
            println!(
                "  {}: {:?} after {} ticks, {} collisions",
                walker.name, walker.outcome, walker.ticks_waited, walker.collisions
            );
        }
        println!(
            "  Ticks: {}  Residual claims: left={} right={}",
            self.ticks_elapsed, self.left_residual, self.right_residual
        );
        if self.is_livelocked() {
            println!("  Nobody made it through the hallway.");
        }
    }
}

/// The two direction counters walkers contend on.
struct Hallway {
    left: DirectionCounter,
    right: DirectionCounter,
}

impl Hallway {
    fn new() -> Self {
        Self {
            left: DirectionCounter::new(Direction::Left),
            right: DirectionCounter::new(Direction::Right),
        }
    }

    fn counters(&self) -> [&DirectionCounter; 2] {
        [&self.left, &self.right]
    }
}

/// Run the livelock scenario.
///
/// Returns once every walker has either scooted or given up, which takes at
/// most [`LivelockConfig::max_ticks_per_walker`] ticks.
pub fn run(config: &LivelockConfig) -> Result<LivelockOutcome, ScenarioError> {
    config.validate()?;

    let hallway = Hallway::new();
    let cadence = Cadence::start(config.tick_interval)
        .map_err(|e| ScenarioError::spawn("cadence-ticker", e))?;

    info!(
        walkers = config.walkers.len(),
        max_rounds = config.max_rounds,
        tick_us = config.tick_interval.as_micros() as u64,
        "Starting livelock scenario"
    );

    let walkers = thread::scope(|s| -> Result<Vec<WalkerReport>, ScenarioError> {
        let mut handles = Vec::with_capacity(config.walkers.len());
        for name in &config.walkers {
            let (hallway, cadence) = (&hallway, &cadence);
            let handle = thread::Builder::new()
                .name(format!("walker-{name}"))
                .spawn_scoped(s, move || walk(name, hallway, cadence, config))
                .map_err(|e| ScenarioError::spawn(format!("walker-{name}"), e))?;
            handles.push((name, handle));
        }

        handles
            .into_iter()
            .map(|(name, handle)| {
                handle
                    .join()
                    .map_err(|_| ScenarioError::WorkerPanicked(name.clone()))
            })
            .collect()
    })?;

    let outcome = LivelockOutcome {
        walkers,
        left_residual: hallway.left.load(),
        right_residual: hallway.right.load(),
        ticks_elapsed: cadence.ticks(),
    };

    info!(
        livelocked = outcome.is_livelocked(),
        ticks = outcome.ticks_elapsed,
        "Livelock scenario completed"
    );

    Ok(outcome)
}

/// One walker: alternate left and right until a side is free or the retry
/// budget runs out. Prints its own narrative when done.
fn walk(
    name: &str,
    hallway: &Hallway,
    cadence: &Cadence,
    config: &LivelockConfig,
) -> WalkerReport {
    let max_rounds = config.max_rounds;
    let mut walker = Walker {
        narrative: Narrative::new(format!("{name} is trying to scoot:")),
        ticks_waited: 0,
        collisions: 0,
    };

    let mut outcome = WalkOutcome::GaveUp { rounds: max_rounds };
    'rounds: for round in 1..=max_rounds {
        for counter in hallway.counters() {
            if walker.try_direction(counter, cadence) {
                outcome = WalkOutcome::Scooted {
                    direction: counter.direction(),
                    round,
                };
                break 'rounds;
            }
        }
        debug!(walker = name, round, "Round ended in collision");
    }

    if !outcome.is_success() {
        walker.narrative.push(format!("{name} gave up."));
    }

    if config.echo_narratives {
        println!("{}", walker.narrative);
    }

    WalkerReport {
        name: name.to_string(),
        outcome,
        narrative: walker.narrative,
        ticks_waited: walker.ticks_waited,
        collisions: walker.collisions,
    }
}

/// Per-walker state. Owned by the walker's thread alone.
struct Walker {
    narrative: Narrative,
    ticks_waited: u32,
    collisions: u32,
}

impl Walker {
    /// Claim, check and release one direction. Returns true if the direction
    /// was free.
    fn try_direction(&mut self, counter: &DirectionCounter, cadence: &Cadence) -> bool {
        self.narrative.push(counter.direction().as_str());
        counter.claim();
        self.step(cadence);

        let claims = counter.load();
        assert!(
            claims >= 1,
            "{} counter read {claims} while this walker holds a claim",
            counter.direction()
        );
        let clear = claims == 1;
        if clear {
            self.narrative.push("Success!");
        } else {
            self.collisions += 1;
        }

        self.step(cadence);
        counter.release();
        clear
    }

    fn step(&mut self, cadence: &Cadence) {
        cadence.await_step();
        self.ticks_waited += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LivelockConfig::default();
        assert_eq!(config.tick_interval, Duration::from_millis(1));
        assert_eq!(config.max_rounds, 5);
        assert_eq!(config.walkers, vec!["Alice", "Bob"]);
        assert_eq!(config.max_ticks_per_walker(), 20);
    }

    #[test]
    fn test_validation() {
        let empty: [&str; 0] = [];
        assert!(LivelockConfig::default()
            .with_walkers(empty)
            .validate()
            .is_err());
        assert!(LivelockConfig::default()
            .with_max_rounds(0)
            .validate()
            .is_err());
        assert!(LivelockConfig::default()
            .with_tick_interval(Duration::ZERO)
            .validate()
            .is_err());
    }

    #[test]
    fn test_tick_bound_saturates() {
        let config = LivelockConfig::default().with_max_rounds(u32::MAX);
        assert_eq!(config.max_ticks_per_walker(), u32::MAX);
    }

    #[test]
    #[should_panic(expected = "while this walker holds a claim")]
    fn test_counter_released_by_another_party_panics() {
        let cadence = Cadence::start(Duration::from_millis(1)).unwrap();
        let counter = DirectionCounter::new(Direction::Left);
        // A stray release: the walker's claim only brings the count back to 0.
        counter.release();

        let mut walker = Walker {
            narrative: Narrative::new("Alice is trying to scoot:"),
            ticks_waited: 0,
            collisions: 0,
        };
        walker.try_direction(&counter, &cadence);
    }

    #[test]
    fn test_lone_walker_scoots_left_first() {
        let config = LivelockConfig::default().with_walkers(["Alice"]);
        let outcome = run(&config).unwrap();

        let alice = &outcome.walkers[0];
        assert_eq!(
            alice.outcome,
            WalkOutcome::Scooted {
                direction: Direction::Left,
                round: 1
            }
        );
        assert_eq!(alice.ticks_waited, 2);
        assert_eq!(alice.collisions, 0);
        assert_eq!(
            alice.narrative.to_string(),
            "Alice is trying to scoot: left Success!"
        );
        assert_eq!(outcome.left_residual, 0);
        assert_eq!(outcome.right_residual, 0);
    }
}
