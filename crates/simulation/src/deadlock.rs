//! Deadlock scenario: circular wait on two protected values.
//!
//! Two tasks each lock two [`ProtectedValue`]s and print their sum. With
//! [`LockOrder::Opposite`] the first task locks A then B and the second locks B
//! then A:
//!
//! ```text
//! task 1: lock(A) ── sleep ── lock(B) ...blocked: B held by task 2
//! task 2: lock(B) ── sleep ── lock(A) ...blocked: A held by task 1
//! ```
//!
//! The sleep between the first and second acquisition guarantees both tasks
//! hold their first lock before either asks for its second, so the circular
//! wait is certain rather than a race. [`run`] then never returns. Bounding
//! that wait is the caller's job; nothing here times out.

use crate::error::ScenarioError;
use hazard_core::ProtectedValue;
use serde::Serialize;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Order in which the two tasks acquire the pair of values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LockOrder {
    /// Task 1 locks A then B, task 2 locks B then A. Deadlocks.
    #[default]
    Opposite,
    /// Both tasks lock A then B. Completes; used as a control run.
    Consistent,
}

/// Configuration for the deadlock scenario.
#[derive(Debug, Clone)]
pub struct DeadlockConfig {
    /// How long each task holds its first lock before asking for the second.
    pub hold_delay: Duration,
    /// Acquisition order of the two tasks.
    pub lock_order: LockOrder,
    /// Starting values of A and B.
    pub initial: (i64, i64),
    /// Whether each task prints its sum to stdout.
    pub echo_sums: bool,
}

impl Default for DeadlockConfig {
    fn default() -> Self {
        Self {
            hold_delay: Duration::from_secs(2),
            lock_order: LockOrder::Opposite,
            initial: (0, 0),
            echo_sums: true,
        }
    }
}

impl DeadlockConfig {
    /// Set the hold delay.
    pub fn with_hold_delay(mut self, delay: Duration) -> Self {
        self.hold_delay = delay;
        self
    }

    /// Set the lock order.
    pub fn with_lock_order(mut self, order: LockOrder) -> Self {
        self.lock_order = order;
        self
    }

    /// Set the starting values of A and B.
    pub fn with_initial_values(mut self, a: i64, b: i64) -> Self {
        self.initial = (a, b);
        self
    }

    /// Set whether tasks print their sums.
    pub fn with_echo_sums(mut self, echo: bool) -> Self {
        self.echo_sums = echo;
        self
    }

    /// Validate the configuration.
    ///
    /// Opposite ordering without a hold delay only deadlocks some of the time,
    /// so it is rejected.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.lock_order == LockOrder::Opposite && self.hold_delay.is_zero() {
            return Err(ScenarioError::InvalidConfig(
                "hold_delay must be non-zero when tasks lock in opposite order".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of a deadlock scenario run that completed.
///
/// Only reachable with [`LockOrder::Consistent`].
#[derive(Debug, Clone, Serialize)]
pub struct DeadlockOutcome {
    /// Acquisition order that was used.
    pub lock_order: LockOrder,
    /// Sum printed by each task, in task order.
    pub sums: Vec<i64>,
    /// Wall-clock time until both tasks finished.
    pub elapsed: Duration,
}

impl DeadlockOutcome {
    /// Print a summary of the run.
    pub fn print_summary(&self) {
        println!("Deadlock scenario completed ({:?} lock order)", self.lock_order);
        for (task, sum) in self.sums.iter().enumerate() {
            println!("  Task {}: sum is {}", task + 1, sum);
        }
        println!("  Elapsed: {:?}", self.elapsed);
    }
}

/// Run the deadlock scenario.
///
/// Blocks until both tasks finish. With [`LockOrder::Opposite`] they never
/// do, and neither does this call.
pub fn run(config: &DeadlockConfig) -> Result<DeadlockOutcome, ScenarioError> {
    config.validate()?;

    let a = ProtectedValue::new(config.initial.0);
    let b = ProtectedValue::new(config.initial.1);

    let tasks = match config.lock_order {
        LockOrder::Opposite => [("print-sum-1", &a, &b), ("print-sum-2", &b, &a)],
        LockOrder::Consistent => [("print-sum-1", &a, &b), ("print-sum-2", &a, &b)],
    };
    let (hold_delay, echo) = (config.hold_delay, config.echo_sums);

    info!(
        lock_order = ?config.lock_order,
        hold_delay_ms = hold_delay.as_millis() as u64,
        "Starting deadlock scenario"
    );

    let start = Instant::now();
    let sums = thread::scope(|s| -> Result<Vec<i64>, ScenarioError> {
        let mut handles = Vec::with_capacity(tasks.len());
        for (name, first, second) in tasks {
            let handle = thread::Builder::new()
                .name(name.to_string())
                .spawn_scoped(s, move || print_sum(name, first, second, hold_delay, echo))
                .map_err(|e| ScenarioError::spawn(name, e))?;
            handles.push((name, handle));
        }

        // Completion barrier.
        handles
            .into_iter()
            .map(|(name, handle)| {
                handle
                    .join()
                    .map_err(|_| ScenarioError::WorkerPanicked(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()
    })?;

    let elapsed = start.elapsed();
    info!(
        elapsed_ms = elapsed.as_millis() as u64,
        "Deadlock scenario completed"
    );

    Ok(DeadlockOutcome {
        lock_order: config.lock_order,
        sums,
        elapsed,
    })
}

/// Lock `first`, hold it for `hold_delay`, then lock `second` and sum them.
fn print_sum(
    task: &str,
    first: &ProtectedValue,
    second: &ProtectedValue,
    hold_delay: Duration,
    echo: bool,
) -> i64 {
    let first = first.lock();
    debug!(task, "Holding first lock");

    thread::sleep(hold_delay);

    let second = match second.try_lock() {
        Some(guard) => guard,
        None => {
            debug!(task, "Second lock held elsewhere, blocking");
            second.lock()
        }
    };

    let sum = *first + *second;
    if echo {
        println!("sum is {sum}");
    }
    sum
}
