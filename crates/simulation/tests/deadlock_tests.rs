//! Deadlock scenario integration tests.
//!
//! A deadlock is the expected result, so these tests impose their own
//! deadline and assert that the scenario did NOT finish before it. The
//! scenario runs on a detached thread that is left blocked when the test ends.

use hazard_simulation::deadlock::{self, DeadlockConfig, DeadlockOutcome, LockOrder};
use hazard_simulation::ScenarioError;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing_test::traced_test;

/// Start the scenario on a detached thread and return a channel that yields
/// its result if it ever finishes.
fn observe(config: DeadlockConfig) -> Receiver<Result<DeadlockOutcome, ScenarioError>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(deadlock::run(&config));
    });
    rx
}

#[test]
#[traced_test]
fn test_opposite_order_never_completes() {
    let config = DeadlockConfig::default().with_hold_delay(Duration::from_millis(100));
    let rx = observe(config);

    // Ten times the hold delay: both second-lock attempts are long overdue.
    let result = rx.recv_timeout(Duration::from_secs(1));
    assert!(
        matches!(result, Err(RecvTimeoutError::Timeout)),
        "deadlock scenario should still be blocked, got {result:?}"
    );
}

/// The default constants: 2s hold, observed against a 5s external deadline.
#[test]
fn test_default_constants_hang_past_external_deadline() {
    let rx = observe(DeadlockConfig::default());

    let start = Instant::now();
    let result = rx.recv_timeout(Duration::from_secs(5));

    assert!(matches!(result, Err(RecvTimeoutError::Timeout)));
    assert!(start.elapsed() >= Duration::from_secs(5));
}

#[test]
fn test_hang_persists_across_repeated_runs() {
    let receivers: Vec<_> = (0..4)
        .map(|_| observe(DeadlockConfig::default().with_hold_delay(Duration::from_millis(50))))
        .collect();

    thread::sleep(Duration::from_millis(500));

    for rx in receivers {
        assert!(matches!(rx.try_recv(), Err(mpsc::TryRecvError::Empty)));
    }
}

#[test]
fn test_consistent_order_completes_within_deadline() {
    let config = DeadlockConfig::default()
        .with_hold_delay(Duration::from_millis(100))
        .with_lock_order(LockOrder::Consistent)
        .with_initial_values(20, 22);
    let rx = observe(config);

    let outcome = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("control run should finish")
        .expect("control run should not error");

    assert_eq!(outcome.lock_order, LockOrder::Consistent);
    assert_eq!(outcome.sums, vec![42, 42]);
}

#[test]
fn test_invalid_config_is_rejected_without_spawning() {
    let config = DeadlockConfig::default().with_hold_delay(Duration::ZERO);
    let err = deadlock::run(&config).unwrap_err();
    assert!(matches!(err, ScenarioError::InvalidConfig(_)));
}
