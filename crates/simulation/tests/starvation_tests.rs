//! Starvation scenario integration tests.
//!
//! The scenario is statistical: both workers progress, the greedy one more.
//! Windows are shortened from the default second to keep the suite quick,
//! except for one run at the default constants.

use hazard_simulation::starvation::{self, StarvationConfig};
use std::time::Duration;
use tracing_test::traced_test;

/// Allowed overrun past the window: one loop's worth of sleeping and lock
/// waiting, with generous slack for a loaded CI machine.
const OVERRUN_SLACK: Duration = Duration::from_millis(250);

#[test]
#[traced_test]
fn test_default_constants_favour_greedy_worker() {
    let config = StarvationConfig::default();
    let outcome = starvation::run(&config).unwrap();

    assert!(outcome.greedy.loops > 0);
    assert!(outcome.polite.loops > 0);
    assert!(
        outcome.greedy.loops > outcome.polite.loops,
        "greedy={} polite={}",
        outcome.greedy.loops,
        outcome.polite.loops
    );
    assert!(logs_contain("Starvation scenario completed"));
}

#[test]
fn test_window_is_respected() {
    let config = StarvationConfig::default().with_window(Duration::from_millis(200));
    let outcome = starvation::run(&config).unwrap();

    for tally in [&outcome.greedy, &outcome.polite] {
        assert!(tally.elapsed > config.window);
        assert!(tally.elapsed < config.window + OVERRUN_SLACK);
    }
}

#[test]
fn test_acquisitions_match_loop_shape() {
    let config = StarvationConfig::default().with_window(Duration::from_millis(100));
    let outcome = starvation::run(&config).unwrap();

    assert_eq!(outcome.greedy.acquisitions, outcome.greedy.loops);
    assert_eq!(
        outcome.polite.acquisitions,
        outcome.polite.loops * u64::from(config.polite_acquisitions)
    );
}

#[test]
fn test_single_acquisition_polite_worker_is_not_starved() {
    // With one acquisition per loop and equal hold times the two workers are
    // symmetric; neither should be shut out entirely.
    let config = StarvationConfig::default()
        .with_window(Duration::from_millis(200))
        .with_polite_acquisitions(1)
        .with_polite_hold(Duration::from_nanos(3));
    let outcome = starvation::run(&config).unwrap();

    assert!(outcome.greedy.loops > 0);
    assert!(outcome.polite.loops > 0);
}
