//! Periodic broadcast clock.
//!
//! A [`Cadence`] owns one background ticker thread. Every `interval` the
//! ticker bumps a generation counter under the gate lock and wakes every
//! waiter at once. Participants call [`Cadence::await_step`] to park until the
//! next tick, which lines their steps up in time.
//!
//! ```text
//!   ticker:   ──tick 1──────tick 2──────tick 3──>
//!   worker A:   claim ─wait─┘ check ─wait─┘ release
//!   worker B:   claim ─wait─┘ check ─wait─┘ release
//! ```
//!
//! Waiting is keyed on the generation observed on entry, so a waiter resumes
//! only after a tick has actually happened: a spurious condvar wake-up puts it
//! straight back to sleep, and a broadcast sent between entry and the wait
//! call is not lost because the generation has already moved.

use parking_lot::{Condvar, Mutex};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Gate shared between the ticker and the waiters.
///
/// The mutex protects the generation counter only; it never guards any
/// worker payload.
#[derive(Debug, Default)]
struct Gate {
    generation: Mutex<u64>,
    bell: Condvar,
}

/// A broadcast clock signalled by a single dedicated ticker thread.
#[derive(Debug)]
pub struct Cadence {
    gate: Arc<Gate>,
    running: Arc<AtomicBool>,
    ticker: Option<JoinHandle<()>>,
}

impl Cadence {
    /// Start a cadence ticking every `interval`.
    ///
    /// Spawns exactly one ticker thread, which runs until the cadence is
    /// dropped.
    pub fn start(interval: Duration) -> io::Result<Self> {
        let gate = Arc::new(Gate::default());
        let running = Arc::new(AtomicBool::new(true));

        let ticker = {
            let gate = Arc::clone(&gate);
            let running = Arc::clone(&running);
            thread::Builder::new()
                .name("cadence-ticker".to_string())
                .spawn(move || tick_loop(&gate, &running, interval))?
        };

        debug!(interval_us = interval.as_micros() as u64, "Cadence started");

        Ok(Self {
            gate,
            running,
            ticker: Some(ticker),
        })
    }

    /// Block until the next tick and return its generation.
    ///
    /// The gate lock is held only inside this call and is released while
    /// parked, so the ticker is never starved by a waiter.
    pub fn await_step(&self) -> u64 {
        let mut generation = self.gate.generation.lock();
        let seen = *generation;
        while *generation == seen {
            self.gate.bell.wait(&mut generation);
        }
        *generation
    }

    /// Number of ticks broadcast so far.
    pub fn ticks(&self) -> u64 {
        *self.gate.generation.lock()
    }
}

impl Drop for Cadence {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(ticker) = self.ticker.take() {
            // The ticker only sleeps and broadcasts; it cannot panic in a way
            // worth propagating out of drop.
            let _ = ticker.join();
        }
        trace!(ticks = self.ticks(), "Cadence stopped");
    }
}

/// Fixed-rate tick loop. Deadlines advance by `interval` from the start time
/// so slow wake-ups do not accumulate drift.
fn tick_loop(gate: &Gate, running: &AtomicBool, interval: Duration) {
    let mut next = Instant::now() + interval;
    while running.load(Ordering::Acquire) {
        thread::sleep(next.saturating_duration_since(Instant::now()));
        next += interval;

        {
            let mut generation = gate.generation.lock();
            *generation += 1;
        }
        gate.bell.notify_all();
    }
}
