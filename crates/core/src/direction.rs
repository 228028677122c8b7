//! Lock-free direction claim counters.

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};

/// A direction a walker can try to step into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    /// Both directions, in the order walkers try them.
    pub const ALL: [Direction; 2] = [Direction::Left, Direction::Right];

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How many tasks currently claim a direction.
///
/// Mutated only through atomic increment and decrement; there is no lock, so
/// claiming and checking never block. Every [`claim`](Self::claim) must be
/// paired with a [`release`](Self::release).
#[derive(Debug)]
pub struct DirectionCounter {
    direction: Direction,
    claims: AtomicI32,
}

impl DirectionCounter {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            claims: AtomicI32::new(0),
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Claim the direction. Returns the count including this claim.
    pub fn claim(&self) -> i32 {
        self.claims.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Release a previous claim. Returns the count after the release.
    pub fn release(&self) -> i32 {
        self.claims.fetch_sub(1, Ordering::SeqCst) - 1
    }

    /// Current number of claims.
    pub fn load(&self) -> i32 {
        self.claims.load(Ordering::SeqCst)
    }
}
