//! Core primitives for the concurrency hazard simulator.
//!
//! This crate provides the shared building blocks each hazard scenario is
//! assembled from:
//!
//! - [`ProtectedValue`]: An integer that is only reachable through its own lock
//! - [`Cadence`]: A periodic broadcast clock that releases all waiters together
//! - [`DirectionCounter`]: A lock-free claim counter for one [`Direction`]
//! - [`Narrative`]: A worker-owned, append-only log of what the worker tried
//!
//! # Ownership
//!
//! Scenarios allocate these primitives on their own stack and hand out borrows
//! to scoped worker threads:
//!
//! ```text
//! scenario ──owns──> ProtectedValue / Cadence / DirectionCounter
//!    │
//!    └── thread::scope ──borrows──> worker 1, worker 2, ...
//! ```
//!
//! Nothing here outlives the scenario call that created it. The only thread a
//! primitive starts on its own is the [`Cadence`] ticker, which is stopped and
//! joined when the cadence is dropped.

mod cadence;
mod direction;
mod narrative;
mod value;

pub use cadence::Cadence;
pub use direction::{Direction, DirectionCounter};
pub use narrative::Narrative;
pub use value::ProtectedValue;
