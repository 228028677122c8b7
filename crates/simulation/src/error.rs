//! Scenario errors.
//!
//! These cover failures of the harness itself. Deadlock, livelock and
//! starvation are outcomes, not errors, and never surface here.

use std::io;
use thiserror::Error;

/// Errors that can occur while setting up or running a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to spawn {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("Worker {0} panicked")]
    WorkerPanicked(String),

    #[error("Metrics error: {0}")]
    Metrics(String),
}

impl ScenarioError {
    pub(crate) fn spawn(name: impl Into<String>, source: io::Error) -> Self {
        Self::Spawn {
            name: name.into(),
            source,
        }
    }
}
