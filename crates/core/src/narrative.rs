//! Worker-owned narrative buffer.

use serde::Serialize;
use std::fmt;

/// An ordered, append-only sequence of text fragments describing one worker's
/// attempts.
///
/// Owned by exactly one worker and never shared, so writing to it needs no
/// synchronization. The worker prints it once it is finished.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Narrative {
    fragments: Vec<String>,
}

impl Narrative {
    /// Start a narrative with an opening fragment.
    pub fn new(opening: impl Into<String>) -> Self {
        Self {
            fragments: vec![opening.into()],
        }
    }

    pub fn push(&mut self, fragment: impl Into<String>) {
        self.fragments.push(fragment.into());
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn last(&self) -> Option<&str> {
        self.fragments.last().map(String::as_str)
    }
}

impl fmt::Display for Narrative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fragments = self.fragments.iter();
        if let Some(first) = fragments.next() {
            f.write_str(first)?;
        }
        for fragment in fragments {
            write!(f, " {fragment}")?;
        }
        Ok(())
    }
}
