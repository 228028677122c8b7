//! A lock-guarded integer.

use parking_lot::{Mutex, MutexGuard};

/// A mutable integer guarded by its own exclusive lock.
///
/// The value can only be read or written through the guard returned by
/// [`lock`](Self::lock), so every access happens while the lock is held.
#[derive(Debug, Default)]
pub struct ProtectedValue {
    value: Mutex<i64>,
}

impl ProtectedValue {
    /// Create a new protected value.
    pub fn new(value: i64) -> Self {
        Self {
            value: Mutex::new(value),
        }
    }

    /// Acquire the lock, blocking until it is available.
    ///
    /// There is no timeout. A task that waits here on a lock that is never
    /// released waits forever.
    pub fn lock(&self) -> MutexGuard<'_, i64> {
        self.value.lock()
    }

    /// Acquire the lock only if it is free right now.
    pub fn try_lock(&self) -> Option<MutexGuard<'_, i64>> {
        self.value.try_lock()
    }

    /// Read the current value (locks for the duration of the read).
    pub fn get(&self) -> i64 {
        *self.value.lock()
    }
}
