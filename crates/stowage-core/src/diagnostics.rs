//! Thread-safe warning collection.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::warn;

/// Append-only collector of warning messages.
///
/// Handles are cheap to clone and share one underlying list; every warning
/// is also emitted to the log with a `WARNING:` prefix. Append order is
/// preserved, duplicates are kept.
#[derive(Debug, Clone, Default)]
pub struct Warnings {
    inner: Arc<Mutex<Vec<String>>>,
}

impl Warnings {
    /// Create an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and emit it to the log.
    pub fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        warn!("WARNING: {message}");
        self.inner.lock().push(message);
    }

    /// Number of warnings collected so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether nothing has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Copy of the collected warnings, in append order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<String> {
        self.inner.lock().clone()
    }
}
