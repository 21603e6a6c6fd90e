//! De-duplicated error reporting.

use std::sync::Arc;
use std::sync::Mutex;

#[derive(Debug, Default)]
struct LatchInner {
    current: Option<String>,
    notified: Option<String>,
}

/// Holds the latest persistence error and hands out one notice per distinct
/// message.
///
/// Cheap to clone; clones share the same state.
///
/// # Example
///
/// ```
/// use datagrid_lib::prefs::ErrorLatch;
///
/// let latch = ErrorLatch::new();
/// latch.raise("disk full");
/// assert_eq!(latch.take_notice().as_deref(), Some("disk full"));
///
/// // Same error again: no second notice.
/// latch.raise("disk full");
/// assert_eq!(latch.take_notice(), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ErrorLatch {
    inner: Arc<Mutex<LatchInner>>,
}

impl ErrorLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error as the current one.
    pub fn raise(&self, message: impl Into<String>) {
        if let Ok(mut guard) = self.inner.lock() {
            guard.current = Some(message.into());
        }
    }

    /// Clears the current error and forgets what was already notified.
    pub fn clear(&self) {
        if let Ok(mut guard) = self.inner.lock() {
            guard.current = None;
            guard.notified = None;
        }
    }

    /// The current error message, if any.
    pub fn current(&self) -> Option<String> {
        self.inner.lock().ok().and_then(|guard| guard.current.clone())
    }

    /// Returns the current error if it has not been handed out yet.
    pub fn take_notice(&self) -> Option<String> {
        let mut guard = self.inner.lock().ok()?;
        let current = guard.current.clone()?;
        if guard.notified.as_deref() == Some(current.as_str()) {
            return None;
        }
        guard.notified = Some(current.clone());
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_once_per_distinct_message() {
        let latch = ErrorLatch::new();
        assert_eq!(latch.take_notice(), None);

        latch.raise("a");
        assert_eq!(latch.take_notice().as_deref(), Some("a"));
        assert_eq!(latch.take_notice(), None);

        latch.raise("b");
        assert_eq!(latch.take_notice().as_deref(), Some("b"));

        latch.raise("a");
        assert_eq!(latch.take_notice().as_deref(), Some("a"));
    }

    #[test]
    fn test_clear_rearms() {
        let latch = ErrorLatch::new();
        latch.raise("a");
        latch.take_notice();
        latch.clear();
        assert_eq!(latch.current(), None);

        latch.raise("a");
        assert_eq!(latch.take_notice().as_deref(), Some("a"));
    }
}
