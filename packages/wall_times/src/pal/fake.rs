//! Fake platform implementation for testing.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::pal::abstractions::Platform;

/// Fake implementation of the platform abstraction for testing.
///
/// This implementation lets tests control the clock explicitly instead of relying
/// on the operating system. Multiple clones of the same `FakePlatform` share the
/// same underlying clock value, so a test can keep one handle and advance time
/// while recorders hold clones.
#[derive(Clone, Debug)]
pub(crate) struct FakePlatform {
    now: Arc<Mutex<Duration>>,
}

impl FakePlatform {
    /// Creates a new fake platform with the clock at zero.
    pub(crate) fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Sets the clock to an absolute value.
    ///
    /// This affects all clones of this platform.
    pub(crate) fn set_timestamp(&self, timestamp: Duration) {
        *self
            .now
            .lock()
            .expect("FakePlatform clock lock should not be poisoned") = timestamp;
    }

    /// Moves the clock forward by the given amount.
    ///
    /// This affects all clones of this platform.
    pub(crate) fn advance(&self, by: Duration) {
        let mut now = self
            .now
            .lock()
            .expect("FakePlatform clock lock should not be poisoned");

        *now = now
            .checked_add(by)
            .expect("fake clock overflows Duration - this indicates an unrealistic scenario");
    }
}

impl Platform for FakePlatform {
    fn timestamp(&self) -> Duration {
        *self
            .now
            .lock()
            .expect("FakePlatform clock lock should not be poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initializes_at_zero() {
        let platform = FakePlatform::new();

        assert_eq!(platform.timestamp(), Duration::ZERO);
    }

    #[test]
    fn set_timestamp_is_absolute() {
        let platform = FakePlatform::new();

        platform.set_timestamp(Duration::from_millis(150));
        platform.set_timestamp(Duration::from_millis(100));

        assert_eq!(platform.timestamp(), Duration::from_millis(100));
    }

    #[test]
    fn advance_accumulates() {
        let platform = FakePlatform::new();

        platform.advance(Duration::from_millis(30));
        platform.advance(Duration::from_millis(20));

        assert_eq!(platform.timestamp(), Duration::from_millis(50));
    }

    #[test]
    fn shared_state_between_clones() {
        let platform1 = FakePlatform::new();
        let platform2 = platform1.clone();

        // Advancing one clone is visible through the other.
        platform1.advance(Duration::from_millis(100));
        assert_eq!(platform2.timestamp(), Duration::from_millis(100));
    }
}
