//! Platform abstraction trait definitions.

use std::fmt::Debug;
use std::time::Duration;

/// Provides the wall-clock time source for interval recording.
///
/// This trait abstracts the underlying clock, allowing for the real monotonic
/// clock in production use and a settable fake clock in tests.
pub(crate) trait Platform: Debug + Send + Sync + 'static {
    /// Gets the current timestamp as the time elapsed since a fixed origin.
    ///
    /// Timestamps are only meaningful relative to each other. All timestamps from
    /// one platform share the same origin, so their differences are real elapsed
    /// durations.
    fn timestamp(&self) -> Duration;
}
