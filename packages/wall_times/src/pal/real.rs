//! Real platform implementation backed by the operating system monotonic clock.

use std::sync::LazyLock;
use std::time::{Duration, Instant};

use crate::pal::abstractions::Platform;

/// The fixed origin all real timestamps are measured from.
///
/// Captured on first use. Only differences between timestamps matter, so the exact
/// moment of capture is irrelevant.
static ORIGIN: LazyLock<Instant> = LazyLock::new(Instant::now);

/// Real implementation of the platform abstraction, backed by [`Instant`].
///
/// The monotonic clock cannot go backwards, so intervals measured from it are
/// never negative.
#[derive(Clone, Debug)]
pub(crate) struct RealPlatform;

impl Platform for RealPlatform {
    #[cfg_attr(test, mutants::skip)] // Mutating a clock read yields different timings, not failures.
    fn timestamp(&self) -> Duration {
        ORIGIN.elapsed()
    }
}
