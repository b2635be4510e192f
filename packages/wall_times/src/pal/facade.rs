//! Facade that selects between the real and fake platform implementations.

use std::time::Duration;

use crate::pal::abstractions::Platform;
#[cfg(test)]
use crate::pal::fake::FakePlatform;
use crate::pal::real::RealPlatform;

/// Enum facade over the supported platform implementations.
///
/// Recorders and tables hold this by value; cloning is cheap and all clones
/// observe the same underlying clock.
#[derive(Clone, Debug)]
pub(crate) enum PlatformFacade {
    /// The real operating system clock.
    Real(RealPlatform),

    /// A test-controlled clock.
    #[cfg(test)]
    Fake(FakePlatform),
}

impl PlatformFacade {
    /// Creates a facade over the real platform.
    pub(crate) fn real() -> Self {
        Self::Real(RealPlatform)
    }

    /// Creates a facade over a fake platform for testing.
    #[cfg(test)]
    pub(crate) fn fake(platform: FakePlatform) -> Self {
        Self::Fake(platform)
    }
}

impl Platform for PlatformFacade {
    fn timestamp(&self) -> Duration {
        match self {
            Self::Real(real) => real.timestamp(),
            #[cfg(test)]
            Self::Fake(fake) => fake.timestamp(),
        }
    }
}
