use std::time::Instant;

use crate::domain::Timestamp;
use crate::ports::TimeSource;

// ============================================================================
// SystemTimeSource - Production Time Source
// ============================================================================

/// Production time source backed by the monotonic clock.
///
/// Timestamps count milliseconds since the source was created, so wall-clock
/// adjustments never move a deadline. For testing, use the
/// `ControllableTimeSource` from the test utilities.
///
/// # Example
///
/// ```rust
/// use aware_core::adapters::SystemTimeSource;
/// use aware_core::ports::TimeSource;
///
/// let time_source = SystemTimeSource::new();
/// let earlier = time_source.now();
/// assert!(time_source.now() >= earlier);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    epoch: Instant,
}

impl SystemTimeSource {
    /// Create a time source whose epoch is now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        let millis = u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX);
        Timestamp::new(millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_time_is_monotonic() {
        let source = SystemTimeSource::new();
        let first = source.now();
        std::thread::sleep(std::time::Duration::from_millis(2));
        assert!(source.now() > first);
    }
}
