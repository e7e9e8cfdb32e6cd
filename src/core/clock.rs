//! Wall-clock abstraction
//!
//! Token issuance and expiry checks read the current instant through [`Clock`]
//! so that tests can pin time to an exact second.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration, Utc};

/// Source of the current instant
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a Unix second until moved with [`FixedClock::set`] or
/// [`FixedClock::advance`].
#[derive(Debug)]
pub struct FixedClock {
    seconds: AtomicI64,
}

impl FixedClock {
    /// Create a clock frozen at `at` (sub-second precision is dropped)
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            seconds: AtomicI64::new(at.timestamp()),
        }
    }

    /// Create a clock frozen at a Unix timestamp
    pub fn at_timestamp(seconds: i64) -> Self {
        Self {
            seconds: AtomicI64::new(seconds),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.seconds.store(at.timestamp(), Ordering::SeqCst);
    }

    /// Move the clock forward (or backward, for a negative delta)
    pub fn advance(&self, by: Duration) {
        self.seconds.fetch_add(by.num_seconds(), Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        let seconds = self.seconds.load(Ordering::SeqCst);
        DateTime::from_timestamp(seconds, 0).unwrap_or(DateTime::UNIX_EPOCH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_is_frozen() {
        let clock = FixedClock::at_timestamp(1_700_000_000);

        assert_eq!(clock.now().timestamp(), 1_700_000_000);
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn test_fixed_clock_advance() {
        let clock = FixedClock::at_timestamp(1_700_000_000);

        clock.advance(Duration::minutes(29));
        assert_eq!(clock.now().timestamp(), 1_700_000_000 + 29 * 60);

        clock.advance(Duration::seconds(-60));
        assert_eq!(clock.now().timestamp(), 1_700_000_000 + 28 * 60);
    }

    #[test]
    fn test_fixed_clock_set_drops_subseconds() {
        let clock = FixedClock::at_timestamp(0);
        let at = DateTime::from_timestamp(1_700_000_123, 999_000_000).unwrap();

        clock.set(at);
        assert_eq!(clock.now().timestamp(), 1_700_000_123);
        assert_eq!(clock.now().timestamp_subsec_nanos(), 0);
    }

    #[test]
    fn test_system_clock_tracks_utc_now() {
        let before = Utc::now().timestamp();
        let now = SystemClock.now().timestamp();
        let after = Utc::now().timestamp();

        assert!(before <= now && now <= after);
    }
}
