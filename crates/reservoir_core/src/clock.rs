//! # Time Sources
//!
//! Every timestamp in the pooling core comes from a [`Clock`], so idle timeouts,
//! strategy scores and demand prediction can be driven deterministically in tests.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Monotonic timestamp in milliseconds since the clock's epoch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// The clock's epoch.
    pub const ZERO: Self = Self(0);

    /// Milliseconds since the epoch.
    #[inline]
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Time elapsed from `earlier` to `self`, saturating at zero.
    #[inline]
    #[must_use]
    pub const fn saturating_since(self, earlier: Self) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }

    /// Returns this timestamp moved forward by `delta`.
    #[inline]
    #[must_use]
    pub fn plus(self, delta: Duration) -> Self {
        let millis = u64::try_from(delta.as_millis()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(millis))
    }
}

/// Injectable time source.
pub trait Clock: Send + Sync {
    /// Current monotonic time.
    fn now(&self) -> Timestamp;

    /// Current hour of day in `0..24`, used for time-slot bucketing.
    fn hour_of_day(&self) -> u8;
}

/// Wall clock backed by [`Instant`] for monotonic time and UTC for the hour.
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Creates a clock whose epoch is the moment of construction.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let millis = u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX);
        Timestamp(millis)
    }

    fn hour_of_day(&self) -> u8 {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        // Always < 24
        ((secs / 3600) % 24) as u8
    }
}

/// Manually advanced clock for tests and simulations.
///
/// ```rust,ignore
/// let clock = ManualClock::new();
/// clock.advance(Duration::from_secs(90));
/// assert_eq!(clock.now().as_millis(), 90_000);
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicU64,
    hour: AtomicU8,
}

impl ManualClock {
    /// Creates a clock at the epoch, hour 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clock at the epoch with the given hour of day.
    #[must_use]
    pub fn at_hour(hour: u8) -> Self {
        let clock = Self::new();
        clock.set_hour(hour);
        clock
    }

    /// Moves time forward.
    pub fn advance(&self, delta: Duration) {
        let millis = u64::try_from(delta.as_millis()).unwrap_or(u64::MAX);
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }

    /// Sets the reported hour of day (taken modulo 24).
    pub fn set_hour(&self, hour: u8) {
        self.hour.store(hour % 24, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.millis.load(Ordering::SeqCst))
    }

    fn hour_of_day(&self) -> u8 {
        self.hour.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::at_hour(27);
        assert_eq!(clock.hour_of_day(), 3);
        clock.advance(Duration::from_millis(1500));
        assert_eq!(clock.now(), Timestamp(1500));
    }

    #[test]
    fn test_saturating_since() {
        let later = Timestamp(5_000);
        assert_eq!(later.saturating_since(Timestamp(2_000)), Duration::from_secs(3));
        assert_eq!(Timestamp(1).saturating_since(later), Duration::ZERO);
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
        assert!(clock.hour_of_day() < 24);
    }
}
