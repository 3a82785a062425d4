//! Wall-clock abstraction.
//!
//! Session expiry is absolute wall-clock time (the scene id also embeds
//! Unix seconds), so the store reads time through [`Clock`] instead of
//! calling `SystemTime::now()` directly. Tests inject a [`ManualClock`]
//! and move it forward by hand.

use std::time::{Duration, SystemTime};

use parking_lot::Mutex;

/// A source of the current time.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> SystemTime;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<SystemTime>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    pub fn new(start: SystemTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }

    /// Jumps the clock to `to`.
    pub fn set(&self, to: SystemTime) {
        *self.now.lock() = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(SystemTime::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use std::time::UNIX_EPOCH;

    use super::*;

    #[test]
    fn test_manual_clock_advance_moves_forward() {
        let start = UNIX_EPOCH + Duration::from_secs(100);
        let clock = ManualClock::new(start);

        clock.advance(Duration::from_secs(5));

        assert_eq!(clock.now(), start + Duration::from_secs(5));
    }

    #[test]
    fn test_manual_clock_set_jumps() {
        let clock = ManualClock::new(UNIX_EPOCH);
        let target = UNIX_EPOCH + Duration::from_secs(42);

        clock.set(target);

        assert_eq!(clock.now(), target);
    }
}
