//! Server time seam
//!
//! Registration stamps, nonce freshness and ledger expiry all read the wall
//! clock through this trait so tests can pin or shift time. Registration
//! rows are stored at millisecond resolution; the nonce machinery works in
//! whole seconds, and its freshness predicate lives here so every caller
//! applies the same window arithmetic.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub trait Clock: Send + Sync {
    /// Milliseconds since Unix epoch (registration-row resolution).
    fn now_ms(&self) -> u64;

    /// Whole seconds since Unix epoch (nonce-token resolution).
    fn now_secs(&self) -> u64 {
        self.now_ms() / 1000
    }

    /// Whether `stamped_secs` lies within `window` of the current time, in
    /// either direction. The symmetric bound also rejects future-dated
    /// stamps, which would otherwise never age out of the nonce ledger.
    fn within_window(&self, stamped_secs: u64, window: Duration) -> bool {
        self.now_secs().abs_diff(stamped_secs) <= window.as_secs()
    }
}

/// Wall clock used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        // A pre-epoch system clock reads as 0: every nonce is then stale
        // and rejected, which is the safe failure mode for replay defense.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or_default()
    }
}

/// Test clock pinned to a fixed instant, movable with [`MockClock::advance`].
#[derive(Debug, Clone, Copy)]
pub struct MockClock {
    pub time_ms: u64,
}

impl MockClock {
    pub fn new(time_ms: u64) -> Self {
        Self { time_ms }
    }

    /// Pin the clock at a whole-second instant.
    pub fn at_secs(secs: u64) -> Self {
        Self { time_ms: secs * 1000 }
    }

    /// Move the clock forward.
    pub fn advance(&mut self, by: Duration) {
        self.time_ms += by.as_millis() as u64;
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.time_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_past_2025() {
        assert!(SystemClock.now_ms() > 1_735_689_600_000);
    }

    #[test]
    fn mock_clock_pins_and_advances() {
        let mut clock = MockClock::at_secs(12);
        assert_eq!(clock.now_ms(), 12_000);
        assert_eq!(clock.now_secs(), 12);

        clock.advance(Duration::from_secs(3));
        assert_eq!(clock.now_secs(), 15);
    }

    #[test]
    fn window_is_symmetric_and_inclusive() {
        let clock = MockClock::at_secs(1_000);
        let window = Duration::from_secs(60);

        assert!(clock.within_window(1_000, window));
        assert!(clock.within_window(940, window));
        assert!(clock.within_window(1_060, window));
        assert!(!clock.within_window(939, window));
        assert!(!clock.within_window(1_061, window));
    }
}
