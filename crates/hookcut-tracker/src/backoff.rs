//! Poll backoff and failure log limiting.

use std::time::Duration;

/// Shortest delay a [`Backoff`] hands out.
pub const MIN_BACKOFF: Duration = Duration::from_millis(10);

/// Geometric backoff between poll attempts.
///
/// Each call to [`Backoff::next_delay`] returns the current delay and then
/// doubles it, never exceeding the ceiling. Both the initial delay and the
/// ceiling are raised to [`MIN_BACKOFF`], so the sequence always grows.
#[derive(Debug, Clone)]
pub struct Backoff {
    current: Duration,
    ceiling: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, ceiling: Duration) -> Self {
        let ceiling = ceiling.max(MIN_BACKOFF);
        Self {
            current: initial.clamp(MIN_BACKOFF, ceiling),
            ceiling,
        }
    }

    /// Delay to wait before the next attempt.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.ceiling);
        delay
    }

    /// Delay the next call will return, without advancing.
    pub fn peek(&self) -> Duration {
        self.current
    }
}

/// Caps how many consecutive transient failures get a warning.
///
/// The poller clears the streak on every good response.
#[derive(Debug, Default)]
pub struct FailureLog {
    streak: u32,
    limit: u32,
}

impl FailureLog {
    pub fn new(limit: u32) -> Self {
        Self { streak: 0, limit }
    }

    pub fn clear(&mut self) {
        self.streak = 0;
    }

    /// Count a failure; `true` while the streak is still within the limit.
    pub fn note_failure(&mut self) -> bool {
        self.streak = self.streak.saturating_add(1);
        self.streak <= self.limit
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_to_ceiling() {
        let mut backoff = Backoff::new(Duration::from_millis(1000), Duration::from_secs(10));
        let delays: Vec<u128> = (0..7).map(|_| backoff.next_delay().as_millis()).collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 10_000, 10_000, 10_000]);
    }

    #[test]
    fn test_backoff_monotonic_and_bounded() {
        let ceiling = Duration::from_secs(10);
        let mut backoff = Backoff::new(Duration::from_millis(700), ceiling);
        let mut last = Duration::ZERO;
        for _ in 0..50 {
            let delay = backoff.next_delay();
            assert!(delay >= last);
            assert!(delay <= ceiling);
            last = delay;
        }
    }

    #[test]
    fn test_backoff_initial_above_ceiling() {
        let mut backoff = Backoff::new(Duration::from_secs(30), Duration::from_secs(10));
        assert_eq!(backoff.peek(), Duration::from_secs(10));
        assert_eq!(backoff.next_delay(), Duration::from_secs(10));
    }

    #[test]
    fn test_backoff_zero_initial_still_grows() {
        let mut backoff = Backoff::new(Duration::ZERO, Duration::from_secs(10));
        let delays: Vec<u128> = (0..4).map(|_| backoff.next_delay().as_millis()).collect();
        assert_eq!(delays, vec![10, 20, 40, 80]);
    }

    #[test]
    fn test_backoff_zero_ceiling_uses_floor() {
        let mut backoff = Backoff::new(Duration::ZERO, Duration::ZERO);
        assert_eq!(backoff.next_delay(), MIN_BACKOFF);
        assert_eq!(backoff.next_delay(), MIN_BACKOFF);
    }

    #[test]
    fn test_failure_log_limit_and_reset() {
        let mut log = FailureLog::new(3);
        let logged: Vec<bool> = (0..5).map(|_| log.note_failure()).collect();
        assert_eq!(logged, vec![true, true, true, false, false]);
        assert_eq!(log.streak(), 5);

        log.clear();
        assert_eq!(log.streak(), 0);
        assert!(log.note_failure());
    }
}
