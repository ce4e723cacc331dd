//! # Fibonacci Backoff
//!
//! Retry delays for Builds whose convergence pass hit a transient failure.
//! Delays grow along the Fibonacci sequence in whole minutes and stop at a
//! ceiling, so a backend outage does not turn into a retry storm while short
//! blips still recover within a minute.
//!
//! ```rust
//! use build_controller::controller::backoff::FibonacciBackoff;
//!
//! let mut backoff = FibonacciBackoff::new(1, 10);
//! let delays: Vec<u64> = (0..8).map(|_| backoff.next_backoff_seconds()).collect();
//! assert_eq!(delays, vec![60, 60, 120, 180, 300, 480, 600, 600]);
//! ```

use std::time::Duration;

/// Per-resource Fibonacci delay sequence, in minutes
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    floor_minutes: u64,
    ceiling_minutes: u64,
    previous: u64,
    current: u64,
}

impl FibonacciBackoff {
    /// Sequence starting at `min_minutes` and capped at `max_minutes`
    #[must_use]
    pub fn new(min_minutes: u64, max_minutes: u64) -> Self {
        let floor_minutes = min_minutes.max(1);
        Self {
            floor_minutes,
            ceiling_minutes: max_minutes.max(floor_minutes),
            previous: 0,
            current: floor_minutes,
        }
    }

    /// Current delay in seconds; advances the sequence
    pub fn next_backoff_seconds(&mut self) -> u64 {
        let delay = self.current;
        let next = self.previous.saturating_add(self.current);
        self.previous = self.current;
        self.current = next.min(self.ceiling_minutes);
        delay * 60
    }

    #[must_use]
    pub fn next_backoff(&mut self) -> Duration {
        Duration::from_secs(self.next_backoff_seconds())
    }

    /// Start over after a clean pass
    pub fn reset(&mut self) {
        self.previous = 0;
        self.current = self.floor_minutes;
    }
}

impl Default for FibonacciBackoff {
    fn default() -> Self {
        Self::new(
            crate::constants::DEFAULT_BACKOFF_MIN_MINUTES,
            crate::constants::DEFAULT_BACKOFF_MAX_MINUTES,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_capped() {
        let mut backoff = FibonacciBackoff::new(1, 10);
        let delays: Vec<u64> = (0..9).map(|_| backoff.next_backoff_seconds()).collect();
        assert_eq!(delays, vec![60, 60, 120, 180, 300, 480, 600, 600, 600]);
    }

    #[test]
    fn test_reset_restarts_sequence() {
        let mut backoff = FibonacciBackoff::new(1, 10);
        for _ in 0..4 {
            backoff.next_backoff_seconds();
        }
        backoff.reset();
        assert_eq!(backoff.next_backoff(), Duration::from_secs(60));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(60));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(120));
    }

    #[test]
    fn test_independent_sequences() {
        let mut first = FibonacciBackoff::default();
        let mut second = FibonacciBackoff::default();
        first.next_backoff_seconds();
        first.next_backoff_seconds();
        first.next_backoff_seconds();
        assert_eq!(second.next_backoff_seconds(), 60);
        assert_eq!(first.next_backoff_seconds(), 180);
    }

    #[test]
    fn test_zero_floor_is_raised() {
        let mut backoff = FibonacciBackoff::new(0, 0);
        assert_eq!(backoff.next_backoff_seconds(), 60);
        assert_eq!(backoff.next_backoff_seconds(), 60);
    }
}
