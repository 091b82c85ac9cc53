//! Bounded retry with exponential backoff for rate-limited calls.

use std::time::Duration;

/// How often, and how patiently, a single rate-limited removal is retried.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. At least 1.
    pub max_attempts: u32,
    /// Delay after the first failed attempt; doubles on each further failure.
    pub base_delay: Duration,
    /// Cap on any single delay, including server-provided hints.
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Whether another attempt is allowed after `attempts_made` attempts.
    pub fn allows_another(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts.max(1)
    }

    /// Delay before the next attempt, after `attempts_made` failed attempts.
    ///
    /// A server hint is honoured when it is longer than the computed backoff;
    /// either way the result never exceeds `max_delay`.
    pub fn delay_after(&self, attempts_made: u32, hint: Option<Duration>) -> Duration {
        let exponent = attempts_made.saturating_sub(1).min(16);
        let backoff = self.base_delay.saturating_mul(1u32 << exponent);
        hint.map_or(backoff, |h| h.max(backoff)).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}
