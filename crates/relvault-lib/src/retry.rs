use rand::Rng;
use std::time::Duration;

/// Backoff schedule shared by every retried network operation.
///
/// Attempt `n` (zero-based) sleeps `base_delay * 2^n`, capped at `max_delay`,
/// plus uniform jitter of up to half the computed delay so parallel retries
/// against the same host don't synchronize.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
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

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay,
        }
    }

    /// Delay to sleep before retrying after the given zero-based attempt.
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let exponent = u32::try_from(attempt).unwrap_or(u32::MAX);
        let backoff = self
            .base_delay
            .checked_mul(2u32.saturating_pow(exponent))
            .unwrap_or(self.max_delay)
            .min(self.max_delay);

        let jitter_ceiling = backoff.as_millis() as u64 / 2;
        let jitter = if jitter_ceiling == 0 {
            0
        } else {
            rand::rng().random_range(0..=jitter_ceiling)
        };

        backoff + Duration::from_millis(jitter)
    }
}
