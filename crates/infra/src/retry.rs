use std::time::Duration;

/// Bounded retry budget for the ledger's optimistic write cycle.
///
/// `max_attempts` counts whole read-decide-write cycles, including the first.
/// Between attempts the engine sleeps for an exponentially growing delay,
/// capped at `max_delay`. A zero `base_delay` disables sleeping entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: max_delay.max(base_delay),
        }
    }

    /// Retry immediately, with no sleeping.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO, Duration::ZERO)
    }

    /// Delay to wait after the `attempt`-th failed cycle (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        let exp = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(exp).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_millis(5), Duration::from_millis(100))
    }
}
