//! Reconnection backoff schedule.

use std::time::Duration;

/// Exponential backoff with a delay cap and an attempt budget.
///
/// Attempt `n` (zero-based) waits `base_delay * 2^n`, clamped to `max_delay`.
/// Once `max_attempts` delays have been handed out the schedule is exhausted
/// and the client gives up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(32),
            max_attempts: 5,
        }
    }
}

impl ReconnectPolicy {
    /// The delay before the given reconnect attempt, or `None` when the
    /// attempt budget is spent.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let delay = self
            .base_delay
            .checked_mul(2u32.saturating_pow(attempt))
            .unwrap_or(self.max_delay);
        Some(delay.min(self.max_delay))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_doubles_each_attempt() {
        let policy = ReconnectPolicy::default();

        let delays: Vec<_> = (0..5).map(|n| policy.delay_for(n)).collect();

        assert_eq!(
            delays,
            vec![
                Some(Duration::from_secs(1)),
                Some(Duration::from_secs(2)),
                Some(Duration::from_secs(4)),
                Some(Duration::from_secs(8)),
                Some(Duration::from_secs(16)),
            ]
        );
    }

    #[test]
    fn test_exhausted_budget_yields_none() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_for(5), None);
        assert_eq!(policy.delay_for(100), None);
    }

    #[test]
    fn test_delay_is_capped_at_max() {
        let policy = ReconnectPolicy {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(32),
            max_attempts: 10,
        };

        assert_eq!(policy.delay_for(5), Some(Duration::from_secs(32)));
        assert_eq!(policy.delay_for(9), Some(Duration::from_secs(32)));
    }

    #[test]
    fn test_huge_attempt_does_not_overflow() {
        let policy = ReconnectPolicy {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(32),
            max_attempts: u32::MAX,
        };

        assert_eq!(policy.delay_for(64), Some(Duration::from_secs(32)));
    }
}
