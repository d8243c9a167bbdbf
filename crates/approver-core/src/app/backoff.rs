//! Reconnect backoff: linear growth up to a ceiling, never reset.

use std::time::Duration;

/// Backoff parameters for broker reconnects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay before the first reconnect.
    pub initial: Duration,

    /// Added to the delay after every failure.
    pub increment: Duration,

    /// Upper bound; once reached the delay stays there.
    pub ceiling: Duration,
}

impl Default for BackoffPolicy {
    /// 1s, +2s per failure, capped at 30s.
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            increment: Duration::from_secs(2),
            ceiling: Duration::from_secs(30),
        }
    }
}

impl BackoffPolicy {
    /// Delay before the reconnect that follows `failures` earlier failures.
    ///
    /// `min(initial + failures * increment, ceiling)`. With the defaults:
    /// 1s, 3s, 5s, ... 29s, 30s, 30s, ...
    pub fn delay_for(&self, failures: u32) -> Duration {
        self.initial
            .saturating_add(self.increment.saturating_mul(failures))
            .min(self.ceiling)
    }
}

/// Process-lifetime reconnect state.
#[derive(Debug, Clone)]
pub struct RetryState {
    policy: BackoffPolicy,
    failures: u32,
}

impl RetryState {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self { policy, failures: 0 }
    }

    /// Delay to sleep now; advances the state for the next failure.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.policy.delay_for(self.failures);
        self.failures = self.failures.saturating_add(1);
        delay
    }

    /// Delay the next call to `next_delay` would return.
    pub fn current(&self) -> Duration {
        self.policy.delay_for(self.failures)
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 1)]
    #[case(1, 3)]
    #[case(2, 5)]
    #[case(14, 29)]
    #[case(15, 30)]
    #[case(100, 30)]
    #[case(u32::MAX, 30)]
    fn default_delays(#[case] failures: u32, #[case] secs: u64) {
        assert_eq!(BackoffPolicy::default().delay_for(failures), Duration::from_secs(secs));
    }

    #[test]
    fn retry_state_is_non_decreasing_and_holds_at_ceiling() {
        let mut state = RetryState::new(BackoffPolicy::default());
        let delays: Vec<Duration> = (0..40).map(|_| state.next_delay()).collect();

        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(delays[0], Duration::from_secs(1));
        assert_eq!(delays[1], Duration::from_secs(3));
        assert_eq!(*delays.last().unwrap(), Duration::from_secs(30));
        assert_eq!(state.failures(), 40);
        assert_eq!(state.current(), Duration::from_secs(30));
    }

    #[test]
    fn ceiling_below_initial_caps_first_delay() {
        let policy = BackoffPolicy {
            initial: Duration::from_secs(10),
            increment: Duration::from_secs(1),
            ceiling: Duration::from_secs(5),
        };
        assert_eq!(policy.delay_for(0), Duration::from_secs(5));
    }
}
