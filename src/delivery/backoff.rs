//! Attempt-bounded exponential backoff used between delivery attempts.

use std::time::Duration;

use rand::{Rng, SeedableRng, rngs::StdRng};

use super::config::{BackoffPolicy, RetryPolicy};

/// Tracks attempts made and produces jittered, non-decreasing delays.
///
/// Each delay is drawn from `[current / 2, current]`, where `current` starts
/// at the policy base and doubles after every failure up to the cap. The draw
/// is floored at the previous delay so successive delays never shrink.
pub struct BackoffState {
    policy: BackoffPolicy,
    max_attempts: u32,
    attempts: u32,
    current: Duration,
    last: Duration,
    rng: StdRng,
}

impl BackoffState {
    /// Create a new state machine from the supplied retry policy.
    pub fn new(policy: &RetryPolicy) -> Self {
        Self::with_rng(policy, StdRng::from_entropy())
    }

    /// Create a state machine with a caller-provided random source.
    pub fn with_rng(policy: &RetryPolicy, rng: StdRng) -> Self {
        Self {
            current: policy.backoff.base,
            policy: policy.backoff.clone(),
            max_attempts: policy.max_attempts.max(1),
            attempts: 0,
            last: Duration::ZERO,
            rng,
        }
    }

    /// Attempts recorded so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Record an attempt about to be made and return its one-based number.
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempts += 1;
        self.attempts
    }

    /// Delay before the next attempt, or `None` once the ceiling is reached.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= self.max_attempts {
            return None;
        }

        let ceiling = self.current.min(self.policy.cap);
        self.current = self.current.saturating_mul(2).min(self.policy.cap);

        let max_ms = ceiling.as_millis().min(u128::from(u64::MAX)) as u64;
        let last_ms = self.last.as_millis().min(u128::from(max_ms)) as u64;
        let min_ms = (max_ms / 2).max(last_ms);
        let sleep_ms = if min_ms >= max_ms {
            max_ms
        } else {
            self.rng.gen_range(min_ms..=max_ms)
        };
        self.last = Duration::from_millis(sleep_ms);
        Some(self.last)
    }
}
