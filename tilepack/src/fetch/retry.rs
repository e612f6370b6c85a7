//! Retry policy for tile fetching.
//!
//! Transient fetch failures are retried with exponential backoff and a
//! multiplicative random jitter. The jitter desynchronizes concurrently
//! failing workers so their retries do not land on the service in lockstep.

use std::time::Duration;

use rand::Rng;

/// Default initial delay after the first failure (500ms).
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 500;

/// Default maximum base delay (30 seconds).
pub const DEFAULT_MAX_DELAY_SECS: u64 = 30;

/// Default multiplier applied to the delay after each failure.
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Default jitter factor range, sampled uniformly from `[1.0, 1.7)`.
pub const DEFAULT_JITTER_RANGE: (f64, f64) = (1.0, 1.7);

/// How tile fetches handle transient failures.
///
/// The base delay for retry `k` is `initial_delay * multiplier^(k-1)`,
/// capped at `max_delay`. A jitter factor drawn from `jitter` is applied
/// *after* the cap, so the effective delay can exceed `max_delay` by up to
/// the upper jitter bound.
///
/// With `max_attempts: None` (the default) a fetch retries indefinitely and
/// never surfaces a failure; a permanently failing tile then occupies its
/// worker slot for the rest of the run. Setting `max_attempts` bounds the
/// loop at the cost of turning an unreachable tile into a fatal build
/// error.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Delay after the first failure.
    pub initial_delay: Duration,
    /// Multiplier applied to the base delay after each failure.
    pub multiplier: f64,
    /// Cap on the base delay (applied before jitter).
    pub max_delay: Duration,
    /// Half-open jitter factor range `[low, high)`.
    pub jitter: (f64, f64),
    /// Maximum number of attempts including the initial one, or `None`
    /// to retry forever.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            max_delay: Duration::from_secs(DEFAULT_MAX_DELAY_SECS),
            jitter: DEFAULT_JITTER_RANGE,
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    /// Creates the default unbounded policy (retry forever).
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Creates the default policy with an attempt cap.
    ///
    /// `max_attempts` counts the initial attempt, so a value of 1 means
    /// no retries at all.
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: Some(max_attempts.max(1)),
            ..Self::default()
        }
    }

    /// Deterministic base delay for the given retry (1-based), before
    /// jitter. Monotonically non-decreasing and capped at `max_delay`.
    pub fn base_delay(&self, retry: u32) -> Duration {
        let factor = self.multiplier.powi(retry.saturating_sub(1) as i32);
        let delay_ms = self.initial_delay.as_millis() as f64 * factor;
        let capped_ms = delay_ms.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped_ms as u64)
    }

    /// Jittered delay before the given retry (1-based), or `None` when
    /// the attempt cap is exhausted.
    pub fn delay_for_retry(&self, retry: u32) -> Option<Duration> {
        if let Some(max) = self.max_attempts {
            if retry >= max {
                return None;
            }
        }
        Some(self.base_delay(retry).mul_f64(self.jitter_factor()))
    }

    fn jitter_factor(&self) -> f64 {
        let (low, high) = self.jitter;
        if high > low {
            rand::thread_rng().gen_range(low..high)
        } else {
            low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_delay_sequence() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.base_delay(1), Duration::from_millis(500));
        assert_eq!(policy.base_delay(2), Duration::from_secs(1));
        assert_eq!(policy.base_delay(3), Duration::from_secs(2));
        assert_eq!(policy.base_delay(4), Duration::from_secs(4));
        assert_eq!(policy.base_delay(5), Duration::from_secs(8));
        assert_eq!(policy.base_delay(6), Duration::from_secs(16));
    }

    #[test]
    fn test_base_delay_monotonic_and_capped() {
        let policy = RetryPolicy::default();

        let mut previous = Duration::ZERO;
        for retry in 1..=20 {
            let delay = policy.base_delay(retry);
            assert!(delay >= previous, "delay must not decrease before the cap");
            assert!(delay <= policy.max_delay, "base delay must respect the cap");
            previous = delay;
        }
        assert_eq!(policy.base_delay(20), policy.max_delay);
    }

    #[test]
    fn test_jittered_delay_within_bounds() {
        let policy = RetryPolicy::default();

        // Jitter is random; sample repeatedly and check the envelope.
        for _ in 0..200 {
            let delay = policy.delay_for_retry(10).expect("unbounded policy");
            let base = policy.base_delay(10);
            assert!(delay >= base, "jitter factor must be at least 1.0");
            assert!(
                delay < base.mul_f64(policy.jitter.1),
                "jittered delay must stay below cap x {}",
                policy.jitter.1
            );
        }
    }

    #[test]
    fn test_unbounded_policy_always_allows_retry() {
        let policy = RetryPolicy::unbounded();
        assert!(policy.delay_for_retry(1).is_some());
        assert!(policy.delay_for_retry(10_000).is_some());
    }

    #[test]
    fn test_attempt_cap_exhausts() {
        let policy = RetryPolicy::with_max_attempts(3);

        assert!(policy.delay_for_retry(1).is_some());
        assert!(policy.delay_for_retry(2).is_some());
        assert!(policy.delay_for_retry(3).is_none());
    }

    #[test]
    fn test_single_attempt_means_no_retries() {
        let policy = RetryPolicy::with_max_attempts(1);
        assert!(policy.delay_for_retry(1).is_none());
    }

    #[test]
    fn test_degenerate_jitter_range_is_constant() {
        let policy = RetryPolicy {
            jitter: (1.0, 1.0),
            ..RetryPolicy::default()
        };
        assert_eq!(
            policy.delay_for_retry(2),
            Some(policy.base_delay(2)),
            "empty jitter range must fall back to the lower bound"
        );
    }
}
