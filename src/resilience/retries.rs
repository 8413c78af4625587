//! Retry policy.
//!
//! # Responsibilities
//! - Decide whether a failed attempt is retried
//! - Compute the delay before the next attempt
//! - Classify upstream status codes as retryable or not
//!
//! # Design Decisions
//! - Immutable value; no per-call state lives here
//! - Connection errors and timeouts always retryable; status codes configurable
//! - Jittered backoff prevents thundering herd

use std::time::Duration;

use crate::resilience::backoff::calculate_backoff;

/// Retry configuration and decisions.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub exponential_factor: f64,
    pub jitter_enabled: bool,
    /// Upstream status codes treated as transient.
    pub retryable_status_codes: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            exponential_factor: 2.0,
            jitter_enabled: true,
            retryable_status_codes: vec![429, 502, 503, 504],
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// True iff `attempt` (0-based) still has retry budget and the failure is retryable.
    pub fn should_retry(&self, attempt: u32, retryable: bool) -> bool {
        retryable && attempt < self.max_retries
    }

    /// Delay to wait after failed attempt `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        calculate_backoff(
            attempt,
            self.base_delay,
            self.max_delay,
            self.exponential_factor,
            self.jitter_enabled,
        )
    }

    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_status_codes.contains(&status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_retry() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(0, true));
        assert!(policy.should_retry(2, true));
        assert!(!policy.should_retry(3, true));
        assert!(!policy.should_retry(0, false));
        assert!(!RetryPolicy::none().should_retry(0, true));
    }

    #[test]
    fn test_delay_for_without_jitter() {
        let policy = RetryPolicy {
            jitter_enabled: false,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delay_for(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(4), Duration::from_secs(8));
        assert_eq!(policy.delay_for(5), Duration::from_secs(10));
        assert_eq!(policy.delay_for(1000), Duration::from_secs(10));
    }

    #[test]
    fn test_retryable_status() {
        let policy = RetryPolicy::default();
        assert!(policy.is_retryable_status(503));
        assert!(policy.is_retryable_status(429));
        assert!(!policy.is_retryable_status(500));
        assert!(!policy.is_retryable_status(404));
    }
}
