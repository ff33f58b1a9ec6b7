//! Backoff and wait computation for generation retries

use rand::Rng;
use std::time::Duration;
use wizardpro_config::{
    DEFAULT_INITIAL_BACKOFF_SECS, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_BACKOFF_SECS,
    DEFAULT_RATE_LIMIT_MIN_WAIT_SECS, MAX_RETRY_WAIT_SECS, RetryConfig,
};

use crate::error::CallError;

/// Retry parameters for [`crate::ResilientExecutor`].
///
/// Attempt indices are zero-based. The base delay for attempt `n` is
/// `min(initial_backoff * 2^n, max_backoff)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Floor applied to rate-limit waits when the server gave no hint
    pub rate_limit_min_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: Duration::from_secs_f64(DEFAULT_INITIAL_BACKOFF_SECS),
            max_backoff: Duration::from_secs_f64(DEFAULT_MAX_BACKOFF_SECS),
            rate_limit_min_wait: Duration::from_secs_f64(DEFAULT_RATE_LIMIT_MIN_WAIT_SECS),
        }
    }
}

impl RetryPolicy {
    /// Build a policy from a `[retry]` section.
    ///
    /// Durations are clamped to `0..=MAX_RETRY_WAIT_SECS`; non-finite values
    /// become zero.
    #[must_use]
    pub fn from_config(retry: &RetryConfig) -> Self {
        Self {
            max_attempts: retry.max_attempts().max(1),
            initial_backoff: clamped_secs(retry.initial_backoff_secs()),
            max_backoff: clamped_secs(retry.max_backoff_secs()),
            rate_limit_min_wait: clamped_secs(retry.rate_limit_min_wait_secs()),
        }
    }

    /// Base exponential delay for a zero-based attempt, without jitter
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX).min(62);
        let secs = self.initial_backoff.as_secs_f64() * 2f64.powi(exponent);
        let capped = secs.min(self.max_backoff.as_secs_f64());
        Duration::from_secs_f64(capped).min(self.max_backoff)
    }

    /// Wait before the attempt after `attempt` failed with `error`.
    ///
    /// - rate limited with a hint: the hint plus 0.5..1.5s of jitter
    /// - rate limited without a hint: backoff plus 0..1s jitter, floored at
    ///   `rate_limit_min_wait`
    /// - other retryable failures: backoff plus 0..1s jitter
    #[must_use]
    pub fn wait_for(&self, error: &CallError, attempt: u32) -> Duration {
        let mut rng = rand::rng();
        match error {
            CallError::RateLimited {
                retry_after: Some(hint),
                ..
            } => hint.saturating_add(Duration::from_secs_f64(rng.random_range(0.5..1.5))),
            CallError::RateLimited {
                retry_after: None, ..
            } => {
                let jittered = self.backoff_delay(attempt)
                    + Duration::from_secs_f64(rng.random_range(0.0..1.0));
                jittered.max(self.rate_limit_min_wait)
            }
            _ => self.backoff_delay(attempt) + Duration::from_secs_f64(rng.random_range(0.0..1.0)),
        }
    }
}

fn clamped_secs(secs: f64) -> Duration {
    if secs.is_finite() {
        Duration::from_secs_f64(secs.clamp(0.0, MAX_RETRY_WAIT_SECS))
    } else {
        Duration::ZERO
    }
}
