//! Retry with exponential backoff for branch stock requests.
//!
//! Soft blocks (403/429, challenge pages), network failures and timeouts are
//! retried until the attempt budget runs out. Everything else is returned as
//! soon as it happens.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::FetchError;

/// Attempt budget and delay schedule for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Treated as at least 1.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Add a uniform random component in `[0, delay)` on top of the capped delay.
    pub jitter: bool,
}

impl RetryPolicy {
    /// Deterministic part of the wait after failed attempt `attempt` (1-based):
    /// `base_delay * 2^(attempt - 1)`, capped at `max_delay`.
    #[must_use]
    pub fn base_delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }

    /// Full wait after failed attempt `attempt`, jitter included.
    ///
    /// Jitter is added after capping, so the sleep can reach just under
    /// `2 * max_delay`. That keeps two workers that failed together from
    /// retrying in lockstep even once both have hit the cap.
    pub fn delay_for<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let capped = self.base_delay_for(attempt);
        if !self.jitter || capped.is_zero() {
            return capped;
        }
        let extra_ms = rng.random_range(0..capped.as_millis().max(1));
        capped + Duration::from_millis(u64::try_from(extra_ms).unwrap_or(u64::MAX))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(60),
            jitter: true,
        }
    }
}

/// Executes `operation` until it succeeds, fails permanently, or the policy's
/// attempt budget is spent.
///
/// `operation` receives the 1-based attempt number so callers can rotate
/// headers or rebuild sessions per attempt. There is no sleep before the first
/// attempt.
///
/// # Errors
///
/// - A non-retriable error from `operation` is returned unchanged.
/// - When every attempt fails with a retriable error, returns
///   [`FetchError::ExhaustedRetries`] carrying the attempt count and the last
///   classified error.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        let err = match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !err.is_retriable() {
            return Err(err);
        }
        if attempt >= max_attempts {
            return Err(FetchError::ExhaustedRetries {
                attempts: attempt,
                last: Box::new(err),
            });
        }

        let delay = policy.delay_for(attempt, &mut rand::rng());
        tracing::warn!(
            attempt,
            max_attempts,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "transient fetch error, retrying after backoff"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
