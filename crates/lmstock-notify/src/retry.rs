//! Retry with exponential back-off and jitter for Bot API calls.
//!
//! Network failures, 5xx responses and Telegram's 429 are retried. API-level
//! rejections (bad chat id, malformed Markdown) are returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::NotifyError;

const MAX_DELAY_MS: u64 = 60_000;

/// Returns `true` for errors that are worth retrying after a back-off delay.
pub(crate) fn is_retriable(err: &NotifyError) -> bool {
    match err {
        NotifyError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        NotifyError::RateLimited { .. } => true,
        NotifyError::Api { error_code, .. } => error_code.is_some_and(|c| c >= 500),
        NotifyError::Deserialize { .. } | NotifyError::InvalidBaseUrl(_) => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// The wait before retry `n` is `backoff_base_ms * 2^(n-1)` with ±25 % jitter,
/// capped at 60 s. A 429 waits for Telegram's `retry_after` instead.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, NotifyError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, NotifyError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = match &err {
                    NotifyError::RateLimited { retry_after_secs } => {
                        retry_after_secs.saturating_mul(1000).min(MAX_DELAY_MS)
                    }
                    _ => {
                        let computed =
                            backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                        let capped = computed.min(MAX_DELAY_MS);
                        (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64
                    }
                };
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "Telegram transient error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
