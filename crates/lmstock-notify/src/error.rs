use thiserror::Error;

/// Errors returned by the Telegram Bot API client.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The Bot API answered `"ok": false`.
    #[error("Telegram {method} failed (error_code {error_code:?}): {description}")]
    Api {
        method: String,
        error_code: Option<i64>,
        description: String,
    },

    /// HTTP 429 from the Bot API; `retry_after_secs` comes from `parameters.retry_after`.
    #[error("Telegram rate limit hit, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid Telegram API base URL '{0}'")]
    InvalidBaseUrl(String),
}
