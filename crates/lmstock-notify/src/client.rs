//! HTTP client for the Telegram Bot API.
//!
//! Wraps `reqwest` with Bot API envelope handling: every call checks the
//! `"ok"` field and surfaces rejections as [`NotifyError::Api`].

use std::time::Duration;

use lmstock_core::TelegramCredentials;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::NotifyError;
use crate::format::{
    format_error_notification, format_stock_alert, format_summary_report, AlertItem, RunSummary,
};
use crate::retry::retry_with_backoff;
use crate::types::{ApiResponse, BotUser, SendMessageRequest, SentMessage};

const DEFAULT_BASE_URL: &str = "https://api.telegram.org/";

/// Client for one bot posting into one chat.
///
/// Use [`TelegramNotifier::new`] for production or
/// [`TelegramNotifier::with_base_url`] to point at a mock server in tests.
pub struct TelegramNotifier {
    client: Client,
    base_url: Url,
    bot_token: String,
    chat_id: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("base_url", &self.base_url.as_str())
            .field("bot_token", &"[redacted]")
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}

impl TelegramNotifier {
    /// # Errors
    ///
    /// Returns [`NotifyError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(credentials: &TelegramCredentials, timeout_secs: u64) -> Result<Self, NotifyError> {
        Self::with_base_url(credentials, timeout_secs, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`NotifyError::Http`] if the client cannot be constructed, or
    /// [`NotifyError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        credentials: &TelegramCredentials,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("lmstock/0.1 (stock-alerts)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url =
            Url::parse(&normalised).map_err(|_| NotifyError::InvalidBaseUrl(base_url.to_owned()))?;

        Ok(Self {
            client,
            base_url,
            bot_token: credentials.bot_token.clone(),
            chat_id: credentials.chat_id.clone(),
            max_retries: 2,
            backoff_base_ms: 1_000,
        })
    }

    /// Overrides the retry budget for transient failures.
    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Calls `getMe` and returns the bot's username (or first name when the
    /// bot has no username).
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] when the token is rejected or the API is unreachable.
    pub async fn check_connection(&self) -> Result<String, NotifyError> {
        let bot: BotUser = self.call("getMe", None::<&()>).await?;
        let name = bot.username.unwrap_or(bot.first_name);
        tracing::info!(bot = %name, "connected to Telegram bot");
        Ok(name)
    }

    /// Sends `text` to the configured chat with Markdown parsing and link
    /// previews disabled.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Api`] if Telegram rejects the message.
    pub async fn send_message(&self, text: &str) -> Result<i64, NotifyError> {
        let request = SendMessageRequest {
            chat_id: &self.chat_id,
            text,
            parse_mode: "Markdown",
            disable_web_page_preview: true,
        };
        let sent: SentMessage = self.call("sendMessage", Some(&request)).await?;
        tracing::debug!(message_id = sent.message_id, "Telegram message sent");
        Ok(sent.message_id)
    }

    /// Sends a grouped stock alert. Returns `false` without calling the API
    /// when `items` is empty.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::send_message`] failures.
    pub async fn send_stock_alert(&self, items: &[AlertItem]) -> Result<bool, NotifyError> {
        let Some(message) = format_stock_alert(items, &now_timestamp()) else {
            tracing::debug!("no purchasable items; stock alert suppressed");
            return Ok(false);
        };
        tracing::info!(items = items.len(), "sending Telegram stock alert");
        self.send_message(&message).await?;
        Ok(true)
    }

    /// # Errors
    ///
    /// Propagates [`Self::send_message`] failures.
    pub async fn send_error_notification(
        &self,
        message: &str,
        context: &str,
    ) -> Result<(), NotifyError> {
        let text = format_error_notification(message, context, &now_timestamp());
        self.send_message(&text).await.map(|_| ())
    }

    /// Sends the run summary. Returns `false` without calling the API when
    /// nothing was available.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::send_message`] failures.
    pub async fn send_summary_report(&self, summary: &RunSummary) -> Result<bool, NotifyError> {
        let Some(text) = format_summary_report(summary, &now_timestamp()) else {
            return Ok(false);
        };
        self.send_message(&text).await?;
        Ok(true)
    }

    /// `<base>/bot<token>/<method>`. The token is a path segment, so it is
    /// percent-encoded by `Url`.
    fn method_url(&self, method: &str) -> Result<Url, NotifyError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| NotifyError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push(&format!("bot{}", self.bot_token))
            .push(method);
        Ok(url)
    }

    /// POSTs `payload` (or an empty body) to `method` with retry, then unwraps
    /// the `{"ok": ..., "result": ...}` envelope.
    async fn call<T, P>(&self, method: &str, payload: Option<&P>) -> Result<T, NotifyError>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let url = self.method_url(method)?;
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move {
                let mut request = self.client.post(url);
                if let Some(body) = payload {
                    request = request.json(body);
                }
                let response = request.send().await?;
                let status = response.status();
                let text = response.text().await?;
                Self::unwrap_envelope(method, status, &text)
            }
        })
        .await
    }

    fn unwrap_envelope<T: DeserializeOwned>(
        method: &str,
        status: StatusCode,
        body: &str,
    ) -> Result<T, NotifyError> {
        let envelope: ApiResponse<T> = match serde_json::from_str(body) {
            Ok(envelope) => envelope,
            // Proxies in front of the Bot API answer 5xx with HTML; keep those retriable.
            Err(_) if status.is_server_error() => {
                return Err(NotifyError::Api {
                    method: method.to_owned(),
                    error_code: Some(i64::from(status.as_u16())),
                    description: format!("HTTP {status}"),
                });
            }
            Err(e) => {
                return Err(NotifyError::Deserialize {
                    context: format!("{method} (HTTP {status})"),
                    source: e,
                });
            }
        };

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = envelope
                .parameters
                .and_then(|p| p.retry_after)
                .unwrap_or(5);
            return Err(NotifyError::RateLimited { retry_after_secs });
        }

        match (envelope.ok, envelope.result) {
            (true, Some(result)) => Ok(result),
            (true, None) => Err(NotifyError::Api {
                method: method.to_owned(),
                error_code: None,
                description: "response had ok=true but no result".to_owned(),
            }),
            (false, _) => Err(NotifyError::Api {
                method: method.to_owned(),
                error_code: envelope.error_code,
                description: envelope
                    .description
                    .unwrap_or_else(|| "unknown error".to_owned()),
            }),
        }
    }
}

fn now_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
