//! HTTP client that fetches a branch's stock page from Logam Mulia.

mod attempt;
mod endpoints;
mod session;

use std::sync::Arc;
use std::time::Duration;

use lmstock_core::{AppConfig, AvailabilityRecord, Branch, HeaderRotation, StockQuery};
use reqwest::{RequestBuilder, StatusCode};
use tokio::sync::Mutex;

use crate::error::{BlockKind, FetchError, StockError};
use crate::headers::HeaderRotator;
use crate::locations::parse_location_options;
use crate::pacing::RequestPacer;
use crate::parse::StockParser;
use crate::retry::{retry_with_backoff, RetryPolicy};

pub use attempt::{AttemptOutcome, FetchAttempt};
use endpoints::Endpoints;
use session::{build_http_client, Session};

/// Transport and retry settings for [`StockClient`].
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub base_url: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub retry: RetryPolicy,
    pub header_rotation: HeaderRotation,
    /// Visit the purchase page before the first attempt of each session.
    pub warm_up: bool,
}

impl FetchSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            request_timeout: config.request_timeout(),
            connect_timeout: Duration::from_secs(10),
            retry: RetryPolicy {
                max_attempts: config.max_attempts,
                base_delay: Duration::from_millis(config.retry_base_delay_ms),
                max_delay: Duration::from_millis(config.retry_max_delay_ms),
                jitter: config.retry_jitter,
            },
            header_rotation: config.header_rotation,
            warm_up: true,
        }
    }
}

/// Fetches stock pages for one branch at a time.
///
/// Each query gets its own cookie session. Blocks (403/429, challenge pages),
/// network errors, timeouts and 5xx are retried with exponential backoff.
/// After a block the session is discarded and the next one opens with a new
/// header profile; otherwise every attempt reuses the session's profile.
/// Every outbound request goes through the shared [`RequestPacer`].
pub struct StockClient {
    settings: FetchSettings,
    endpoints: Endpoints,
    parser: StockParser,
    rotator: HeaderRotator,
    pacer: Arc<RequestPacer>,
}

impl StockClient {
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidBaseUrl`] if `settings.base_url` is not an
    /// absolute http(s) URL.
    pub fn new(
        settings: FetchSettings,
        parser: StockParser,
        pacer: Arc<RequestPacer>,
    ) -> Result<Self, FetchError> {
        let endpoints = Endpoints::new(&settings.base_url)?;
        let rotator = HeaderRotator::new(settings.header_rotation);
        Ok(Self {
            settings,
            endpoints,
            parser,
            rotator,
            pacer,
        })
    }

    #[must_use]
    pub fn parser(&self) -> &StockParser {
        &self.parser
    }

    #[must_use]
    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    /// Fetches and parses the stock page for `query`.
    ///
    /// # Errors
    ///
    /// Returns [`StockError::Fetch`] when the page could not be retrieved and
    /// [`StockError::Parse`] when it was retrieved but could not be read.
    pub async fn check(&self, query: &StockQuery) -> Result<Vec<AvailabilityRecord>, StockError> {
        let body = self.fetch_stock_page(query).await?;
        let records = self.parser.parse(&body, query)?;
        tracing::debug!(
            branch = %query.branch.code,
            records = records.len(),
            "parsed stock page"
        );
        Ok(records)
    }

    /// Returns the raw stock page body for `query` once an attempt succeeds.
    ///
    /// # Errors
    ///
    /// - [`FetchError::ExhaustedRetries`] when every attempt hit a retriable
    ///   failure.
    /// - [`FetchError::Blocked`] with [`BlockKind::Captcha`] as soon as a
    ///   CAPTCHA is served.
    /// - [`FetchError::UnexpectedStatus`] for non-retriable statuses.
    pub async fn fetch_stock_page(&self, query: &StockQuery) -> Result<String, FetchError> {
        let session: Mutex<Option<Session>> = Mutex::new(None);
        let session = &session;

        retry_with_backoff(&self.settings.retry, |attempt| async move {
            let mut slot = session.lock().await;
            let current = match slot.take() {
                Some(existing) => existing,
                None => {
                    let profile = *self.rotator.select(attempt);
                    Session::open(&self.settings, &self.endpoints, profile, &self.pacer).await?
                }
            };

            let result = self.post_change_location(&current, query).await;
            FetchAttempt {
                query,
                number: attempt,
                outcome: AttemptOutcome::from_result(&result),
            }
            .log(current.profile.name);

            if !matches!(result, Err(FetchError::Blocked { .. })) {
                *slot = Some(current);
            }
            result
        })
        .await
    }

    /// Reads the branch list from the live purchase page's location picker.
    ///
    /// # Errors
    ///
    /// Returns [`StockError::Fetch`] if the page cannot be retrieved and
    /// [`StockError::Parse`] if it has no location picker.
    pub async fn discover_branches(&self) -> Result<Vec<Branch>, StockError> {
        let body = self.fetch_purchase_page().await?;
        Ok(parse_location_options(&body)?)
    }

    /// # Errors
    ///
    /// Same classification and retry behaviour as [`Self::fetch_stock_page`].
    pub async fn fetch_purchase_page(&self) -> Result<String, FetchError> {
        retry_with_backoff(&self.settings.retry, |attempt| async move {
            let client = build_http_client(&self.settings)?;
            let profile = self.rotator.select(attempt);
            let url = self.endpoints.purchase.as_str();
            self.pacer.wait().await;
            self.send(url, profile.apply(client.get(url))).await
        })
        .await
    }

    /// Posts the branch selection with the session's own header profile; the
    /// site ties its cookies to the browser that received them.
    async fn post_change_location(
        &self,
        session: &Session,
        query: &StockQuery,
    ) -> Result<String, FetchError> {
        let url = self.endpoints.change_location.as_str();

        let mut form: Vec<(&str, String)> = vec![("location", query.branch.code.clone())];
        if let Some(token) = &session.csrf_token {
            form.push(("_token", token.clone()));
        }
        if let Some(weight) = query.weight {
            form.push(("weight", format_weight(weight)));
        }

        self.pacer.wait().await;
        let request = session
            .profile
            .apply(session.client.post(url))
            .header(reqwest::header::ORIGIN, self.endpoints.purchase.origin().ascii_serialization())
            .form(&form);
        self.send(url, request).await
    }

    async fn send(&self, url: &str, request: RequestBuilder) -> Result<String, FetchError> {
        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(url, e))?;
        let status = response.status();

        let body = if status.is_success() {
            response
                .text()
                .await
                .map_err(|e| self.transport_error(url, e))?
        } else {
            response.text().await.unwrap_or_default()
        };
        self.classify_response(url, status, body)
    }

    fn classify_response(
        &self,
        url: &str,
        status: StatusCode,
        body: String,
    ) -> Result<String, FetchError> {
        if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
            let kind = match self.parser.detect_block(&body) {
                Some(captcha @ BlockKind::Captcha(_)) => captcha,
                _ if status == StatusCode::FORBIDDEN => BlockKind::Forbidden,
                _ => BlockKind::RateLimited,
            };
            return Err(FetchError::Blocked {
                url: url.to_owned(),
                kind,
            });
        }

        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        if let Some(kind) = self.parser.detect_block(&body) {
            return Err(FetchError::Blocked {
                url: url.to_owned(),
                kind,
            });
        }
        Ok(body)
    }

    fn transport_error(&self, url: &str, source: reqwest::Error) -> FetchError {
        if source.is_timeout() {
            FetchError::Timeout {
                url: url.to_owned(),
                after: self.settings.request_timeout,
            }
        } else {
            FetchError::Network {
                url: url.to_owned(),
                source,
            }
        }
    }
}

/// Form value for a bar weight: `5` rather than `5.0`, `0.5` as is.
fn format_weight(weight: f64) -> String {
    if weight.fract().abs() < f64::EPSILON {
        format!("{weight:.0}")
    } else {
        weight.to_string()
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
