//! Cookie-carrying browsing session used for one query's attempts.

use reqwest::Client;

use super::endpoints::Endpoints;
use super::FetchSettings;
use crate::error::FetchError;
use crate::headers::HeaderProfile;
use crate::pacing::RequestPacer;
use crate::parse::extract_csrf_token;

/// A fresh cookie jar, the CSRF token the site issued to it, and the header
/// profile that earned both. Every request on the session sends that profile.
///
/// Dropped and rebuilt after a blocked attempt so the next one does not carry
/// the flagged cookies.
pub(crate) struct Session {
    pub(crate) client: Client,
    pub(crate) csrf_token: Option<String>,
    pub(crate) profile: HeaderProfile,
}

impl Session {
    /// Builds the client and, if enabled, visits the purchase page once to
    /// collect cookies and the CSRF token. A failed warm-up is logged and the
    /// session is used without a token.
    pub(crate) async fn open(
        settings: &FetchSettings,
        endpoints: &Endpoints,
        profile: HeaderProfile,
        pacer: &RequestPacer,
    ) -> Result<Self, FetchError> {
        let client = build_http_client(settings)?;
        if !settings.warm_up {
            return Ok(Self {
                client,
                csrf_token: None,
                profile,
            });
        }

        pacer.wait().await;
        let csrf_token = match warm_up(&client, endpoints, &profile).await {
            Ok(token) => token,
            Err(err) => {
                tracing::debug!(
                    url = %endpoints.purchase,
                    error = %err,
                    "session warm-up failed; continuing without CSRF token"
                );
                None
            }
        };
        tracing::debug!(
            host = endpoints.host(),
            profile = profile.name,
            has_token = csrf_token.is_some(),
            "opened browsing session"
        );
        Ok(Self {
            client,
            csrf_token,
            profile,
        })
    }
}

pub(crate) fn build_http_client(settings: &FetchSettings) -> Result<Client, FetchError> {
    Client::builder()
        .cookie_store(true)
        .timeout(settings.request_timeout)
        .connect_timeout(settings.connect_timeout)
        .build()
        .map_err(FetchError::Client)
}

async fn warm_up(
    client: &Client,
    endpoints: &Endpoints,
    profile: &HeaderProfile,
) -> Result<Option<String>, reqwest::Error> {
    let response = profile
        .apply(client.get(endpoints.purchase.clone()))
        .send()
        .await?;
    if !response.status().is_success() {
        return Ok(None);
    }
    let body = response.text().await?;
    Ok(extract_csrf_token(&body))
}
