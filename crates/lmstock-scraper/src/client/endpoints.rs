//! Absolute URLs of the pages the stock client talks to.

use reqwest::Url;

use crate::error::FetchError;

const PURCHASE_PATH: &str = "/id/purchase/gold";
const CHANGE_LOCATION_PATH: &str = "/do-change-location";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Endpoints {
    /// Product page; carries the CSRF token and the location picker.
    pub(crate) purchase: Url,
    /// Form target that switches the session's branch and returns its stock page.
    pub(crate) change_location: Url,
}

impl Endpoints {
    /// Resolves both endpoints against the site origin of `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidBaseUrl`] if `base_url` is not an absolute
    /// http(s) URL.
    pub(crate) fn new(base_url: &str) -> Result<Self, FetchError> {
        let invalid = |reason: String| FetchError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason,
        };

        let base = Url::parse(base_url.trim()).map_err(|e| invalid(e.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme \"{}\"", base.scheme())));
        }
        if base.host_str().is_none() {
            return Err(invalid("missing host".to_owned()));
        }

        let join = |path: &str| base.join(path).map_err(|e| invalid(e.to_string()));
        Ok(Self {
            purchase: join(PURCHASE_PATH)?,
            change_location: join(CHANGE_LOCATION_PATH)?,
        })
    }

    pub(crate) fn host(&self) -> &str {
        self.purchase.host_str().unwrap_or_default()
    }
}
