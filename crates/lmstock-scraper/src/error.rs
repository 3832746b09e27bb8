use std::time::Duration;

use thiserror::Error;

/// Why a response was judged to be a soft block rather than a stock page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    /// HTTP 403.
    Forbidden,
    /// HTTP 429.
    RateLimited,
    /// Anti-bot interstitial; carries the marker that matched.
    Challenge(String),
    /// Interactive CAPTCHA; carries the marker that matched. Never retried.
    Captcha(String),
    /// 2xx with nothing in it.
    EmptyBody,
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockKind::Forbidden => write!(f, "HTTP 403 forbidden"),
            BlockKind::RateLimited => write!(f, "HTTP 429 rate limited"),
            BlockKind::Challenge(marker) => write!(f, "challenge page (matched \"{marker}\")"),
            BlockKind::Captcha(marker) => write!(f, "CAPTCHA page (matched \"{marker}\")"),
            BlockKind::EmptyBody => write!(f, "empty response body"),
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("blocked by {url}: {kind}")]
    Blocked { url: String, kind: BlockKind },

    #[error("network error requesting {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("no response from {url} within {after:?}")]
    Timeout { url: String, after: Duration },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("gave up after {attempts} attempts; last error: {last}")]
    ExhaustedRetries { attempts: u32, last: Box<FetchError> },

    #[error("invalid base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl FetchError {
    /// Returns `true` if the error is a transient condition worth another attempt.
    ///
    /// Blocks (except CAPTCHA), network failures, timeouts, 5xx and 408 are
    /// retried. CAPTCHA pages, other 4xx statuses and setup errors are final.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            FetchError::Blocked { kind, .. } => !matches!(kind, BlockKind::Captcha(_)),
            FetchError::Network { .. } | FetchError::Timeout { .. } => true,
            FetchError::UnexpectedStatus { status, .. } => *status >= 500 || *status == 408,
            FetchError::ExhaustedRetries { .. }
            | FetchError::InvalidBaseUrl { .. }
            | FetchError::Client(_) => false,
        }
    }

    /// The classified error behind an [`FetchError::ExhaustedRetries`], or `self`.
    #[must_use]
    pub fn root(&self) -> &FetchError {
        match self {
            FetchError::ExhaustedRetries { last, .. } => last.root(),
            other => other,
        }
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("blocked or challenge page: {0}")]
    BlockedPage(BlockKind),

    #[error("malformed document: {0}")]
    MalformedDocument(String),

    #[error("unrecognized page layout: no stock entries found")]
    UnrecognizedLayout,
}

/// Failure to turn one branch query into records.
#[derive(Debug, Error)]
pub enum StockError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl StockError {
    /// Short machine-friendly label used in logs and export files.
    ///
    /// A failure that used up the retry budget is labelled
    /// `exhausted_retries:<last failure>`, so an exhausted run of blocks reads
    /// differently from a single CAPTCHA block.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            StockError::Fetch(FetchError::ExhaustedRetries { last, .. }) => match last.root() {
                FetchError::Blocked { .. } => "exhausted_retries:blocked",
                FetchError::Network { .. } => "exhausted_retries:network_error",
                FetchError::Timeout { .. } => "exhausted_retries:timeout",
                FetchError::UnexpectedStatus { .. } => "exhausted_retries:unexpected_status",
                FetchError::InvalidBaseUrl { .. } | FetchError::Client(_) => {
                    "exhausted_retries:client_setup"
                }
                FetchError::ExhaustedRetries { .. } => "exhausted_retries",
            },
            StockError::Fetch(e) => fetch_kind(e),
            StockError::Parse(ParseError::BlockedPage(_)) => "blocked_page",
            StockError::Parse(ParseError::MalformedDocument(_)) => "malformed_document",
            StockError::Parse(ParseError::UnrecognizedLayout) => "unrecognized_layout",
        }
    }
}

fn fetch_kind(error: &FetchError) -> &'static str {
    match error {
        FetchError::Blocked { .. } => "blocked",
        FetchError::Network { .. } => "network_error",
        FetchError::Timeout { .. } => "timeout",
        FetchError::UnexpectedStatus { .. } => "unexpected_status",
        FetchError::InvalidBaseUrl { .. } | FetchError::Client(_) => "client_setup",
        FetchError::ExhaustedRetries { .. } => "exhausted_retries",
    }
}
