//! Fetching and parsing Logam Mulia branch stock pages.

pub mod client;
pub mod detect;
pub mod error;
pub mod headers;
pub mod locations;
pub mod pacing;
pub mod parse;
mod parse_helpers;
pub mod retry;

pub use client::{AttemptOutcome, FetchAttempt, FetchSettings, StockClient};
pub use detect::{BlockDetector, SignatureDetector};
pub use error::{BlockKind, FetchError, ParseError, StockError};
pub use headers::{HeaderProfile, HeaderRotator};
pub use locations::parse_location_options;
pub use pacing::RequestPacer;
pub use parse::{extract_csrf_token, PageDiagnostics, PageLayout, StockParser};
pub use retry::{retry_with_backoff, RetryPolicy};
