use lmstock_core::StockQuery;

use crate::error::{BlockKind, FetchError};

/// How a single request attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Blocked(BlockKind),
    NetworkError,
    Timeout,
    HttpStatus(u16),
}

impl AttemptOutcome {
    #[must_use]
    pub fn from_result<T>(result: &Result<T, FetchError>) -> Self {
        match result {
            Ok(_) => AttemptOutcome::Success,
            Err(err) => match err.root() {
                FetchError::Blocked { kind, .. } => AttemptOutcome::Blocked(kind.clone()),
                FetchError::Timeout { .. } => AttemptOutcome::Timeout,
                FetchError::UnexpectedStatus { status, .. } => AttemptOutcome::HttpStatus(*status),
                _ => AttemptOutcome::NetworkError,
            },
        }
    }
}

impl std::fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptOutcome::Success => write!(f, "success"),
            AttemptOutcome::Blocked(kind) => write!(f, "blocked ({kind})"),
            AttemptOutcome::NetworkError => write!(f, "network error"),
            AttemptOutcome::Timeout => write!(f, "timeout"),
            AttemptOutcome::HttpStatus(status) => write!(f, "HTTP {status}"),
        }
    }
}

/// One request made on behalf of a query. Lives only as long as the retry loop.
#[derive(Debug)]
pub struct FetchAttempt<'a> {
    pub query: &'a StockQuery,
    pub number: u32,
    pub outcome: AttemptOutcome,
}

impl FetchAttempt<'_> {
    pub(crate) fn log(&self, profile: &str) {
        tracing::debug!(
            branch = %self.query.branch.code,
            weight = ?self.query.weight,
            attempt = self.number,
            profile,
            outcome = %self.outcome,
            "fetch attempt finished"
        );
    }
}
