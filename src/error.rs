//! Domain error types

use thiserror::Error;

/// Batch precondition failures, raised before any request is issued
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Paste at least one IP address.")]
    Empty,
    #[error("At most {max} IP addresses can be queried at a time (got {count}).")]
    TooMany { count: usize, max: usize },
    #[error("A lookup batch is already running.")]
    Busy,
}

/// Failure of a single address lookup
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP status: {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("lookup rejected: {0}")]
    Rejected(String),
}

/// Historical prefix query failures
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("No ASN number recognised.")]
    MissingAsn,
    #[error("Pick a date first.")]
    MissingDate,
    #[error("query failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for HistoryError {
    fn from(e: reqwest::Error) -> Self {
        HistoryError::Request(e.to_string())
    }
}

/// Data file or country map load failures
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
