//! Error taxonomy for fetching prefecture lists and population series.
//!
//! Two layers:
//! - [`FetchError`] describes what went wrong on the wire (transport, HTTP status,
//!   API-level message, undecodable body).
//! - [`Error`] is what the stateful components report: which operation failed, with
//!   the wire error attached as its source.

use crate::models::Category;
use std::fmt;
use thiserror::Error;

/// Failure of a single request against the population API.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("request to {url} failed with HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    /// The API answered 2xx but carried no `result`, only a `message`.
    #[error("population api error: {0}")]
    Api(String),
    #[error("decode json: {0}")]
    Decode(#[from] serde_json::Error),
    /// Raised while building the client, before any request is sent.
    #[error("api key is not a valid header value")]
    InvalidApiKey(#[source] reqwest::header::InvalidHeaderValue),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to load prefecture list")]
    LoadPrefecturesFailed(#[source] FetchError),
    #[error("failed to fetch population data for prefecture {code}")]
    FetchSeriesFailed {
        code: u32,
        #[source]
        source: FetchError,
    },
    /// The payload had no series labeled for the requested category.
    /// Points at a remote schema change; never expected in normal operation.
    #[error("no series labeled \"{label}\" ({category}) in population data")]
    CategoryNotFound {
        category: Category,
        label: &'static str,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Coarse classification of [`Error`], stable enough to assert on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    LoadPrefecturesFailed,
    FetchSeriesFailed,
    CategoryNotFound,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::LoadPrefecturesFailed(_) => ErrorKind::LoadPrefecturesFailed,
            Error::FetchSeriesFailed { .. } => ErrorKind::FetchSeriesFailed,
            Error::CategoryNotFound { .. } => ErrorKind::CategoryNotFound,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

/// The error as the presentation layer sees it: one message string plus its kind.
///
/// Stateful components keep this instead of [`Error`] because the underlying
/// transport error cannot be cloned out of a shared state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
