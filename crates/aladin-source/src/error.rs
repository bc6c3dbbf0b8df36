//! Error types for the lookup pipeline

use thiserror::Error;

/// Transport-level failures from the HTTP layer.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {message}")]
    RequestFailed { message: String },
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },
    #[error("request timed out")]
    Timeout,
    #[error("not found (404)")]
    NotFound,
    #[error("unexpected HTTP status {status}")]
    Status { status: u16 },
}

/// Operation-level failures reported to the caller.
///
/// Per-field extraction problems never reach this level; they are
/// handled inside the detail worker as [`ExtractError`] and logged.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Neither a usable identifier nor title/authors were supplied.
    #[error("insufficient metadata to build a search query")]
    NoQuery,
    #[error("HTTP error: {0}")]
    Fetch(#[from] FetchError),
    #[error("parse error: {0}")]
    Parse(String),
    /// The origin answered with its generic fallback page or an
    /// explicit in-page error instead of a book.
    #[error("no such item at origin")]
    NotFound,
}

impl SourceError {
    /// True when the failure is a socket timeout, which callers may
    /// retry at their level.
    pub fn is_timeout(&self) -> bool {
        matches!(self, SourceError::Fetch(FetchError::Timeout))
    }
}

/// A single field's extraction failed; the field is treated as absent.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("{0} not found in page")]
    Missing(&'static str),
    #[error("malformed {field}: {reason}")]
    Malformed {
        field: &'static str,
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_converts_to_source_error() {
        let err: SourceError = FetchError::Timeout.into();
        assert!(err.is_timeout());

        let err: SourceError = FetchError::NotFound.into();
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_extract_error_display_names_the_field() {
        let err = ExtractError::Missing("title");
        assert_eq!(err.to_string(), "title not found in page");
    }
}
