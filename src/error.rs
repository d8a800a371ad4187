//! Error types for the listing and detail flows

use thiserror::Error;

/// Errors raised by the content flows.
///
/// A missing document is not an error: it surfaces as `None` from the
/// content source and as the `NotFound` detail state.
#[derive(Error, Debug)]
pub enum BlogError {
    /// Network or backend failure while talking to the content source.
    /// Retryable; callers keep their state unchanged.
    #[error("content source unavailable: {0}")]
    ContentSourceUnavailable(String),

    /// A pagination cursor that does not belong to the configured source
    #[error("invalid pagination cursor: {0}")]
    InvalidCursor(String),

    /// Null or unparseable publication timestamp handed to the formatter
    #[error("malformed publication timestamp: {0:?}")]
    MalformedTimestamp(Option<String>),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BlogError {
    /// Whether retrying the same operation may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, BlogError::ContentSourceUnavailable(_))
    }
}

impl From<reqwest::Error> for BlogError {
    fn from(e: reqwest::Error) -> Self {
        BlogError::ContentSourceUnavailable(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BlogError>;
