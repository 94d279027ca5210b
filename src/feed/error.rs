//! Feed error types

use thiserror::Error;

/// Errors surfaced by reading sources
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeedError {
    /// The source cannot deliver any further events
    ///
    /// The field is spelled `r#source` so thiserror does not treat it as an
    /// error-chain `source()`; it is the feed's name, not a nested error.
    #[error("feed '{source}' closed: {reason}")]
    Closed { r#source: String, reason: String },
    /// One inbound payload could not be decoded
    #[error("undecodable payload: {details}")]
    Payload { details: String },
}

impl FeedError {
    /// True when the source is finished and must be torn down; payload
    /// errors are per-event and polling may continue
    pub fn is_fatal(&self) -> bool {
        matches!(self, FeedError::Closed { .. })
    }
}

/// Result type for feed operations
pub type FeedResult<T> = Result<T, FeedError>;
