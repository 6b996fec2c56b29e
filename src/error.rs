//! Error types for catalog requests and batch lookups.

use thiserror::Error;

/// Errors produced by the request pipeline and the batch aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The request could not be sent or the server answered with a non-2xx status.
    #[error("request for '{id}' failed: {reason}")]
    RequestFailed { id: String, reason: String },

    /// No response arrived within the configured window.
    #[error("request for '{id}' timed out after {after_ms}ms")]
    Timeout { id: String, after_ms: u64 },

    /// The body was empty, not JSON, not an object, or carried the wrong padding.
    #[error("malformed response for '{id}': {reason}")]
    MalformedResponse { id: String, reason: String },

    /// The API acknowledged the call with `Ack: Failure`.
    #[error("api rejected '{id}': {message}")]
    ApiFailure { id: String, message: String },

    /// One member of a fail-fast batch failed.
    #[error("batch member #{position} failed: {source}")]
    BatchMember {
        position: usize,
        #[source]
        source: Box<Error>,
    },

    /// A batch was requested with no identifiers.
    #[error("batch requires at least one identifier")]
    EmptyBatch,

    /// The batch was cancelled before every member completed.
    #[error("batch {batch} cancelled")]
    Cancelled { batch: u64 },

    /// A response arrived for a slot that was already filled or delivered.
    #[error("late response for batch {batch} slot {position}")]
    LateResponse { batch: u64, position: usize },

    /// The member stream ended before every slot was filled.
    #[error("batch {batch} ended with {received} of {expected} responses")]
    Incomplete { batch: u64, received: usize, expected: usize },

    /// The client was configured with invalid settings.
    #[error("invalid client configuration: {message}")]
    Config { message: String },
}

impl Error {
    /// Identifier the error refers to, if it is tied to a single request.
    pub fn id(&self) -> Option<&str> {
        match self {
            Error::RequestFailed { id, .. }
            | Error::Timeout { id, .. }
            | Error::MalformedResponse { id, .. }
            | Error::ApiFailure { id, .. } => Some(id),
            Error::BatchMember { source, .. } => source.id(),
            _ => None,
        }
    }

    /// Whether a retry of the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::RequestFailed { .. } | Error::Timeout { .. })
    }
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, Error>;
