//! Error type shared by every pipeline operation.
//!
//! Only caller bugs (bad arguments, malformed pipeline text) and collaborator
//! failures are errors. Validation failures are data, see
//! [`ValidationResult`](crate::ValidationResult).

use thiserror::Error;

/// Errors raised by the record pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// An argument the caller controls is out of its domain
    /// (e.g. `limit == 0`, unknown sort direction).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Pipeline definition text could not be parsed.
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The remote backend rejected a request or returned an unusable payload.
    #[error("backend error: {0}")]
    Backend(String),

    #[error("session error: {0}")]
    Session(String),
}

impl PipelineError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PipelineError>;
