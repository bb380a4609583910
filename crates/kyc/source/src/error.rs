//! Error types for the status source boundary.

use thiserror::Error;

/// Errors surfaced by a status source implementation.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Transport-level failure reaching the backend.
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success status code.
    #[error("backend returned status {status}: {message}")]
    Backend { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The backend does not know the user.
    #[error("unknown user: {0}")]
    UnknownUser(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SourceError::Malformed(err.to_string())
        } else {
            SourceError::Transport(err.to_string())
        }
    }
}

/// Result type for source operations.
pub type SourceResult<T> = Result<T, SourceError>;
