//! Backend error types
//!
//! Transport-level failures of the time-series backend. The store layer
//! translates these into its own taxonomy, attaching the measurement name.

use thiserror::Error;

/// Errors that can occur talking to the time-series backend
#[derive(Error, Debug)]
pub enum BackendError {
    /// Connection refused, DNS failure, broken transport
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// The caller's deadline passed before the backend answered
    #[error("Backend request timed out")]
    Timeout,

    /// The caller cancelled the request
    #[error("Request cancelled")]
    Cancelled,

    /// The backend rejected the query (syntax, unknown table, schema mismatch)
    #[error("Query rejected: {0}")]
    Query(String),

    /// The backend rejected a write
    #[error("Write rejected: {0}")]
    Write(String),

    /// The backend answered with something we could not decode
    #[error("Malformed backend response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BackendError::Timeout
        } else if err.is_decode() || err.is_body() {
            BackendError::Decode(err.to_string())
        } else {
            BackendError::Unavailable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Decode(err.to_string())
    }
}

/// Result type alias for backend operations
pub type BackendResult<T> = Result<T, BackendError>;
