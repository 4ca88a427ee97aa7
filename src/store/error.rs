//! Store error types
//!
//! What a view or ingest call can fail with. Backend failures are translated
//! here and tagged with the measurement that was being read.

use thiserror::Error;

use crate::backend::BackendError;
use crate::time::InvalidDate;

/// Errors returned by `HealthStore` operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// A date parameter is not `YYYY-MM-DD` (or falls outside the zone's range)
    #[error(transparent)]
    InvalidDate(#[from] InvalidDate),

    /// The backend could not be reached
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The caller's deadline passed before the backend answered
    #[error("Query timed out")]
    QueryTimeout,

    /// The caller gave up on the request
    #[error("Query cancelled")]
    Cancelled,

    /// The backend rejected or garbled the query for one measurement
    #[error("Query on '{measurement}' failed: {message}")]
    Query {
        measurement: String,
        message: String,
    },

    /// A point failed validation or the write was rejected
    #[error("Ingest failed: {0}")]
    Ingest(String),
}

impl StoreError {
    /// Translate a backend failure on a read of `measurement`
    pub fn from_backend(measurement: &str, err: BackendError) -> Self {
        match err {
            BackendError::Unavailable(msg) => StoreError::BackendUnavailable(msg),
            BackendError::Timeout => StoreError::QueryTimeout,
            BackendError::Cancelled => StoreError::Cancelled,
            BackendError::Query(message)
            | BackendError::Decode(message)
            | BackendError::Write(message) => StoreError::Query {
                measurement: measurement.to_string(),
                message,
            },
        }
    }

    /// Translate a backend failure on a write
    pub fn from_write(err: BackendError) -> Self {
        match err {
            BackendError::Unavailable(msg) => StoreError::BackendUnavailable(msg),
            BackendError::Timeout => StoreError::QueryTimeout,
            BackendError::Cancelled => StoreError::Cancelled,
            other => StoreError::Ingest(other.to_string()),
        }
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::ZoneResolver;

    #[test]
    fn test_invalid_date_is_transparent() {
        let err: StoreError = ZoneResolver::parse_date("2024-13-01").unwrap_err().into();
        assert!(matches!(err, StoreError::InvalidDate(_)));
        assert_eq!(
            err.to_string(),
            "Invalid date '2024-13-01': expected YYYY-MM-DD"
        );
    }

    #[test]
    fn test_backend_query_error_names_measurement() {
        let err = StoreError::from_backend(
            "dietary_protein",
            BackendError::Query("table not found".to_string()),
        );
        assert_eq!(
            err.to_string(),
            "Query on 'dietary_protein' failed: table not found"
        );
    }

    #[test]
    fn test_transport_failures_keep_their_kind() {
        assert!(matches!(
            StoreError::from_backend("m", BackendError::Unavailable("refused".into())),
            StoreError::BackendUnavailable(_)
        ));
        assert!(matches!(
            StoreError::from_backend("m", BackendError::Timeout),
            StoreError::QueryTimeout
        ));
        assert!(matches!(
            StoreError::from_write(BackendError::Cancelled),
            StoreError::Cancelled
        ));
        assert!(matches!(
            StoreError::from_write(BackendError::Write("400 Bad Request".into())),
            StoreError::Ingest(_)
        ));
    }
}
