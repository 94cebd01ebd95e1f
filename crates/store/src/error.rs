//! Error types for key-value store operations.

use snafu::Snafu;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors a [`KvStore`](crate::KvStore) can return.
///
/// Condition failures are not errors: conditional writes report them through
/// [`TxnOutcome::ConditionFailed`](crate::TxnOutcome::ConditionFailed).
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum StoreError {
    /// The store could not be reached or refused service.
    #[snafu(display("Store unavailable: {message}"))]
    Unavailable {
        /// Error description.
        message: String,
    },

    /// A request did not complete within its deadline.
    #[snafu(display("Store request timed out after {duration_ms}ms"))]
    Timeout {
        /// Deadline in milliseconds.
        duration_ms: u64,
    },

    /// The store rejected a malformed request.
    #[snafu(display("Store rejected request: {message}"))]
    Rejected {
        /// Error description.
        message: String,
    },
}

impl StoreError {
    /// Returns true if the error is transient and the request may succeed if
    /// sent again.
    ///
    /// Retryable errors:
    /// - `Unavailable`: Store temporarily unreachable
    /// - `Timeout`: Request deadline exceeded
    ///
    /// Non-retryable errors:
    /// - `Rejected`: The request itself is invalid
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Unavailable { .. } => true,
            Self::Timeout { .. } => true,
            Self::Rejected { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_is_retryable() {
        let err = StoreError::Unavailable { message: "connection refused".to_owned() };
        assert!(err.is_retryable());
    }

    #[test]
    fn test_timeout_is_retryable() {
        let err = StoreError::Timeout { duration_ms: 10_000 };
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "Store request timed out after 10000ms");
    }

    #[test]
    fn test_rejected_not_retryable() {
        let err = StoreError::Rejected { message: "empty transaction".to_owned() };
        assert!(!err.is_retryable());
    }
}
