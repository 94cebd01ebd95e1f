//! Registry error types with operation context.
//!
//! Every failure reported by a registry operation names the operation and
//! the logical key it was working on, so a log line alone identifies what
//! went wrong and where. Errors also carry a caller-facing retryability
//! classification: a conflict or an unreachable store may succeed if the
//! whole operation is attempted again later; anything else will not.

use std::fmt;

use snafu::Snafu;

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Identifies the operation and logical key an error belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpContext {
    operation: &'static str,
    service: String,
    key_name: Option<String>,
}

impl OpContext {
    /// Creates context for an operation on a single logical key.
    pub(crate) fn key(operation: &'static str, service: &str, key_name: &str) -> Self {
        Self { operation, service: service.to_owned(), key_name: Some(key_name.to_owned()) }
    }

    /// Creates context for an operation spanning a whole service.
    pub(crate) fn service(operation: &'static str, service: &str) -> Self {
        Self { operation, service: service.to_owned(), key_name: None }
    }

    /// Returns the operation name (e.g. `publish_new_version`).
    #[must_use]
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Returns the service namespace as supplied by the caller.
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service
    }

    /// Returns the key name, if the operation targeted a single key.
    #[must_use]
    pub fn key_name(&self) -> Option<&str> {
        self.key_name.as_deref()
    }
}

impl fmt::Display for OpContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key_name {
            Some(key_name) => write!(f, "{} {}/{}", self.operation, self.service, key_name),
            None => write!(f, "{} {}", self.operation, self.service),
        }
    }
}

/// Errors returned by [`VersionedKeyRegistry`](crate::VersionedKeyRegistry).
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RegistryError {
    /// The logical key or requested version does not exist.
    #[snafu(display("{op}: not found: {message}"))]
    NotFound {
        /// Operation and key.
        op: OpContext,
        /// What was missing.
        message: String,
    },

    /// A conditional write kept losing to concurrent writers.
    #[snafu(display("{op}: conflict persisted after {attempts} attempts"))]
    Conflict {
        /// Operation and key.
        op: OpContext,
        /// Conditional writes attempted.
        attempts: u32,
    },

    /// Stored data violates the registry's invariants.
    ///
    /// Raised for gaps in a version sequence, an active pointer naming a
    /// missing version, versions without an active pointer, and records
    /// that cannot be decoded. The registry never repairs such state.
    #[snafu(display("{op}: corrupt state: {reason}"))]
    CorruptState {
        /// Operation and key.
        op: OpContext,
        /// Which invariant was violated.
        reason: String,
    },

    /// The store stayed unreachable after every retry attempt.
    #[snafu(display("{op}: store unavailable after {attempts} attempts: {last_error}"))]
    StoreUnavailable {
        /// Operation and key.
        op: OpContext,
        /// Number of attempts made.
        attempts: u32,
        /// Last error message before giving up.
        last_error: String,
        /// Error message from each attempt, in order.
        attempt_history: Vec<(u32, String)>,
    },

    /// The caller's cancellation token fired.
    #[snafu(display("{op}: cancelled"))]
    Cancelled {
        /// Operation and key.
        op: OpContext,
    },

    /// The registry has been shut down.
    #[snafu(display("Registry shutting down"))]
    Shutdown,

    /// A service or key name, or a version number, is malformed.
    #[snafu(display("{op}: invalid {field}: {constraint}"))]
    InvalidArgument {
        /// Operation and key as supplied.
        op: OpContext,
        /// Offending argument.
        field: String,
        /// Constraint it violates.
        constraint: String,
    },

    /// The store refused a request as malformed, or a record could not be
    /// encoded.
    #[snafu(display("{op}: internal error: {message}"))]
    Internal {
        /// Operation and key.
        op: OpContext,
        /// Error description.
        message: String,
    },

    /// Configuration validation error.
    #[snafu(display("Configuration error: {message}"))]
    Config {
        /// Error description.
        message: String,
    },
}

impl RegistryError {
    /// Returns true if attempting the whole operation again later may succeed.
    ///
    /// Retryable errors:
    /// - `Conflict`: Concurrent writers won every round
    /// - `StoreUnavailable`: The store was unreachable
    ///
    /// Non-retryable errors:
    /// - `CorruptState`: Requires operator repair
    /// - `NotFound`, `InvalidArgument`, `Config`: The request itself is wrong
    /// - `Cancelled`, `Shutdown`: The caller asked to stop
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Conflict { .. } => true,
            Self::StoreUnavailable { .. } => true,
            // Non-retryable
            Self::NotFound { .. } => false,
            Self::CorruptState { .. } => false,
            Self::Cancelled { .. } => false,
            Self::Shutdown => false,
            Self::InvalidArgument { .. } => false,
            Self::Internal { .. } => false,
            Self::Config { .. } => false,
        }
    }

    /// Returns the operation context, if the error belongs to an operation.
    #[must_use]
    pub fn context(&self) -> Option<&OpContext> {
        match self {
            Self::NotFound { op, .. }
            | Self::Conflict { op, .. }
            | Self::CorruptState { op, .. }
            | Self::StoreUnavailable { op, .. }
            | Self::Cancelled { op }
            | Self::InvalidArgument { op, .. }
            | Self::Internal { op, .. } => Some(op),
            Self::Shutdown | Self::Config { .. } => None,
        }
    }
}
