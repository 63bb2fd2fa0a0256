//! Error types for the run-completion pipeline.
//!
//! Every failure that can escape a stage is a [`RunCompletionError`]. Stages
//! do not decide retry policy themselves; they ask the error for its
//! [`FailureKind`] and invoke the matching completion handler.

use std::fmt;
use thiserror::Error;

/// Status code reported by a backend collaborator.
///
/// Mirrors the subset of RPC status codes the pipeline distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendErrorCode {
    /// The requested entity does not exist.
    NotFound,
    /// The service could not be reached.
    Unavailable,
    /// The call did not complete before its deadline.
    DeadlineExceeded,
    /// The service failed while handling the call.
    Internal,
    /// Anything else.
    Unknown,
}

impl fmt::Display for BackendErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Unavailable => write!(f, "unavailable"),
            Self::DeadlineExceeded => write!(f, "deadline_exceeded"),
            Self::Internal => write!(f, "internal"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// An error returned by a backend collaborator (run service, job service,
/// metadata store, pipeline job service).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct BackendError {
    /// The status code.
    pub code: BackendErrorCode,
    /// Human readable detail.
    pub message: String,
}

impl BackendError {
    /// Creates a new backend error.
    #[must_use]
    pub fn new(code: BackendErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(BackendErrorCode::NotFound, message)
    }

    /// Creates an unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(BackendErrorCode::Unavailable, message)
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(BackendErrorCode::Internal, message)
    }

    /// Returns true if the backend reported the entity as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.code == BackendErrorCode::NotFound
    }
}

/// How the upstream source should treat a failed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Redeliver the signal later.
    Recoverable,
    /// Drop the signal permanently.
    Unrecoverable,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recoverable => write!(f, "recoverable"),
            Self::Unrecoverable => write!(f, "unrecoverable"),
        }
    }
}

/// The main error type for run-completion resolution.
#[derive(Debug, Clone, Error)]
pub enum RunCompletionError {
    /// The run or job the signal refers to no longer exists.
    #[error("{resource} not found: {source}")]
    ResourceGone {
        /// The kind and identifier of the missing resource.
        resource: String,
        /// The backend error.
        #[source]
        source: BackendError,
    },

    /// A collaborator call failed.
    #[error("backend call {operation} failed: {source}")]
    Backend {
        /// The collaborator operation that failed.
        operation: &'static str,
        /// The backend error.
        #[source]
        source: BackendError,
    },

    /// A structured reference block could not be decoded.
    #[error("malformed resource references: {0}")]
    MalformedReferences(String),

    /// A lineage store handed back the reserved zero identifier.
    #[error("invalid {0} ID")]
    InvalidIdentifier(&'static str),

    /// The pipeline was cancelled while the message was in flight.
    #[error("cancelled: {0}")]
    Cancelled(String),
}

impl RunCompletionError {
    /// Wraps a backend error raised by `operation`.
    #[must_use]
    pub fn backend(operation: &'static str, source: BackendError) -> Self {
        Self::Backend { operation, source }
    }

    /// Wraps a backend error raised while fetching the primary resource.
    ///
    /// A not-found status becomes [`RunCompletionError::ResourceGone`].
    #[must_use]
    pub fn fetching(
        operation: &'static str,
        resource: impl fmt::Display,
        source: BackendError,
    ) -> Self {
        if source.is_not_found() {
            Self::ResourceGone {
                resource: resource.to_string(),
                source,
            }
        } else {
            Self::Backend { operation, source }
        }
    }

    /// Returns how the upstream source should react to this error.
    #[must_use]
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::ResourceGone { .. } => FailureKind::Unrecoverable,
            Self::Backend { .. }
            | Self::MalformedReferences(_)
            | Self::InvalidIdentifier(_)
            | Self::Cancelled(_) => FailureKind::Recoverable,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = RunCompletionError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::unavailable("connection refused");
        assert_eq!(err.to_string(), "unavailable: connection refused");
    }

    #[test]
    fn test_fetching_not_found_is_unrecoverable() {
        let err = RunCompletionError::fetching(
            "GetPipelineJob",
            "pipeline job run-1",
            BackendError::not_found("gone"),
        );
        assert!(matches!(err, RunCompletionError::ResourceGone { .. }));
        assert_eq!(err.failure_kind(), FailureKind::Unrecoverable);
    }

    #[test]
    fn test_fetching_other_codes_are_recoverable() {
        let err = RunCompletionError::fetching(
            "GetRun",
            "run run-1",
            BackendError::internal("boom"),
        );
        assert!(matches!(err, RunCompletionError::Backend { operation: "GetRun", .. }));
        assert_eq!(err.failure_kind(), FailureKind::Recoverable);
    }

    #[test]
    fn test_malformed_references_stay_recoverable() {
        let err = RunCompletionError::MalformedReferences("bad yaml".into());
        assert_eq!(err.failure_kind(), FailureKind::Recoverable);
    }

    #[test]
    fn test_cancelled_is_recoverable() {
        let err = RunCompletionError::Cancelled("shutdown".into());
        assert_eq!(err.failure_kind(), FailureKind::Recoverable);
        assert_eq!(err.to_string(), "cancelled: shutdown");
    }
}
