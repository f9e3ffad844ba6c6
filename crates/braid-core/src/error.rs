//! Error types for Braid
//!
//! TigerStyle: Explicit error types with context, using thiserror.

use thiserror::Error;

/// Result type alias for Braid operations
pub type Result<T> = std::result::Result<T, Error>;

/// Braid error taxonomy
///
/// Every fallible path in the workspace resolves into one of these kinds.
/// The HTTP layer maps kinds to status codes; nothing downstream matches on
/// message strings.
#[derive(Error, Debug)]
pub enum Error {
    /// Request-shaped input failed validation
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// A referenced resource does not exist
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    /// An upstream dependency (embedding sidecar) could not serve the call
    #[error("Embedding service unavailable at {endpoint}: {reason}")]
    Unavailable { endpoint: String, reason: String },

    /// A deadline expired before the operation finished
    #[error("Operation timed out: {operation} exceeded {ms} ms")]
    Timeout { operation: &'static str, ms: u64 },

    /// Unique-key collision on create
    ///
    /// Swallowed for conversation upserts (concurrent create is success),
    /// surfaced everywhere else.
    #[error("{resource} already exists: {id}")]
    Conflict { resource: &'static str, id: String },

    /// Vector operands of different lengths
    #[error("Dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    /// Invalid configuration value
    #[error("Invalid configuration: {field}, reason: {reason}")]
    InvalidConfiguration { field: String, reason: String },

    /// Any other storage or internal failure
    #[error("Internal error: {reason}")]
    Internal { reason: String },
}

impl Error {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            id: id.into(),
        }
    }

    pub fn unavailable(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    pub fn timeout(operation: &'static str, ms: u64) -> Self {
        Self::Timeout { operation, ms }
    }

    pub fn conflict(resource: &'static str, id: impl Into<String>) -> Self {
        Self::Conflict {
            resource,
            id: id.into(),
        }
    }

    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal {
            reason: reason.into(),
        }
    }

    /// Whether this error is a unique-key collision that conversation
    /// upserts treat as success.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_carries_context() {
        let err = Error::not_found("branch", "b-123");
        assert_eq!(err.to_string(), "branch not found: b-123");

        let err = Error::timeout("drift_pipeline", 10_000);
        assert!(err.to_string().contains("10000 ms"));
    }

    #[test]
    fn test_conflict_detection() {
        assert!(Error::conflict("conversation", "c1").is_conflict());
        assert!(!Error::invalid_input("empty content").is_conflict());
    }
}
