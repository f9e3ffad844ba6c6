//! Error types for the branch store
//!
//! TigerStyle: Explicit error variants with context.

use braid_core::Error as CoreError;
use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Branch store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    /// Unique-key collision on create. Conversation upserts swallow this;
    /// everything else propagates it.
    #[error("{resource} already exists: {id}")]
    Conflict { resource: &'static str, id: String },

    /// A branch and message disagree about their conversation
    #[error("conversation mismatch: branch {branch_id} belongs to {expected}, got {actual}")]
    ConversationMismatch {
        branch_id: String,
        expected: String,
        actual: String,
    },

    #[error("centroid dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("storage failure: {reason}")]
    Internal { reason: String },
}

impl StoreError {
    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            id: id.into(),
        }
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal {
            reason: reason.into(),
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { resource, id } => CoreError::not_found(resource, id),
            StoreError::Conflict { resource, id } => CoreError::conflict(resource, id),
            StoreError::DimensionMismatch { left, right } => {
                CoreError::DimensionMismatch { left, right }
            }
            StoreError::ConversationMismatch { .. } => CoreError::internal(err.to_string()),
            StoreError::Internal { reason } => CoreError::internal(reason),
        }
    }
}

impl From<braid_core::Error> for StoreError {
    fn from(err: braid_core::Error) -> Self {
        match err {
            CoreError::DimensionMismatch { left, right } => {
                StoreError::DimensionMismatch { left, right }
            }
            other => StoreError::internal(other.to_string()),
        }
    }
}
