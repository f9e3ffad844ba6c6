//! Error types for the embedding client
//!
//! TigerStyle: Explicit error variants with context.

use braid_core::Error as CoreError;
use thiserror::Error;

/// Result type for embedding operations
pub type EmbedResult<T> = Result<T, EmbedError>;

/// Embedding client errors
#[derive(Error, Debug)]
pub enum EmbedError {
    /// The sidecar returned non-2xx or the transport failed
    #[error("embedding endpoint {endpoint} unavailable: {reason}")]
    Unavailable { endpoint: String, reason: String },

    /// The sidecar answered 2xx but the body did not match the schema
    #[error("embedding endpoint {endpoint} returned malformed body: {reason}")]
    MalformedResponse { endpoint: String, reason: String },

    /// The sidecar returned an empty embedding batch
    #[error("embedding endpoint {endpoint} returned no vectors")]
    EmptyResponse { endpoint: String },
}

impl EmbedError {
    pub fn unavailable(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }
}

impl From<EmbedError> for CoreError {
    fn from(err: EmbedError) -> Self {
        match err {
            EmbedError::Unavailable { endpoint, reason } => {
                CoreError::unavailable(endpoint, reason)
            }
            EmbedError::MalformedResponse { endpoint, reason } => {
                CoreError::unavailable(endpoint, format!("malformed response: {reason}"))
            }
            EmbedError::EmptyResponse { endpoint } => {
                CoreError::unavailable(endpoint, "empty embedding batch")
            }
        }
    }
}
