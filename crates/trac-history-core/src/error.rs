//! Error types for trac-history-core.

use thiserror::Error;

/// Result type alias for trac-history-core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur in trac-history-core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A record violates a model constraint.
    #[error("validation error: {0}")]
    Validation(String),
}
