//! Error types shared across the federated search crates.

use thiserror::Error;

/// Errors raised while building or loading shared types.
#[derive(Debug, Error)]
pub enum TypesError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A resource identifier could not be parsed
    #[error("Invalid resource id: {0}")]
    InvalidResourceId(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error returned by the external collaborators (space listing, path
/// resolution, index search).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The backend could not be reached or timed out
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// The backend reported that nothing exists for the request
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend failed while processing the request
    #[error("Backend error: {0}")]
    Internal(String),
}

impl BackendError {
    /// Returns true if this error only signals an absence of results.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::NotFound(_))
    }
}
