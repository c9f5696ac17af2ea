//! Engine error types.

use thiserror::Error;

/// How a transport layer should report an [`EngineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The caller sent something unusable
    Client,
    /// The requested scope does not exist for this user
    NotFound,
    /// A collaborator is temporarily unreachable
    Unavailable,
    /// The search failed on the server side
    Internal,
}

/// Errors surfaced by a federated search.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The query normalizes to nothing
    #[error("Empty query")]
    EmptyQuery,

    /// The requested space is not visible to the user
    #[error("Scope not found: {0}")]
    ScopeNotFound(String),

    /// Space listing or path resolution failed
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Every space in a non-empty scope failed to search
    #[error("All {failed} space searches failed")]
    AllBackendsFailed { failed: usize },

    /// The continuation token could not be parsed
    #[error("Invalid page token: {0}")]
    InvalidPageToken(String),

    /// The caller cancelled the request
    #[error("Search cancelled")]
    Cancelled,
}

impl EngineError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EngineError::EmptyQuery | EngineError::InvalidPageToken(_) => ErrorCategory::Client,
            EngineError::ScopeNotFound(_) => ErrorCategory::NotFound,
            EngineError::BackendUnavailable(_) | EngineError::Cancelled => {
                ErrorCategory::Unavailable
            }
            EngineError::AllBackendsFailed { .. } => ErrorCategory::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(EngineError::EmptyQuery.category(), ErrorCategory::Client);
        assert_eq!(
            EngineError::ScopeNotFound("x".into()).category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            EngineError::BackendUnavailable("down".into()).category(),
            ErrorCategory::Unavailable
        );
        assert_eq!(
            EngineError::AllBackendsFailed { failed: 2 }.category(),
            ErrorCategory::Internal
        );
    }

    #[test]
    fn test_scope_not_found_message_has_no_detail_beyond_id() {
        let err = EngineError::ScopeNotFound("storage$space!space".into());
        assert_eq!(err.to_string(), "Scope not found: storage$space!space");
    }
}
