// Error types for article publishing and authentication

use thiserror::Error;

/// Result type alias for Newsdesk operations
pub type Result<T> = std::result::Result<T, NewsdeskError>;

/// Errors that can occur while authenticating or publishing
#[derive(Debug, Error)]
pub enum NewsdeskError {
    /// Unknown user or wrong password at login
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Missing, malformed, or expired session token
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Shared-secret header missing or wrong
    #[error("invalid API key")]
    InvalidApiKey,

    /// Article not present in the index
    #[error("not found: {0}")]
    NotFound(String),

    /// Store call failed for a reason other than "key absent"
    #[error("storage failure: {0}")]
    StorageFailure(String),

    /// Submitted payload could not be parsed
    #[error("malformed request: {0}")]
    MalformedRequest(String),
}

impl NewsdeskError {
    /// Create an unauthenticated error
    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        NewsdeskError::Unauthenticated(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        NewsdeskError::NotFound(msg.into())
    }

    /// Create a storage failure
    pub fn storage(msg: impl Into<String>) -> Self {
        NewsdeskError::StorageFailure(msg.into())
    }

    /// Create a malformed request error
    pub fn malformed(msg: impl Into<String>) -> Self {
        NewsdeskError::MalformedRequest(msg.into())
    }

    /// Whether this error came from a store call
    pub fn is_storage(&self) -> bool {
        matches!(self, NewsdeskError::StorageFailure(_))
    }
}
