//! Common error types for discovery backends

use thiserror::Error;

/// Result type for backend handler calls
pub type HandlerResult<T> = Result<T, HandlerError>;

/// Errors a backend handler can return while serving a discovery request
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Backend unreachable or connection dropped
    #[error("Transport error: {0}")]
    Transport(String),

    /// Backend answered with a status the caller cannot interpret
    #[error("Unexpected status {status}: {message}")]
    Status { status: u16, message: String },

    /// Payload could not be decoded
    #[error("Malformed discovery document: {0}")]
    Decode(String),

    /// Backend did not answer within its deadline
    #[error("Request timed out")]
    Timeout,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for HandlerError {
    fn from(e: serde_json::Error) -> Self {
        HandlerError::Decode(e.to_string())
    }
}

/// Errors raised while converting legacy resource lists
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// A `parent/sub` resource scoped differently from its parent
    #[error("parent {parent} and subresource {subresource} scopes do not match")]
    ScopeMismatch { parent: String, subresource: String },

    /// A resource with an empty name
    #[error("resource without a name in {0}")]
    EmptyName(String),
}
