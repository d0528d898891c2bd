//! Error types for building remote handlers

use thiserror::Error;

/// Result type alias for proxy construction
pub type ProxyResult<T> = std::result::Result<T, ProxyError>;

/// Errors that can occur while setting up a remote handler
#[derive(Error, Debug)]
pub enum ProxyError {
    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// URL cannot serve as a base for discovery paths
    #[error("URL cannot be a base: {0}")]
    NotABase(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
