//! Error types for backend synchronization

use apidisc_core::{ConversionError, HandlerError};
use thiserror::Error;

/// Why a backend's discovery document could not be refreshed.
///
/// These never leave the manager: they mark the backend's cache entry stale
/// and schedule a retry.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The backend handler failed
    #[error(transparent)]
    Handler(#[from] HandlerError),

    /// The legacy resource list could not be converted
    #[error("Legacy conversion failed: {0}")]
    Conversion(#[from] ConversionError),

    /// The backend answered out of protocol
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The backend serves neither aggregated nor legacy discovery
    #[error("Backend does not serve discovery for {0}")]
    Unsupported(String),

    /// The sync panicked
    #[error("Sync panicked: {0}")]
    Panicked(String),
}
