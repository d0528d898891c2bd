//! Per-backend cache entries

use apidisc_core::{ApiVersionDiscovery, Freshness};

/// Last known discovery state of one backend identity
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// The identity's version entry from the backend's last good answer.
    /// `None` when the backend answered but did not list the identity.
    pub fragment: Option<ApiVersionDiscovery>,
    /// Freshness token for conditional refetch
    pub etag: Option<String>,
    /// The latest fetch failed; `fragment` is left over from an earlier one
    pub stale: bool,
}

impl CacheEntry {
    pub fn current(fragment: Option<ApiVersionDiscovery>, etag: Option<String>) -> Self {
        Self {
            fragment,
            etag,
            stale: false,
        }
    }

    /// The version entry as it should appear in the merged document
    pub fn published_version(&self) -> Option<ApiVersionDiscovery> {
        let mut version = self.fragment.clone()?;
        if self.stale {
            version.freshness = Freshness::Stale;
        }
        Some(version)
    }
}
