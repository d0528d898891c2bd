//! In-process discovery document store
//!
//! A [`ResourceManager`] holds one immutable [`Snapshot`] at a time. Every
//! change builds a new snapshot (document, encoded body and ETag) and swaps
//! it in; readers clone the `Arc` and never block writers for longer than
//! the swap.

use std::sync::Arc;

use apidisc_core::version::compare_versions;
use apidisc_core::{
    AggregatePublisher, ApiGroupDiscovery, ApiGroupDiscoveryList, ApiVersionDiscovery,
    DiscoveryHandler, DiscoveryRequest, DiscoveryResponse, HandlerResult,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use tracing::{debug, error};

/// One published state of the document
#[derive(Debug)]
pub struct Snapshot {
    pub document: ApiGroupDiscoveryList,
    /// JSON encoding of `document`, served as is
    pub body: Vec<u8>,
    /// Hex SHA-256 of `body`
    pub etag: String,
}

impl Snapshot {
    fn build(document: ApiGroupDiscoveryList) -> serde_json::Result<Self> {
        let body = serde_json::to_vec(&document)?;
        let etag = hex::encode(Sha256::digest(&body));
        Ok(Self {
            document,
            body,
            etag,
        })
    }

    /// Whether an `If-None-Match` header value names this snapshot
    pub fn matches(&self, if_none_match: &str) -> bool {
        if_none_match.split(',').map(str::trim).any(|tag| {
            let tag = tag.strip_prefix("W/").unwrap_or(tag);
            tag == "*" || tag.trim_matches('"') == self.etag
        })
    }
}

/// Discovery document store; publisher target and local backend
pub struct ResourceManager {
    snapshot: RwLock<Arc<Snapshot>>,
}

impl Default for ResourceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceManager {
    pub fn new() -> Self {
        Self::with_groups(Vec::new())
    }

    /// Create a manager that already serves `groups`
    pub fn with_groups(groups: Vec<ApiGroupDiscovery>) -> Self {
        let document = ApiGroupDiscoveryList::new(groups);
        let snapshot = Snapshot::build(document.clone()).unwrap_or_else(|e| {
            error!(error = %e, "Failed to encode discovery document");
            Snapshot {
                document,
                body: b"{}".to_vec(),
                etag: String::new(),
            }
        });
        Self {
            snapshot: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.read().clone()
    }

    pub fn etag(&self) -> String {
        self.snapshot.read().etag.clone()
    }

    pub fn groups(&self) -> Vec<ApiGroupDiscovery> {
        self.snapshot.read().document.items.clone()
    }

    /// Replace the whole document
    pub fn set_groups(&self, groups: Vec<ApiGroupDiscovery>) {
        self.replace(ApiGroupDiscoveryList::new(groups));
    }

    /// Add or replace one version of a group. New groups go last; versions
    /// are kept in precedence order.
    pub fn add_group_version(&self, group: &str, version: ApiVersionDiscovery) {
        let mut groups = self.groups();
        match groups.iter_mut().find(|g| g.name() == group) {
            Some(existing) => {
                existing.versions.retain(|v| v.version != version.version);
                existing.versions.push(version);
                existing
                    .versions
                    .sort_by(|a, b| compare_versions(&a.version, &b.version));
            }
            None => groups.push(ApiGroupDiscovery::new(group, vec![version])),
        }
        self.set_groups(groups);
    }

    fn replace(&self, document: ApiGroupDiscoveryList) {
        match Snapshot::build(document) {
            Ok(snapshot) => {
                debug!(
                    groups = snapshot.document.items.len(),
                    etag = %snapshot.etag,
                    "Discovery document replaced"
                );
                *self.snapshot.write() = Arc::new(snapshot);
            }
            Err(e) => error!(error = %e, "Failed to encode discovery document, keeping previous"),
        }
    }
}

impl AggregatePublisher for ResourceManager {
    fn publish(&self, groups: Vec<ApiGroupDiscovery>) {
        self.set_groups(groups);
    }
}

#[async_trait]
impl DiscoveryHandler for ResourceManager {
    async fn serve(&self, request: DiscoveryRequest) -> HandlerResult<DiscoveryResponse> {
        match request {
            DiscoveryRequest::Aggregated { etag } => {
                let snapshot = self.snapshot();
                if etag.as_deref() == Some(snapshot.etag.as_str()) {
                    return Ok(DiscoveryResponse::NotModified);
                }
                Ok(DiscoveryResponse::Aggregated {
                    document: snapshot.document.clone(),
                    etag: Some(snapshot.etag.clone()),
                })
            }
            DiscoveryRequest::Legacy { .. } => Ok(DiscoveryResponse::Unsupported),
        }
    }
}
