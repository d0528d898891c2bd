//! DiscoveryHandler trait - the capability every backend is reached through

use async_trait::async_trait;

use crate::error::HandlerResult;
use crate::models::{ApiGroupDiscovery, ApiGroupDiscoveryList, ApiResourceList};

/// A discovery request issued by the aggregator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryRequest {
    /// The whole aggregated document, conditional on `etag` when present
    Aggregated { etag: Option<String> },
    /// The legacy resource list of one group version
    Legacy { group: String, version: String },
}

/// A backend's answer to a [`DiscoveryRequest`]
#[derive(Debug, Clone, PartialEq)]
pub enum DiscoveryResponse {
    /// The document matching the supplied token is still current
    NotModified,
    /// A fresh aggregated document and its token, if the backend issues one
    Aggregated {
        document: ApiGroupDiscoveryList,
        etag: Option<String>,
    },
    /// A legacy resource list
    Legacy(ApiResourceList),
    /// The backend does not serve the requested format
    Unsupported,
}

impl DiscoveryResponse {
    /// Short name of the variant, for logs and errors
    pub fn kind(&self) -> &'static str {
        match self {
            DiscoveryResponse::NotModified => "not-modified",
            DiscoveryResponse::Aggregated { .. } => "aggregated",
            DiscoveryResponse::Legacy(_) => "legacy",
            DiscoveryResponse::Unsupported => "unsupported",
        }
    }
}

/// Serves discovery requests for one backend.
///
/// Implementations exist for in-process resource managers and for remote
/// backends reached over HTTP. The aggregator selects one per registration
/// and never inspects which kind it holds. Implementations are expected to
/// carry their own deadlines.
#[async_trait]
pub trait DiscoveryHandler: Send + Sync {
    async fn serve(&self, request: DiscoveryRequest) -> HandlerResult<DiscoveryResponse>;
}

/// Receives the merged document.
///
/// Each call replaces the whole document. Implementations must not block on
/// anything the aggregator's fetch path may be waiting for.
pub trait AggregatePublisher: Send + Sync {
    fn publish(&self, groups: Vec<ApiGroupDiscovery>);
}
