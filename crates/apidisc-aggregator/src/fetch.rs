//! Conditional fetch of one backend's discovery fragment

use apidisc_core::{
    ApiGroupDiscoveryList, ApiVersionDiscovery, DiscoveryHandler, DiscoveryRequest,
    DiscoveryResponse, GroupVersion, LegacyConverter,
};
use tracing::debug;

use crate::error::SyncError;

/// Result of one fetch attempt
#[derive(Debug)]
pub(crate) enum FetchOutcome {
    /// The backend confirmed the cached token is still current
    Unchanged,
    /// New content, with the token to send next time
    Updated {
        fragment: Option<ApiVersionDiscovery>,
        etag: Option<String>,
    },
    Failed(SyncError),
}

/// Pick the identity's own version entry out of a backend document
fn extract_fragment(
    document: ApiGroupDiscoveryList,
    identity: &GroupVersion,
) -> Option<ApiVersionDiscovery> {
    document
        .items
        .into_iter()
        .find(|group| group.name() == identity.group)?
        .versions
        .into_iter()
        .find(|version| version.version == identity.version)
}

pub(crate) async fn fetch(
    handler: &dyn DiscoveryHandler,
    identity: &GroupVersion,
    etag: Option<String>,
    converter: &dyn LegacyConverter,
) -> FetchOutcome {
    let conditional = etag.is_some();
    let response = match handler
        .serve(DiscoveryRequest::Aggregated { etag })
        .await
    {
        Ok(response) => response,
        Err(e) => return FetchOutcome::Failed(e.into()),
    };

    match response {
        DiscoveryResponse::NotModified if conditional => FetchOutcome::Unchanged,
        DiscoveryResponse::NotModified => FetchOutcome::Failed(SyncError::Protocol(
            "not modified answer to an unconditional request".to_string(),
        )),
        DiscoveryResponse::Aggregated { document, etag } => FetchOutcome::Updated {
            fragment: extract_fragment(document, identity),
            etag,
        },
        DiscoveryResponse::Legacy(_) => FetchOutcome::Failed(SyncError::Protocol(
            "legacy resource list in answer to an aggregated request".to_string(),
        )),
        DiscoveryResponse::Unsupported => {
            debug!(group_version = %identity, "Backend lacks aggregated discovery, using legacy");
            fetch_legacy(handler, identity, converter).await
        }
    }
}

async fn fetch_legacy(
    handler: &dyn DiscoveryHandler,
    identity: &GroupVersion,
    converter: &dyn LegacyConverter,
) -> FetchOutcome {
    let request = DiscoveryRequest::Legacy {
        group: identity.group.clone(),
        version: identity.version.clone(),
    };
    match handler.serve(request).await {
        Ok(DiscoveryResponse::Legacy(list)) => {
            match converter.convert(&identity.group, &identity.version, &list) {
                Ok(fragment) => FetchOutcome::Updated {
                    fragment: Some(fragment),
                    etag: None,
                },
                Err(e) => FetchOutcome::Failed(e.into()),
            }
        }
        Ok(DiscoveryResponse::Unsupported) => {
            FetchOutcome::Failed(SyncError::Unsupported(identity.to_string()))
        }
        Ok(other) => FetchOutcome::Failed(SyncError::Protocol(format!(
            "unexpected {} answer to a legacy request",
            other.kind()
        ))),
        Err(e) => FetchOutcome::Failed(e.into()),
    }
}
