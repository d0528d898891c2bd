//! Discovery document of the daemon's own API group

use apidisc_core::{
    ApiResourceDiscovery, ApiService, ApiVersionDiscovery, Freshness, GroupVersionKind,
    ResourceScope,
};

pub const LOCAL_GROUP: &str = "apiregistration.k8s.io";
pub const LOCAL_VERSION: &str = "v1";

/// Local registration for the daemon's own group
pub fn api_service() -> ApiService {
    ApiService::new(LOCAL_GROUP, LOCAL_VERSION).with_priority(18000, 15)
}

/// The `apiservices` resource the daemon lists for itself
pub fn version() -> ApiVersionDiscovery {
    ApiVersionDiscovery {
        version: LOCAL_VERSION.to_string(),
        resources: vec![ApiResourceDiscovery {
            resource: "apiservices".to_string(),
            response_kind: Some(GroupVersionKind {
                group: LOCAL_GROUP.to_string(),
                version: LOCAL_VERSION.to_string(),
                kind: "APIService".to_string(),
            }),
            scope: ResourceScope::Cluster,
            singular_resource: "apiservice".to_string(),
            verbs: ["get", "list", "watch"].map(String::from).to_vec(),
            categories: vec!["api-extensions".to_string()],
            ..Default::default()
        }],
        freshness: Freshness::Current,
    }
}
