//! Aggregated discovery document models
//!
//! Field names follow the `apidiscovery.k8s.io/v2beta1` JSON encoding so
//! documents can be exchanged with any backend speaking that format.

use serde::{Deserialize, Serialize};

/// API version of the aggregated discovery format
pub const DISCOVERY_API_VERSION: &str = "apidiscovery.k8s.io/v2beta1";

/// Kind of the aggregated discovery envelope
pub const DISCOVERY_LIST_KIND: &str = "APIGroupDiscoveryList";

/// Media type of an aggregated discovery response
pub const AGGREGATED_CONTENT_TYPE: &str =
    "application/json;g=apidiscovery.k8s.io;v=v2beta1;as=APIGroupDiscoveryList";

/// Object metadata; discovery documents only carry a name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,
}

/// Whether a version's resource list reflects the backend's latest answer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Freshness {
    #[default]
    Current,
    Stale,
}

/// Scope of a resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceScope {
    #[default]
    Cluster,
    Namespaced,
}

/// Kind returned by a resource endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupVersionKind {
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub version: String,
    pub kind: String,
}

/// A subresource (e.g. `status`, `scale`) of a discovered resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSubresourceDiscovery {
    pub subresource: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_kind: Option<GroupVersionKind>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accepted_types: Vec<GroupVersionKind>,
    #[serde(default)]
    pub verbs: Vec<String>,
}

/// A single resource within a group version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResourceDiscovery {
    pub resource: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_kind: Option<GroupVersionKind>,
    #[serde(default)]
    pub scope: ResourceScope,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub singular_resource: String,
    #[serde(default)]
    pub verbs: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub short_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subresources: Vec<ApiSubresourceDiscovery>,
}

/// One version of a group and the resources it serves
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiVersionDiscovery {
    pub version: String,
    #[serde(default)]
    pub resources: Vec<ApiResourceDiscovery>,
    #[serde(default)]
    pub freshness: Freshness,
}

/// An API group and its versions, in preference order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiGroupDiscovery {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub versions: Vec<ApiVersionDiscovery>,
}

impl ApiGroupDiscovery {
    pub fn new(name: impl Into<String>, versions: Vec<ApiVersionDiscovery>) -> Self {
        Self {
            metadata: ObjectMeta { name: name.into() },
            versions,
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Find a version entry by name
    pub fn version(&self, version: &str) -> Option<&ApiVersionDiscovery> {
        self.versions.iter().find(|v| v.version == version)
    }
}

/// Wire envelope of an aggregated discovery document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGroupDiscoveryList {
    #[serde(default = "default_list_kind")]
    pub kind: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default)]
    pub items: Vec<ApiGroupDiscovery>,
}

fn default_list_kind() -> String {
    DISCOVERY_LIST_KIND.to_string()
}

fn default_api_version() -> String {
    DISCOVERY_API_VERSION.to_string()
}

impl ApiGroupDiscoveryList {
    pub fn new(items: Vec<ApiGroupDiscovery>) -> Self {
        Self {
            kind: default_list_kind(),
            api_version: default_api_version(),
            items,
        }
    }
}

impl Default for ApiGroupDiscoveryList {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_serializes_name_under_metadata() {
        let group = ApiGroupDiscovery::new(
            "stable.example.com",
            vec![ApiVersionDiscovery {
                version: "v1".to_string(),
                resources: vec![],
                freshness: Freshness::Stale,
            }],
        );
        let json = serde_json::to_value(&group).unwrap();
        assert_eq!(json["metadata"]["name"], "stable.example.com");
        assert_eq!(json["versions"][0]["freshness"], "Stale");
    }

    #[test]
    fn list_fills_envelope_defaults() {
        let list: ApiGroupDiscoveryList = serde_json::from_str(r#"{"items":[]}"#).unwrap();
        assert_eq!(list.kind, DISCOVERY_LIST_KIND);
        assert_eq!(list.api_version, DISCOVERY_API_VERSION);
    }

    #[test]
    fn resource_parses_kubernetes_field_names() {
        let json = r#"{
            "resource": "foos",
            "responseKind": {"group": "stable.example.com", "version": "v1", "kind": "Foo"},
            "scope": "Namespaced",
            "singularResource": "foo",
            "verbs": ["get", "list"],
            "shortNames": ["fo"]
        }"#;
        let resource: ApiResourceDiscovery = serde_json::from_str(json).unwrap();
        assert_eq!(resource.scope, ResourceScope::Namespaced);
        assert_eq!(resource.singular_resource, "foo");
        assert_eq!(resource.response_kind.unwrap().kind, "Foo");
        assert_eq!(resource.short_names, vec!["fo".to_string()]);
    }
}
