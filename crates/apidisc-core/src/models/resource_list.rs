//! Legacy per-version discovery models

use serde::{Deserialize, Serialize};

/// A resource as listed by the legacy `/apis/{group}/{version}` endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResource {
    pub name: String,
    #[serde(default)]
    pub singular_name: String,
    #[serde(default)]
    pub namespaced: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub verbs: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub short_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
}

/// Legacy resource list for one group version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResourceList {
    #[serde(default = "default_kind")]
    pub kind: String,
    /// `group/version`, or just `version` for the core group
    pub group_version: String,
    #[serde(default)]
    pub resources: Vec<ApiResource>,
}

fn default_kind() -> String {
    "APIResourceList".to_string()
}

impl ApiResourceList {
    pub fn new(group: &str, version: &str, resources: Vec<ApiResource>) -> Self {
        let group_version = if group.is_empty() {
            version.to_string()
        } else {
            format!("{}/{}", group, version)
        };
        Self {
            kind: default_kind(),
            group_version,
            resources,
        }
    }
}
