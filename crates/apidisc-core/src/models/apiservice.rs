//! Backend registration models

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a backend: the API group and version it serves.
///
/// The empty group is the legacy core group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupVersion {
    pub group: String,
    pub version: String,
}

impl GroupVersion {
    pub fn new(group: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
        }
    }
}

/// Renders `version.group`, the conventional registration name
impl fmt::Display for GroupVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            f.write_str(&self.version)
        } else {
            write!(f, "{}.{}", self.version, self.group)
        }
    }
}

/// Reference to the service that hosts a remote backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceReference {
    #[serde(default)]
    pub namespace: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl ServiceReference {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            port: None,
        }
    }
}

/// A backend registration.
///
/// A registration without a service reference is local: it is served by a
/// handler living in the same process as the aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiService {
    /// Registration name, conventionally `version.group`
    pub name: String,
    pub group: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceReference>,
    /// Ordering hint for the group; the highest value among a group's
    /// registrations wins
    #[serde(default)]
    pub group_priority_minimum: i32,
    /// Ordering hint for this version within its group
    #[serde(default)]
    pub version_priority: i32,
}

impl ApiService {
    /// Create a local registration named `version.group`
    pub fn new(group: impl Into<String>, version: impl Into<String>) -> Self {
        let group_version = GroupVersion::new(group, version);
        Self {
            name: group_version.to_string(),
            group: group_version.group,
            version: group_version.version,
            service: None,
            group_priority_minimum: 0,
            version_priority: 0,
        }
    }

    /// Point this registration at a remote service
    pub fn with_service(mut self, service: ServiceReference) -> Self {
        self.service = Some(service);
        self
    }

    pub fn with_priority(mut self, group_priority_minimum: i32, version_priority: i32) -> Self {
        self.group_priority_minimum = group_priority_minimum;
        self.version_priority = version_priority;
        self
    }

    pub fn group_version(&self) -> GroupVersion {
        GroupVersion::new(self.group.clone(), self.version.clone())
    }

    pub fn is_local(&self) -> bool {
        self.service.is_none()
    }
}
