//! Conversion of legacy resource lists into aggregated discovery entries

use std::collections::HashMap;

use crate::error::ConversionError;
use crate::models::{
    ApiResource, ApiResourceDiscovery, ApiResourceList, ApiSubresourceDiscovery,
    ApiVersionDiscovery, Freshness, GroupVersionKind, ResourceScope,
};

/// Turns a backend's legacy resource list into one aggregated version entry
pub trait LegacyConverter: Send + Sync {
    fn convert(
        &self,
        group: &str,
        version: &str,
        list: &ApiResourceList,
    ) -> Result<ApiVersionDiscovery, ConversionError>;
}

/// Converter used unless the aggregator is given another one
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLegacyConverter;

impl LegacyConverter for DefaultLegacyConverter {
    fn convert(
        &self,
        group: &str,
        version: &str,
        list: &ApiResourceList,
    ) -> Result<ApiVersionDiscovery, ConversionError> {
        Ok(ApiVersionDiscovery {
            version: version.to_string(),
            resources: convert_resources(group, version, &list.resources)?,
            freshness: Freshness::Current,
        })
    }
}

fn scope_of(resource: &ApiResource) -> ResourceScope {
    if resource.namespaced {
        ResourceScope::Namespaced
    } else {
        ResourceScope::Cluster
    }
}

/// Response kind of a legacy resource. Resources that leave their group or
/// version blank inherit the list's.
fn response_kind(resource: &ApiResource, group: &str, version: &str) -> Option<GroupVersionKind> {
    if resource.kind.is_empty() {
        return None;
    }
    let pick = |own: &str, fallback: &str| {
        if own.is_empty() {
            fallback.to_string()
        } else {
            own.to_string()
        }
    };
    Some(GroupVersionKind {
        group: pick(&resource.group, group),
        version: pick(&resource.version, version),
        kind: resource.kind.clone(),
    })
}

/// Convert a legacy resource list.
///
/// Top-level resources keep their input order. `parent/sub` entries become
/// subresources of `parent`; a parent missing from the list is synthesized.
pub fn convert_resources(
    group: &str,
    version: &str,
    resources: &[ApiResource],
) -> Result<Vec<ApiResourceDiscovery>, ConversionError> {
    let mut converted: Vec<ApiResourceDiscovery> = Vec::new();
    let mut parents: HashMap<String, usize> = HashMap::new();

    for resource in resources.iter().filter(|r| !r.name.contains('/')) {
        if resource.name.is_empty() {
            return Err(ConversionError::EmptyName(format!("{}/{}", group, version)));
        }
        converted.push(ApiResourceDiscovery {
            resource: resource.name.clone(),
            response_kind: response_kind(resource, group, version),
            scope: scope_of(resource),
            singular_resource: resource.singular_name.clone(),
            verbs: resource.verbs.clone(),
            short_names: resource.short_names.clone(),
            categories: resource.categories.clone(),
            subresources: Vec::new(),
        });
        parents.insert(resource.name.clone(), converted.len() - 1);
    }

    for resource in resources.iter().filter(|r| r.name.contains('/')) {
        let Some((parent, sub)) = resource.name.split_once('/') else {
            continue;
        };
        let scope = scope_of(resource);

        let idx = match parents.get(parent) {
            Some(idx) => *idx,
            None => {
                converted.push(ApiResourceDiscovery {
                    resource: parent.to_string(),
                    scope,
                    ..Default::default()
                });
                parents.insert(parent.to_string(), converted.len() - 1);
                converted.len() - 1
            }
        };

        let entry = &mut converted[idx];
        if entry.scope != scope {
            return Err(ConversionError::ScopeMismatch {
                parent: parent.to_string(),
                subresource: resource.name.clone(),
            });
        }
        entry.subresources.push(ApiSubresourceDiscovery {
            subresource: sub.to_string(),
            response_kind: response_kind(resource, group, version),
            accepted_types: Vec::new(),
            verbs: resource.verbs.clone(),
        });
    }

    Ok(converted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn foo(version: &str) -> ApiResource {
        ApiResource {
            name: "foos".to_string(),
            singular_name: "foo".to_string(),
            namespaced: false,
            group: "stable.example.com".to_string(),
            version: version.to_string(),
            kind: "Foo".to_string(),
            verbs: vec!["get".to_string(), "list".to_string()],
            short_names: vec![],
            categories: vec!["all".to_string()],
        }
    }

    #[test]
    fn converts_top_level_resource() {
        let list = ApiResourceList::new("stable.example.com", "v1", vec![foo("v1")]);
        let converted = DefaultLegacyConverter
            .convert("stable.example.com", "v1", &list)
            .unwrap();

        assert_eq!(converted.version, "v1");
        assert_eq!(converted.freshness, Freshness::Current);
        assert_eq!(
            converted.resources,
            vec![ApiResourceDiscovery {
                resource: "foos".to_string(),
                response_kind: Some(GroupVersionKind {
                    group: "stable.example.com".to_string(),
                    version: "v1".to_string(),
                    kind: "Foo".to_string(),
                }),
                scope: ResourceScope::Cluster,
                singular_resource: "foo".to_string(),
                verbs: vec!["get".to_string(), "list".to_string()],
                short_names: vec![],
                categories: vec!["all".to_string()],
                subresources: vec![],
            }]
        );
    }

    #[test]
    fn attaches_subresources_to_parent() {
        let status = ApiResource {
            name: "foos/status".to_string(),
            kind: "Foo".to_string(),
            verbs: vec!["get".to_string(), "patch".to_string()],
            ..Default::default()
        };
        // subresource listed before its parent
        let resources = vec![status, foo("v1")];
        let converted = convert_resources("stable.example.com", "v1", &resources).unwrap();

        assert_eq!(converted.len(), 1);
        assert_eq!(converted[0].subresources.len(), 1);
        assert_eq!(converted[0].subresources[0].subresource, "status");
        assert_eq!(
            converted[0].subresources[0].response_kind.as_ref().unwrap().version,
            "v1"
        );
    }

    #[test]
    fn synthesizes_missing_parent() {
        let scale = ApiResource {
            name: "bars/scale".to_string(),
            namespaced: true,
            ..Default::default()
        };
        let converted = convert_resources("g", "v1", &[scale]).unwrap();
        assert_eq!(converted[0].resource, "bars");
        assert_eq!(converted[0].scope, ResourceScope::Namespaced);
        assert!(converted[0].response_kind.is_none());
    }

    #[test]
    fn rejects_scope_mismatch() {
        let status = ApiResource {
            name: "foos/status".to_string(),
            namespaced: true,
            ..Default::default()
        };
        let err = convert_resources("g", "v1", &[foo("v1"), status]).unwrap_err();
        assert!(matches!(err, ConversionError::ScopeMismatch { .. }));
    }

    #[test]
    fn blank_group_version_inherits_from_list() {
        let mut resource = foo("");
        resource.group.clear();
        let converted = convert_resources("stable.example.com", "v2", &[resource]).unwrap();
        let kind = converted[0].response_kind.as_ref().unwrap();
        assert_eq!(kind.group, "stable.example.com");
        assert_eq!(kind.version, "v2");
    }
}
