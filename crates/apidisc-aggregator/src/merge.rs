//! Merge engine: combines per-backend cache entries into one document
//!
//! Groups are ordered by priority (the highest `group_priority_minimum`
//! among their registrations, descending), then by name. Versions within a
//! group are ordered by `version_priority` (descending), then by
//! [`compare_versions`]. Groups left without versions are dropped.

use std::collections::BTreeMap;

use apidisc_core::version::compare_versions;
use apidisc_core::{ApiGroupDiscovery, ApiService, ApiVersionDiscovery};

use crate::cache::CacheEntry;

struct GroupAccumulator {
    priority: i32,
    versions: Vec<(i32, ApiVersionDiscovery)>,
}

/// Merge the cache entries of registered backends.
///
/// Pure: the output depends only on the set of inputs, not on their order.
pub fn merge<'a, I>(entries: I) -> Vec<ApiGroupDiscovery>
where
    I: IntoIterator<Item = (&'a ApiService, &'a CacheEntry)>,
{
    let mut groups: BTreeMap<String, GroupAccumulator> = BTreeMap::new();

    for (service, entry) in entries {
        let Some(version) = entry.published_version() else {
            continue;
        };

        let group = groups
            .entry(service.group.clone())
            .or_insert_with(|| GroupAccumulator {
                priority: service.group_priority_minimum,
                versions: Vec::new(),
            });
        group.priority = group.priority.max(service.group_priority_minimum);

        match group
            .versions
            .iter_mut()
            .find(|(_, existing)| existing.version == version.version)
        {
            Some(slot) => {
                if service.version_priority > slot.0 {
                    *slot = (service.version_priority, version);
                }
            }
            None => group.versions.push((service.version_priority, version)),
        }
    }

    let mut merged: Vec<(i32, ApiGroupDiscovery)> = groups
        .into_iter()
        .filter(|(_, group)| !group.versions.is_empty())
        .map(|(name, mut group)| {
            group.versions.sort_by(|(pa, a), (pb, b)| {
                pb.cmp(pa)
                    .then_with(|| compare_versions(&a.version, &b.version))
            });
            let versions = group.versions.into_iter().map(|(_, v)| v).collect();
            (group.priority, ApiGroupDiscovery::new(name, versions))
        })
        .collect();

    merged.sort_by(|(pa, a), (pb, b)| pb.cmp(pa).then_with(|| a.name().cmp(b.name())));
    merged.into_iter().map(|(_, group)| group).collect()
}
