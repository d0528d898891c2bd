//! Registry of backend registrations keyed by group version

use std::collections::HashMap;
use std::sync::Arc;

use apidisc_core::{ApiService, DiscoveryHandler, GroupVersion};

/// A live registration: the registration object and its handler
#[derive(Clone)]
pub(crate) struct Registration {
    pub(crate) service: ApiService,
    pub(crate) handler: Arc<dyn DiscoveryHandler>,
}

/// What an upsert changed
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Upsert {
    /// Identity previously registered under the same name, now gone
    pub(crate) displaced: Option<GroupVersion>,
    /// The identity's handler or service reference differs from before
    pub(crate) target_changed: bool,
}

/// At most one registration per identity, plus a name index
#[derive(Default)]
pub(crate) struct Registry {
    by_identity: HashMap<GroupVersion, Registration>,
    names: HashMap<String, GroupVersion>,
}

impl Registry {
    pub(crate) fn upsert(
        &mut self,
        service: ApiService,
        handler: Arc<dyn DiscoveryHandler>,
    ) -> Upsert {
        let identity = service.group_version();
        let mut upsert = Upsert::default();

        // the name moved to a different identity
        if let Some(old) = self.names.get(&service.name).cloned() {
            if old != identity {
                self.by_identity.remove(&old);
                upsert.displaced = Some(old);
            }
        }

        upsert.target_changed = match self.by_identity.get(&identity) {
            Some(existing) => {
                if existing.service.name != service.name {
                    self.names.remove(&existing.service.name);
                }
                !Arc::ptr_eq(&existing.handler, &handler)
                    || existing.service.service != service.service
            }
            None => true,
        };

        self.names.insert(service.name.clone(), identity.clone());
        self.by_identity
            .insert(identity, Registration { service, handler });
        upsert
    }

    pub(crate) fn remove_by_name(&mut self, name: &str) -> Option<GroupVersion> {
        let identity = self.names.remove(name)?;
        self.by_identity.remove(&identity);
        Some(identity)
    }

    pub(crate) fn get(&self, identity: &GroupVersion) -> Option<&Registration> {
        self.by_identity.get(identity)
    }

    pub(crate) fn contains(&self, identity: &GroupVersion) -> bool {
        self.by_identity.contains_key(identity)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&GroupVersion, &Registration)> {
        self.by_identity.iter()
    }

    pub(crate) fn local_identities(&self) -> Vec<GroupVersion> {
        self.by_identity
            .iter()
            .filter(|(_, reg)| reg.service.is_local())
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub(crate) fn services(&self) -> Vec<ApiService> {
        let mut services: Vec<ApiService> =
            self.by_identity.values().map(|r| r.service.clone()).collect();
        services.sort_by(|a, b| a.name.cmp(&b.name));
        services
    }

    pub(crate) fn len(&self) -> usize {
        self.by_identity.len()
    }
}
