//! Application state for the discovery API

use std::sync::Arc;

use crate::resource_manager::ResourceManager;

type ReadinessProbe = Arc<dyn Fn() -> bool + Send + Sync>;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    resources: Arc<ResourceManager>,
    readiness: Option<ReadinessProbe>,
}

impl AppState {
    /// Serve the document held by `resources`; always ready
    pub fn new(resources: Arc<ResourceManager>) -> Self {
        Self {
            resources,
            readiness: None,
        }
    }

    /// Report readiness through `probe` (for example "the aggregator has
    /// converged")
    pub fn with_readiness(mut self, probe: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.readiness = Some(Arc::new(probe));
        self
    }

    pub fn resources(&self) -> &Arc<ResourceManager> {
        &self.resources
    }

    pub fn is_ready(&self) -> bool {
        self.readiness.as_ref().map_or(true, |probe| probe())
    }
}
