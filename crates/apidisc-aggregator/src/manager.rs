//! DiscoveryManager - registration, worker loop and publish
//!
//! Every registration change marks the backend's identity dirty. Workers
//! pull identities off the [`DirtyQueue`], fetch the backend's document
//! (conditionally when a token is cached), update the per-backend cache and
//! publish a freshly merged document.
//!
//! Lock order: `publish_lock` → `registry` → `cache`. No lock is held across
//! an await.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use apidisc_core::{
    AggregatePublisher, ApiService, DefaultLegacyConverter, DiscoveryHandler, GroupVersion,
    LegacyConverter,
};
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::backoff::Backoff;
use crate::cache::CacheEntry;
use crate::config::ManagerConfig;
use crate::error::SyncError;
use crate::fetch::{fetch, FetchOutcome};
use crate::merge::merge;
use crate::queue::DirtyQueue;
use crate::registry::Registry;

/// Reconciles registered backends into one published discovery document
pub struct DiscoveryManager {
    config: ManagerConfig,
    publisher: Arc<dyn AggregatePublisher>,
    converter: Arc<dyn LegacyConverter>,
    registry: RwLock<Registry>,
    cache: RwLock<HashMap<GroupVersion, CacheEntry>>,
    queue: Arc<DirtyQueue<GroupVersion>>,
    backoff: Backoff,
    /// Serializes merge + publish so an older snapshot never lands last
    publish_lock: Mutex<()>,
    /// Identities that completed at least one pass since they were registered
    synced: Mutex<HashSet<GroupVersion>>,
    sync_notify: Notify,
    shutdown: CancellationToken,
}

/// Handle to the workers started by [`DiscoveryManager::run`]
pub struct RunHandle {
    workers: Vec<JoinHandle<()>>,
    watcher: JoinHandle<()>,
}

impl RunHandle {
    /// Wait for every worker to exit. Workers only exit after cancellation.
    pub async fn wait(self) {
        for worker in self.workers {
            if let Err(e) = worker.await {
                error!(error = %e, "Discovery worker aborted");
            }
        }
        if let Err(e) = self.watcher.await {
            error!(error = %e, "Cancellation watcher aborted");
        }
    }
}

impl DiscoveryManager {
    pub fn new(publisher: Arc<dyn AggregatePublisher>) -> Self {
        Self::with_config(publisher, ManagerConfig::default())
    }

    pub fn with_config(publisher: Arc<dyn AggregatePublisher>, config: ManagerConfig) -> Self {
        let backoff = Backoff::new(&config.retry);
        Self {
            config,
            publisher,
            converter: Arc::new(DefaultLegacyConverter),
            registry: RwLock::new(Registry::default()),
            cache: RwLock::new(HashMap::new()),
            queue: Arc::new(DirtyQueue::new()),
            backoff,
            publish_lock: Mutex::new(()),
            synced: Mutex::new(HashSet::new()),
            sync_notify: Notify::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Replace the legacy discovery converter
    pub fn with_converter(mut self, converter: Arc<dyn LegacyConverter>) -> Self {
        self.converter = converter;
        self
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register (or re-register) a backend and mark it dirty.
    ///
    /// Always accepted. A different handler or service reference for an
    /// already-known identity keeps the cached content but drops its
    /// freshness token.
    pub fn add_api_service(&self, service: ApiService, handler: Arc<dyn DiscoveryHandler>) {
        let identity = service.group_version();
        let name = service.name.clone();
        let local = service.is_local();

        let upsert = {
            let mut registry = self.registry.write();
            let upsert = registry.upsert(service, handler);
            let mut cache = self.cache.write();
            if let Some(old) = &upsert.displaced {
                cache.remove(old);
            }
            if upsert.target_changed {
                if let Some(entry) = cache.get_mut(&identity) {
                    entry.etag = None;
                }
            }
            upsert
        };

        if let Some(old) = upsert.displaced {
            self.backoff.forget(&old);
            info!(name = %name, group_version = %old, "API service moved to a new group version");
            self.queue.add(old);
        }

        self.synced.lock().remove(&identity);
        info!(name = %name, group_version = %identity, local, "Registered API service");
        self.queue.add(identity);
    }

    /// Unregister a backend by registration name. Unknown names are ignored.
    pub fn remove_api_service(&self, name: &str) {
        let identity = {
            let mut registry = self.registry.write();
            let Some(identity) = registry.remove_by_name(name) else {
                debug!(name = %name, "Remove of unknown API service ignored");
                return;
            };
            self.cache.write().remove(&identity);
            identity
        };

        self.backoff.forget(&identity);
        info!(name = %name, group_version = %identity, "Removed API service");
        self.queue.add(identity);
    }

    /// Registered backends, sorted by name
    pub fn registered_services(&self) -> Vec<ApiService> {
        self.registry.read().services()
    }

    /// Current cache entry of a backend
    pub fn cache_entry(&self, identity: &GroupVersion) -> Option<CacheEntry> {
        self.cache.read().get(identity).cloned()
    }

    // =========================================================================
    // Run loop
    // =========================================================================

    /// Start the workers and wait until every local backend registered at
    /// this point has completed one pass. Remote backends may still be in
    /// flight when this returns.
    pub async fn run(self: &Arc<Self>, cancel: CancellationToken) -> RunHandle {
        let count = self.config.worker_count();
        let workers = (0..count)
            .map(|id| tokio::spawn(Arc::clone(self).worker(id)))
            .collect();

        let watcher = {
            let manager = Arc::clone(self);
            tokio::spawn(async move {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = manager.shutdown.cancelled() => {}
                }
                manager.shut_down();
            })
        };

        let (locals, registered) = {
            let registry = self.registry.read();
            (registry.local_identities(), registry.len())
        };
        info!(
            workers = count,
            backends = registered,
            local_backends = locals.len(),
            "Discovery manager running"
        );
        self.wait_for_locals(&locals).await;

        RunHandle { workers, watcher }
    }

    /// Stop accepting work and let idle workers exit
    pub fn shut_down(&self) {
        if !self.queue.is_shutting_down() {
            info!("Discovery manager shutting down");
        }
        self.shutdown.cancel();
        self.queue.shut_down();
        self.sync_notify.notify_waiters();
    }

    /// Number of identities waiting for or undergoing a pass. Zero means
    /// the published document has caught up with the registry.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Poll [`Self::queue_len`] until it reaches zero or `timeout` elapses
    pub async fn wait_for_sync(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.queue_len() == 0 {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    async fn wait_for_locals(&self, locals: &[GroupVersion]) {
        loop {
            let notified = self.sync_notify.notified();
            if self.shutdown.is_cancelled() {
                return;
            }
            {
                let synced = self.synced.lock();
                if locals.iter().all(|id| synced.contains(id)) {
                    return;
                }
            }
            notified.await;
        }
    }

    async fn worker(self: Arc<Self>, id: usize) {
        debug!(worker = id, "Discovery worker started");
        while let Some(identity) = self.queue.get().await {
            self.process(identity).await;
        }
        debug!(worker = id, "Discovery worker stopped");
    }

    async fn process(&self, identity: GroupVersion) {
        match self.sync(&identity).await {
            Ok(()) => {
                self.backoff.forget(&identity);
            }
            Err(e) => {
                let delay = self.backoff.next_delay(&identity);
                warn!(
                    group_version = %identity,
                    error = %e,
                    failures = self.backoff.failures(&identity),
                    retry_in_ms = delay.as_millis() as u64,
                    "Discovery sync failed"
                );
                self.schedule_retry(identity.clone(), delay);
            }
        }

        self.synced.lock().insert(identity.clone());
        self.sync_notify.notify_waiters();
        self.queue.done(&identity);
    }

    fn schedule_retry(&self, identity: GroupVersion, delay: Duration) {
        let queue = Arc::clone(&self.queue);
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {}
                _ = tokio::time::sleep(delay) => queue.add(identity),
            }
        });
    }

    // =========================================================================
    // Sync
    // =========================================================================

    async fn sync(&self, identity: &GroupVersion) -> Result<(), SyncError> {
        let handler = self
            .registry
            .read()
            .get(identity)
            .map(|registration| Arc::clone(&registration.handler));
        let Some(handler) = handler else {
            debug!(group_version = %identity, "Backend no longer registered");
            self.cache.write().remove(identity);
            self.publish();
            return Ok(());
        };

        let etag = self
            .cache
            .read()
            .get(identity)
            .and_then(|entry| entry.etag.clone());

        let outcome = AssertUnwindSafe(fetch(
            handler.as_ref(),
            identity,
            etag,
            self.converter.as_ref(),
        ))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| {
            let message = panic_message(panic.as_ref());
            error!(group_version = %identity, panic = %message, "Discovery handler panicked");
            FetchOutcome::Failed(SyncError::Panicked(message))
        });

        let result = self.apply(identity, outcome);
        self.publish();
        result
    }

    /// Store a fetch outcome, unless the backend was removed meanwhile
    fn apply(&self, identity: &GroupVersion, outcome: FetchOutcome) -> Result<(), SyncError> {
        let registry = self.registry.read();
        let mut cache = self.cache.write();

        if !registry.contains(identity) {
            cache.remove(identity);
            return Ok(());
        }

        match outcome {
            FetchOutcome::Unchanged => {
                debug!(group_version = %identity, "Backend discovery not modified");
                if let Some(entry) = cache.get_mut(identity) {
                    entry.stale = false;
                }
                Ok(())
            }
            FetchOutcome::Updated { fragment, etag } => {
                debug!(
                    group_version = %identity,
                    listed = fragment.is_some(),
                    "Backend discovery updated"
                );
                cache.insert(identity.clone(), CacheEntry::current(fragment, etag));
                Ok(())
            }
            FetchOutcome::Failed(e) => {
                if let Some(entry) = cache.get_mut(identity) {
                    entry.stale = true;
                }
                Err(e)
            }
        }
    }

    fn publish(&self) {
        let _guard = self.publish_lock.lock();
        let groups = {
            let registry = self.registry.read();
            let cache = self.cache.read();
            merge(registry.iter().filter_map(|(identity, registration)| {
                cache
                    .get(identity)
                    .map(|entry| (&registration.service, entry))
            }))
        };
        debug!(groups = groups.len(), "Publishing merged discovery");
        self.publisher.publish(groups);
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
