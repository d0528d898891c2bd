//! apidisc-aggregator - Discovery aggregation control loop
//!
//! This crate provides the [`DiscoveryManager`] that tracks registered
//! backends, refetches their discovery documents when they are marked dirty
//! and publishes one merged document.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                       DiscoveryManager                           │
//! │                                                                  │
//! │  add_api_service ──┐                                             │
//! │  remove_api_service┴──► Registry ──► DirtyQueue                  │
//! │                                          │                       │
//! │                          ┌───────────────┼───────────────┐       │
//! │                          ▼               ▼               ▼       │
//! │                     ┌─────────┐     ┌─────────┐     ┌─────────┐  │
//! │                     │ worker  │     │ worker  │     │ worker  │  │
//! │                     └────┬────┘     └────┬────┘     └────┬────┘  │
//! │                          │ fetch (conditional, per backend)      │
//! │                          ▼                                       │
//! │                    per-backend cache ──► merge ──► publisher     │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use apidisc_aggregator::DiscoveryManager;
//! use apidisc_api::ResourceManager;
//!
//! let merged = Arc::new(ResourceManager::new());
//! let manager = Arc::new(DiscoveryManager::new(merged.clone()));
//!
//! manager.add_api_service(ApiService::new("stable.example.com", "v1"), local_handler);
//!
//! let cancel = CancellationToken::new();
//! let handle = manager.run(cancel.clone()).await;
//! // local backends are already part of `merged` here
//! ```

mod backoff;
mod cache;
pub mod config;
pub mod error;
mod fetch;
mod manager;
pub mod merge;
mod queue;
mod registry;

pub use cache::CacheEntry;
pub use config::{ManagerConfig, RetryConfig};
pub use error::SyncError;
pub use manager::{DiscoveryManager, RunHandle};
pub use queue::DirtyQueue;

// Re-export core types for convenience
pub use apidisc_core::{
    AggregatePublisher, ApiGroupDiscovery, ApiService, DiscoveryHandler, GroupVersion,
    LegacyConverter, ServiceReference,
};
