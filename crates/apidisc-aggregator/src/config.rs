//! Discovery manager configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for a [`DiscoveryManager`](crate::DiscoveryManager)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Number of reconciliation workers draining the dirty queue
    pub workers: usize,
    /// Retry cadence for backends whose last fetch failed
    pub retry: RetryConfig,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            retry: RetryConfig::default(),
        }
    }
}

impl ManagerConfig {
    /// Worker count, never less than one
    pub fn worker_count(&self) -> usize {
        self.workers.max(1)
    }
}

/// Exponential backoff for failed backends.
///
/// The first retry waits `initial_backoff_ms`; every further consecutive
/// failure doubles the wait up to `max_backoff_ms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_backoff_ms: 500,
            max_backoff_ms: 30_000,
        }
    }
}

impl RetryConfig {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms.max(self.initial_backoff_ms))
    }
}
