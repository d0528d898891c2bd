//! Per-backend retry backoff

use std::collections::HashMap;
use std::time::Duration;

use apidisc_core::GroupVersion;
use parking_lot::Mutex;

use crate::config::RetryConfig;

/// Tracks consecutive failures per backend and hands out retry delays
pub(crate) struct Backoff {
    initial: Duration,
    max: Duration,
    failures: Mutex<HashMap<GroupVersion, u32>>,
}

impl Backoff {
    pub(crate) fn new(config: &RetryConfig) -> Self {
        Self {
            initial: config.initial_backoff(),
            max: config.max_backoff(),
            failures: Mutex::new(HashMap::new()),
        }
    }

    /// Record a failure and return how long to wait before retrying
    pub(crate) fn next_delay(&self, identity: &GroupVersion) -> Duration {
        let mut failures = self.failures.lock();
        let count = failures.entry(identity.clone()).or_insert(0);
        let exponent = (*count).min(31);
        *count = count.saturating_add(1);

        self.initial
            .checked_mul(1u32 << exponent)
            .map_or(self.max, |delay| delay.min(self.max))
    }

    /// Reset after a success or a removal
    pub(crate) fn forget(&self, identity: &GroupVersion) {
        self.failures.lock().remove(identity);
    }

    pub(crate) fn failures(&self, identity: &GroupVersion) -> u32 {
        self.failures.lock().get(identity).copied().unwrap_or(0)
    }
}
