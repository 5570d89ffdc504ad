use std::time::Duration;

use purge_model::RetryPolicy;

/// Timing of the deletion loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Pause after every successful delete.
    pub delete_pacing: Duration,
    /// Transient delete failures.
    pub delete_retry: RetryPolicy,
    /// Transient search failures.
    pub search_retry: RetryPolicy,
    /// Pages still being indexed.
    pub index_retry: RetryPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            delete_pacing: Duration::from_millis(200),
            delete_retry: RetryPolicy::fixed(200),
            search_retry: RetryPolicy::fixed(1000),
            index_retry: RetryPolicy::fixed(2000),
        }
    }
}

impl EngineConfig {
    /// No pacing and no retry delays.
    pub fn immediate() -> Self {
        Self {
            delete_pacing: Duration::ZERO,
            delete_retry: RetryPolicy::immediate(),
            search_retry: RetryPolicy::immediate(),
            index_retry: RetryPolicy::immediate(),
        }
    }

    pub fn with_delete_pacing(mut self, pacing: Duration) -> Self {
        self.delete_pacing = pacing;
        self
    }

    pub fn with_delete_retry(mut self, policy: RetryPolicy) -> Self {
        self.delete_retry = policy;
        self
    }

    pub fn with_search_retry(mut self, policy: RetryPolicy) -> Self {
        self.search_retry = policy;
        self
    }

    pub fn with_index_retry(mut self, policy: RetryPolicy) -> Self {
        self.index_retry = policy;
        self
    }
}
