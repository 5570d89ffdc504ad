use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Fixed-interval retry strategy.
///
/// `max_attempts: None` retries forever, which is what the remote API expects for rate
/// limiting and index lag. A cap turns the loop into a bounded one for callers that prefer
/// to give up; the attempt count includes the first try.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    pub interval_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    /// Retry forever every `interval_ms`.
    pub const fn fixed(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            max_attempts: None,
        }
    }

    /// No waiting between attempts; meant for tests and dry runs.
    pub const fn immediate() -> Self {
        Self::fixed(0)
    }

    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Whether another attempt may follow `attempts` failed ones.
    pub fn allows_retry(&self, attempts: u32) -> bool {
        match self.max_attempts {
            Some(max) => attempts < max,
            None => true,
        }
    }
}
