use std::sync::Arc;

use purge_model::TaskOutcome;

/// Remote operation being retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetryOp {
    Search,
    Delete,
}

impl RetryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetryOp::Search => "search",
            RetryOp::Delete => "delete",
        }
    }
}

/// Sink for engine counters.
///
/// Every method defaults to a no-op so backends only implement what they record.
pub trait MetricsBackend: Send + Sync + 'static {
    fn task_started(&self) {}

    fn task_finished(&self, _outcome: &TaskOutcome) {}

    fn message_deleted(&self) {}

    /// A message was left in place (denied, or retries exhausted).
    fn message_skipped(&self) {}

    fn search_page(&self) {}

    fn retry(&self, _op: RetryOp) {}
}

pub type MetricsHandle = Arc<dyn MetricsBackend>;

/// Backend that records nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetrics;

impl MetricsBackend for NoOpMetrics {}

impl NoOpMetrics {
    pub fn handle() -> MetricsHandle {
        Arc::new(NoOpMetrics)
    }
}
