use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder, proto};
use purge_core::{MetricsBackend, RetryOp};
use purge_model::TaskOutcome;

/// Counters for task and message throughput.
///
/// Cloning shares the underlying counters and registry.
#[derive(Clone)]
pub struct PrometheusMetrics {
    registry: Registry,
    tasks_started: IntCounter,
    tasks_finished: IntCounterVec,
    messages_deleted: IntCounter,
    messages_skipped: IntCounter,
    search_pages: IntCounter,
    retries: IntCounterVec,
}

impl PrometheusMetrics {
    /// Create the counters in a fresh registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::with_registry(Registry::new())
    }

    /// Register the counters in an existing registry.
    pub fn with_registry(registry: Registry) -> Result<Self, prometheus::Error> {
        let tasks_started = IntCounter::with_opts(Opts::new(
            "purge_tasks_started_total",
            "Tasks that started running",
        ))?;
        let tasks_finished = IntCounterVec::new(
            Opts::new(
                "purge_tasks_finished_total",
                "Tasks that left the queue after running",
            ),
            &["outcome"],
        )?;
        let messages_deleted = IntCounter::with_opts(Opts::new(
            "purge_messages_deleted_total",
            "Messages deleted",
        ))?;
        let messages_skipped = IntCounter::with_opts(Opts::new(
            "purge_messages_skipped_total",
            "Messages left in place after a denial or exhausted retries",
        ))?;
        let search_pages = IntCounter::with_opts(Opts::new(
            "purge_search_pages_total",
            "Indexed search pages received",
        ))?;
        let retries = IntCounterVec::new(
            Opts::new("purge_retries_total", "Retries after transient failures"),
            &["op"],
        )?;

        registry.register(Box::new(tasks_started.clone()))?;
        registry.register(Box::new(tasks_finished.clone()))?;
        registry.register(Box::new(messages_deleted.clone()))?;
        registry.register(Box::new(messages_skipped.clone()))?;
        registry.register(Box::new(search_pages.clone()))?;
        registry.register(Box::new(retries.clone()))?;

        Ok(Self {
            registry,
            tasks_started,
            tasks_finished,
            messages_deleted,
            messages_skipped,
            search_pages,
            retries,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn gather(&self) -> Vec<proto::MetricFamily> {
        self.registry.gather()
    }

    /// Render all metrics in the Prometheus text exposition format.
    pub fn encode_text(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn task_started(&self) {
        self.tasks_started.inc();
    }

    fn task_finished(&self, outcome: &TaskOutcome) {
        self.tasks_finished
            .with_label_values(&[outcome.as_str()])
            .inc();
    }

    fn message_deleted(&self) {
        self.messages_deleted.inc();
    }

    fn message_skipped(&self) {
        self.messages_skipped.inc();
    }

    fn search_page(&self) {
        self.search_pages.inc();
    }

    fn retry(&self, op: RetryOp) {
        self.retries.with_label_values(&[op.as_str()]).inc();
    }
}
