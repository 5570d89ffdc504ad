mod config;
pub use config::EngineConfig;

use std::{collections::HashSet, sync::Arc};

use purge_client::{ClientError, IndexPoller, SearchClient};
use purge_model::{
    Credential, Cursor, MessageHit, SearchFilter, Snowflake, Task, TaskOutcome, TaskState,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::metrics::{MetricsHandle, NoOpMetrics, RetryOp};
use crate::state::TaskStore;

/// Result of trying to delete a single message.
enum DeleteResult {
    Deleted,
    Denied,
    GaveUp,
    Cancelled,
    Unusable(String),
}

/// Drives one task through the search-then-delete loop.
///
/// The engine itself is stateless between runs; per-run state (cursor, ignore set) lives on
/// the stack of [`DeletionEngine::run`] and task counters live in the [`TaskStore`].
#[derive(Clone)]
pub struct DeletionEngine {
    client: Arc<dyn SearchClient>,
    poller: IndexPoller,
    config: EngineConfig,
    metrics: MetricsHandle,
}

impl DeletionEngine {
    pub fn new(client: Arc<dyn SearchClient>) -> Self {
        Self::with_parts(client, EngineConfig::default(), NoOpMetrics::handle())
    }

    fn with_parts(
        client: Arc<dyn SearchClient>,
        config: EngineConfig,
        metrics: MetricsHandle,
    ) -> Self {
        let poller = IndexPoller::new(Arc::clone(&client))
            .with_index_retry(config.index_retry)
            .with_search_retry(config.search_retry);
        Self {
            client,
            poller,
            config,
            metrics,
        }
    }

    pub fn with_config(self, config: EngineConfig) -> Self {
        Self::with_parts(self.client, config, self.metrics)
    }

    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of messages a filter currently matches, as reported by one indexed search.
    ///
    /// Used to preview a purge before enqueueing it.
    pub async fn count_matches(
        &self,
        credential: &Credential,
        filter: &SearchFilter,
    ) -> Result<Option<u64>, ClientError> {
        let page = self
            .poller
            .wait_for_indexed_search(credential, filter)
            .await?;
        self.metrics.search_page();
        Ok(page.total_results)
    }

    /// Run `task` until the index is exhausted, the search is denied, or `cancel` fires.
    ///
    /// The task must be the `preparing` head of `store`; anything else returns immediately.
    #[instrument(level = "debug", skip_all, fields(task = %task.id()))]
    pub async fn run(
        &self,
        task: &Task,
        cancel: &CancellationToken,
        store: &TaskStore,
    ) -> TaskOutcome {
        match store.state(task.id()) {
            Some(TaskState::Preparing) => {}
            Some(TaskState::Cancelled) | None => return TaskOutcome::Cancelled,
            Some(state) => {
                warn!(state = state.as_str(), "task is not ready to run");
                return TaskOutcome::Cancelled;
            }
        }

        self.metrics.task_started();
        info!(account = task.account(), "purge started");

        let outcome = self.run_pages(task, cancel, store).await;

        match &outcome {
            TaskOutcome::Completed => info!("purge completed"),
            TaskOutcome::Cancelled => info!("purge cancelled"),
            TaskOutcome::Denied => warn!("search denied, purge abandoned"),
            TaskOutcome::Failed { reason } => error!(%reason, "purge failed"),
        }
        self.metrics.task_finished(&outcome);
        outcome
    }

    async fn run_pages(
        &self,
        task: &Task,
        cancel: &CancellationToken,
        store: &TaskStore,
    ) -> TaskOutcome {
        let id = task.id();
        let mut cursor = Cursor::new();
        let mut ignored: HashSet<Snowflake> = HashSet::new();
        let mut total: Option<u64> = None;
        let mut started = false;

        loop {
            if cancel.is_cancelled() {
                return TaskOutcome::Cancelled;
            }

            let filter = task.filter().with_cursor(&cursor);
            let page = match self
                .poller
                .wait_for_indexed_search(task.credential(), &filter)
                .await
            {
                Ok(page) => page,
                Err(ClientError::PermanentDenial) => return TaskOutcome::Denied,
                Err(ClientError::Config(reason)) => return TaskOutcome::Failed { reason },
                Err(e) => {
                    // the poller's last failure was not followed by its own delay
                    debug!(error = %e, "search gave up, restarting page");
                    self.metrics.retry(RetryOp::Search);
                    tokio::time::sleep(self.config.search_retry.delay()).await;
                    continue;
                }
            };
            self.metrics.search_page();

            if !started {
                started = true;
                total = page.total_results;
                if !store.begin_progress(id, total) {
                    return TaskOutcome::Cancelled;
                }
                debug!(total = total.unwrap_or(0), "first page received");
            }

            if total.unwrap_or(0) == 0 || page.is_exhausted() {
                return TaskOutcome::Completed;
            }
            store.record_remaining(id, page.total_remaining());

            let hits = match page.hits() {
                Ok(hits) => hits,
                Err(e) => {
                    error!(error = %e, "search page violates the match-group contract");
                    return TaskOutcome::Failed {
                        reason: e.to_string(),
                    };
                }
            };
            trace!(
                hits = hits.len(),
                remaining = page.total_remaining(),
                "page received"
            );

            for hit in &hits {
                if ignored.contains(&hit.id) {
                    continue;
                }
                match self.delete_with_retry(task.credential(), hit, cancel).await {
                    DeleteResult::Deleted => {
                        cursor.advance(hit.id.clone());
                        self.metrics.message_deleted();
                        tokio::time::sleep(self.config.delete_pacing).await;
                        store.increment(id);
                    }
                    DeleteResult::Denied => {
                        debug!(message_id = %hit.id, "delete denied, ignoring message");
                        ignored.insert(hit.id.clone());
                        self.metrics.message_skipped();
                    }
                    DeleteResult::GaveUp => {
                        self.metrics.message_skipped();
                    }
                    DeleteResult::Cancelled => return TaskOutcome::Cancelled,
                    DeleteResult::Unusable(reason) => return TaskOutcome::Failed { reason },
                }
            }

            // A page made only of undeletable messages would be served again forever.
            if let Some(last) = hits.last()
                && hits.iter().all(|hit| ignored.contains(&hit.id))
                && cursor.get() != Some(last.id.as_str())
            {
                debug!(message_id = %last.id, "page fully ignored, moving cursor past it");
                cursor.advance(last.id.clone());
            }
        }
    }

    async fn delete_with_retry(
        &self,
        credential: &Credential,
        hit: &MessageHit,
        cancel: &CancellationToken,
    ) -> DeleteResult {
        let policy = self.config.delete_retry;
        let mut failures: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return DeleteResult::Cancelled;
            }

            match self
                .client
                .delete_message(credential, &hit.channel_id, &hit.id)
                .await
            {
                Ok(()) => {
                    trace!(message_id = %hit.id, "message deleted");
                    return DeleteResult::Deleted;
                }
                Err(ClientError::PermanentDenial) => return DeleteResult::Denied,
                Err(ClientError::Config(reason)) => return DeleteResult::Unusable(reason),
                Err(e) => {
                    failures = failures.saturating_add(1);
                    if !policy.allows_retry(failures) {
                        warn!(
                            message_id = %hit.id,
                            attempts = failures,
                            error = %e,
                            "delete keeps failing, skipping message"
                        );
                        return DeleteResult::GaveUp;
                    }
                    debug!(
                        message_id = %hit.id,
                        attempt = failures,
                        error = %e,
                        "delete failed, retrying"
                    );
                    self.metrics.retry(RetryOp::Delete);
                    tokio::time::sleep(policy.delay()).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, ScriptedClient, indexing_page, page};
    use purge_model::{FilterScope, RetryPolicy, SortOrder};

    fn task(sort: SortOrder) -> Task {
        let filter = SearchFilter::new(FilterScope::Guild, "100")
            .with_author("7")
            .with_sort(sort);
        Task::new("alice", Credential::new("secret"), filter).unwrap()
    }

    fn engine(client: Arc<ScriptedClient>) -> DeletionEngine {
        DeletionEngine::new(client).with_config(EngineConfig::immediate())
    }

    /// Push `task` into a fresh store and promote it the way the queue does.
    fn prepared(task: &Task) -> (TaskStore, CancellationToken) {
        let store = TaskStore::new();
        store.push(task.clone());
        let (_, cancel) = store.promote_head().unwrap();
        (store, cancel)
    }

    #[tokio::test]
    async fn zero_total_first_page_completes_without_deleting() {
        let client = ScriptedClient::new();
        client.push_search(Ok(page(0, &["1"])));
        let task = task(SortOrder::Newest);
        let (store, cancel) = prepared(&task);

        let outcome = engine(client.clone()).run(&task, &cancel, &store).await;

        assert_eq!(outcome, TaskOutcome::Completed);
        assert!(client.deleted().is_empty());
        let info = store.get(task.id()).unwrap();
        assert_eq!(info.state, TaskState::Progress);
        assert_eq!(info.total, Some(0));
    }

    #[tokio::test]
    async fn waits_for_index_before_deleting() {
        let client = ScriptedClient::new();
        client
            .push_search(Ok(indexing_page()))
            .push_search(Ok(indexing_page()))
            .push_search(Ok(page(1, &["11"])));
        let task = task(SortOrder::Newest);
        let (store, cancel) = prepared(&task);

        engine(client.clone()).run(&task, &cancel, &store).await;

        let calls = client.calls();
        assert!(matches!(calls[0], Call::Search(_)));
        assert!(matches!(calls[1], Call::Search(_)));
        assert!(matches!(calls[2], Call::Search(_)));
        assert_eq!(calls[3], Call::Delete("11".to_string()));
    }

    #[tokio::test]
    async fn cursor_feeds_max_id_when_newest_first() {
        let client = ScriptedClient::new();
        client
            .push_search(Ok(page(2, &["30", "20"])))
            .push_search(Ok(page(0, &[])));
        let task = task(SortOrder::Newest);
        let (store, cancel) = prepared(&task);

        engine(client.clone()).run(&task, &cancel, &store).await;

        let searched = client.searched();
        assert_eq!(searched[0].max_id, None);
        assert_eq!(searched[1].max_id.as_deref(), Some("20"));
        assert_eq!(searched[1].min_id, None);
    }

    #[tokio::test]
    async fn cursor_feeds_min_id_when_oldest_first() {
        let client = ScriptedClient::new();
        client
            .push_search(Ok(page(2, &["20", "30"])))
            .push_search(Ok(page(0, &[])));
        let task = task(SortOrder::Oldest);
        let (store, cancel) = prepared(&task);

        engine(client.clone()).run(&task, &cancel, &store).await;

        let searched = client.searched();
        assert_eq!(searched[0].min_id, None);
        assert_eq!(searched[1].min_id.as_deref(), Some("30"));
        assert_eq!(searched[1].max_id, None);
    }

    #[tokio::test]
    async fn denied_messages_are_never_retried_nor_counted() {
        let client = ScriptedClient::new();
        client
            .push_search(Ok(page(3, &["3", "2", "1"])))
            .push_search(Ok(page(1, &["2"])))
            .push_search(Ok(page(0, &[])));
        client.script_delete("2", vec![Err(ClientError::PermanentDenial)]);
        let task = task(SortOrder::Newest);
        let (store, cancel) = prepared(&task);

        let outcome = engine(client.clone()).run(&task, &cancel, &store).await;

        assert_eq!(outcome, TaskOutcome::Completed);
        assert_eq!(client.deleted(), vec!["3", "2", "1"]);
        let info = store.get(task.id()).unwrap();
        assert_eq!(info.total, Some(3));
        // 2 remains on the server and is never counted
        assert_eq!(info.current, Some(2));
    }

    #[tokio::test]
    async fn fully_ignored_page_moves_cursor() {
        let client = ScriptedClient::new();
        client
            .push_search(Ok(page(1, &["9"])))
            .push_search(Ok(page(1, &["9"])))
            .push_search(Ok(page(0, &[])));
        client.script_delete("9", vec![Err(ClientError::PermanentDenial)]);
        let task = task(SortOrder::Newest);
        let (store, cancel) = prepared(&task);

        engine(client.clone()).run(&task, &cancel, &store).await;

        assert_eq!(client.deleted(), vec!["9"]);
        let searched = client.searched();
        assert_eq!(searched[1].max_id.as_deref(), Some("9"));
    }

    #[tokio::test]
    async fn transient_delete_failures_are_retried_until_success() {
        let client = ScriptedClient::new();
        client
            .push_search(Ok(page(1, &["5"])))
            .push_search(Ok(page(0, &[])));
        client.script_delete(
            "5",
            vec![
                Err(ClientError::TransientFailure("429".into())),
                Err(ClientError::TransientFailure("502".into())),
                Ok(()),
            ],
        );
        let task = task(SortOrder::Newest);
        let (store, cancel) = prepared(&task);

        engine(client.clone()).run(&task, &cancel, &store).await;

        assert_eq!(client.deleted(), vec!["5", "5", "5"]);
        assert_eq!(store.get(task.id()).unwrap().current, Some(1));
    }

    #[tokio::test]
    async fn capped_delete_retry_skips_the_message() {
        let client = ScriptedClient::new();
        client
            .push_search(Ok(page(2, &["6", "5"])))
            .push_search(Ok(page(0, &[])));
        client.script_delete(
            "6",
            vec![
                Err(ClientError::TransientFailure("a".into())),
                Err(ClientError::TransientFailure("b".into())),
            ],
        );
        let task = task(SortOrder::Newest);
        let (store, cancel) = prepared(&task);

        let config = EngineConfig::immediate()
            .with_delete_retry(RetryPolicy::immediate().with_max_attempts(2));
        let engine = DeletionEngine::new(client.clone()).with_config(config);
        let outcome = engine.run(&task, &cancel, &store).await;

        assert_eq!(outcome, TaskOutcome::Completed);
        assert_eq!(client.deleted(), vec!["6", "6", "5"]);
    }

    #[tokio::test]
    async fn search_denial_abandons_task() {
        let client = ScriptedClient::new();
        client.push_search(Err(ClientError::PermanentDenial));
        let task = task(SortOrder::Newest);
        let (store, cancel) = prepared(&task);

        let outcome = engine(client.clone()).run(&task, &cancel, &store).await;

        assert_eq!(outcome, TaskOutcome::Denied);
        assert!(client.deleted().is_empty());
    }

    #[tokio::test]
    async fn config_error_fails_the_task_without_retrying() {
        let client = ScriptedClient::new();
        client
            .push_search(Ok(page(2, &["2", "1"])))
            .push_search(Ok(page(1, &["1"])));
        client.script_delete("2", vec![Err(ClientError::Config("bad header".into()))]);
        let task = task(SortOrder::Newest);
        let (store, cancel) = prepared(&task);

        let outcome = engine(client.clone()).run(&task, &cancel, &store).await;

        assert_eq!(
            outcome,
            TaskOutcome::Failed {
                reason: "bad header".to_string()
            }
        );
        assert_eq!(client.deleted(), vec!["2"]);
        assert_eq!(client.searched().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn capped_search_retry_waits_before_restarting_page() {
        let client = ScriptedClient::new();
        client
            .push_search(Err(ClientError::TransientFailure("502".into())))
            .push_search(Ok(page(0, &[])));
        let task = task(SortOrder::Newest);
        let (store, cancel) = prepared(&task);

        let config = EngineConfig::default()
            .with_search_retry(RetryPolicy::fixed(1000).with_max_attempts(1));
        let started = tokio::time::Instant::now();
        let outcome = DeletionEngine::new(client.clone())
            .with_config(config)
            .run(&task, &cancel, &store)
            .await;

        assert_eq!(outcome, TaskOutcome::Completed);
        assert_eq!(client.searched().len(), 2);
        assert!(started.elapsed() >= std::time::Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn group_without_hit_fails_the_task() {
        let client = ScriptedClient::new();
        let mut bad = page(1, &["1"]);
        if let Some(groups) = bad.messages.as_mut() {
            groups[0].0[0].hit = false;
        }
        client.push_search(Ok(bad));
        let task = task(SortOrder::Newest);
        let (store, cancel) = prepared(&task);

        let outcome = engine(client.clone()).run(&task, &cancel, &store).await;

        assert!(matches!(outcome, TaskOutcome::Failed { .. }));
        assert!(client.deleted().is_empty());
    }

    #[tokio::test]
    async fn cancel_while_running_stops_after_in_flight_delete() {
        let client = ScriptedClient::new();
        client.push_search(Ok(page(3, &["3", "2", "1"])));
        let task = task(SortOrder::Newest);
        let (store, cancel) = prepared(&task);

        let hook_store = store.clone();
        let id = task.id().clone();
        client.on_delete(move |message| {
            if message == "3" {
                hook_store.cancel(&id).unwrap();
            }
        });

        let outcome = engine(client.clone()).run(&task, &cancel, &store).await;

        assert_eq!(outcome, TaskOutcome::Cancelled);
        assert_eq!(client.deleted(), vec!["3"]);
        assert_eq!(store.state(task.id()), Some(TaskState::Cancelled));
    }

    #[tokio::test]
    async fn refuses_to_run_a_task_that_is_not_preparing() {
        let client = ScriptedClient::new();
        let task = task(SortOrder::Newest);
        let store = TaskStore::new();
        store.push(task.clone());

        let outcome = engine(client.clone())
            .run(&task, &CancellationToken::new(), &store)
            .await;

        assert_eq!(outcome, TaskOutcome::Cancelled);
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn progress_follows_remaining_count() {
        let client = ScriptedClient::new();
        client
            .push_search(Ok(page(5, &["50", "49"])))
            // someone else removed two messages in the meantime
            .push_search(Ok(page(1, &["46"])))
            .push_search(Ok(page(0, &[])));
        let task = task(SortOrder::Newest);
        let (store, cancel) = prepared(&task);
        let mut sub = store.subscribe();

        engine(client.clone()).run(&task, &cancel, &store).await;

        let mut currents = Vec::new();
        while let Some(event) = sub.try_next() {
            if let crate::QueueEvent::Progress { current, total, .. } = event {
                assert_eq!(total, 5);
                currents.push(current);
            }
        }
        assert!(currents.windows(2).all(|w| w[0] <= w[1]), "{currents:?}");
        assert_eq!(currents.last(), Some(&5));
        assert_eq!(store.get(task.id()).unwrap().current, Some(5));
    }

    #[tokio::test]
    async fn three_page_purge_end_to_end() {
        let client = ScriptedClient::new();
        client
            .push_search(Ok(indexing_page()))
            .push_search(Ok(page(5, &["105", "104"])))
            .push_search(Err(ClientError::TransientFailure("429".into())))
            .push_search(Ok(page(3, &["103", "102"])))
            .push_search(Ok(page(1, &["101"])))
            .push_search(Ok(page(0, &[])));
        client.script_delete(
            "102",
            vec![Err(ClientError::TransientFailure("500".into())), Ok(())],
        );
        let task = task(SortOrder::Newest);
        let (store, cancel) = prepared(&task);

        let outcome = engine(client.clone()).run(&task, &cancel, &store).await;

        assert_eq!(outcome, TaskOutcome::Completed);
        assert_eq!(
            client.deleted(),
            vec!["105", "104", "103", "102", "102", "101"]
        );
        let max_ids: Vec<_> = client
            .searched()
            .into_iter()
            .map(|filter| filter.max_id)
            .collect();
        assert_eq!(
            max_ids,
            vec![
                None,
                None,
                Some("104".to_string()),
                Some("104".to_string()),
                Some("102".to_string()),
                Some("101".to_string()),
            ]
        );
        let info = store.get(task.id()).unwrap();
        assert_eq!(info.total, Some(5));
        assert_eq!(info.current, Some(5));
    }

    #[tokio::test]
    async fn count_matches_reports_total() {
        let client = ScriptedClient::new();
        client
            .push_search(Ok(indexing_page()))
            .push_search(Ok(page(42, &["1"])));

        let count = engine(client.clone())
            .count_matches(
                &Credential::new("secret"),
                &SearchFilter::new(FilterScope::Channel, "9"),
            )
            .await
            .unwrap();

        assert_eq!(count, Some(42));
        assert!(client.deleted().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn default_pacing_spaces_deletes() {
        let client = ScriptedClient::new();
        client
            .push_search(Ok(page(2, &["2", "1"])))
            .push_search(Ok(page(0, &[])));
        let task = task(SortOrder::Newest);
        let (store, cancel) = prepared(&task);

        let started = tokio::time::Instant::now();
        DeletionEngine::new(client.clone())
            .run(&task, &cancel, &store)
            .await;

        assert!(started.elapsed() >= std::time::Duration::from_millis(400));
        assert_eq!(client.deleted(), vec!["2", "1"]);
    }
}
