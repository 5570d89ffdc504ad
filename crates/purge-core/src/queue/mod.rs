use std::sync::Arc;

use purge_client::ClientError;
use purge_model::{
    Credential, SearchFilter, Task, TaskId, TaskInfo, TaskPage, TaskQuery, TaskState,
};
use tracing::{debug, info, instrument};

use crate::{
    engine::DeletionEngine,
    error::CoreError,
    state::{StateSubscriber, TaskStore},
};

/// FIFO of purge tasks with exactly one task running at a time.
///
/// Cloning is cheap; clones share the same store and engine.
#[derive(Clone)]
pub struct TaskQueue {
    store: TaskStore,
    engine: Arc<DeletionEngine>,
}

impl TaskQueue {
    pub fn new(engine: DeletionEngine) -> Self {
        Self {
            store: TaskStore::new(),
            engine: Arc::new(engine),
        }
    }

    /// Append `task` and return its id.
    ///
    /// If the queue was empty a driver is spawned on the current tokio runtime; the call
    /// itself never waits for the task to run.
    #[instrument(level = "debug", skip_all, fields(task = %task.id()))]
    pub fn enqueue(&self, task: Task) -> TaskId {
        let id = task.id().clone();
        let was_empty = self.store.push(task);
        info!(position = self.store.len(), "task queued");

        if was_empty {
            let queue = self.clone();
            tokio::spawn(async move { queue.advance().await });
        }
        id
    }

    /// Run queued tasks one after another until the queue is empty.
    ///
    /// Returns at once if the head is already running, so concurrent calls are harmless.
    pub async fn advance(&self) {
        while let Some((task, cancel)) = self.store.promote_head() {
            debug!(task = %task.id(), "task promoted to head");
            let outcome = self.engine.run(&task, &cancel, &self.store).await;
            self.store.remove(task.id(), outcome);
        }
    }

    /// Cancel a task.
    ///
    /// A queued task is dropped without any remote call. A running task stops at its next
    /// checkpoint; a request already in flight is allowed to finish.
    pub fn cancel(&self, id: &TaskId) -> Result<(), CoreError> {
        let previous = self.store.cancel(id)?;
        match previous {
            TaskState::Queued => info!(task = %id, "queued task cancelled"),
            TaskState::Preparing | TaskState::Progress => {
                info!(task = %id, "cancellation requested for running task")
            }
            TaskState::Cancelled => debug!(task = %id, "task already cancelling"),
        }
        Ok(())
    }

    /// Preview how many messages `filter` matches right now.
    pub async fn count_matches(
        &self,
        credential: &Credential,
        filter: &SearchFilter,
    ) -> Result<Option<u64>, ClientError> {
        self.engine.count_matches(credential, filter).await
    }

    /// All tasks, head first.
    pub fn snapshot(&self) -> Vec<TaskInfo> {
        self.store.list()
    }

    pub fn get(&self, id: &TaskId) -> Option<TaskInfo> {
        self.store.get(id)
    }

    pub fn query(&self, q: &TaskQuery) -> TaskPage<TaskInfo> {
        self.store.query(q)
    }

    pub fn subscribe(&self) -> StateSubscriber {
        self.store.subscribe()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineConfig;
    use crate::event::QueueEvent;
    use crate::testing::{ScriptedClient, page};
    use purge_model::{FilterScope, TaskOutcome};
    use std::time::Duration;

    fn task(target: &str) -> Task {
        Task::new(
            "alice",
            Credential::new("secret"),
            SearchFilter::new(FilterScope::Channel, target),
        )
        .unwrap()
    }

    fn queue(client: Arc<ScriptedClient>) -> TaskQueue {
        TaskQueue::new(DeletionEngine::new(client).with_config(EngineConfig::immediate()))
    }

    async fn wait_removed(sub: &mut StateSubscriber, id: &TaskId) -> TaskOutcome {
        let wait = async {
            loop {
                match sub.recv().await {
                    Some(QueueEvent::TaskRemoved { id: removed, outcome }) if &removed == id => {
                        return outcome;
                    }
                    Some(_) => continue,
                    None => panic!("store dropped"),
                }
            }
        };
        tokio::time::timeout(Duration::from_secs(5), wait)
            .await
            .expect("task was not removed in time")
    }

    #[tokio::test]
    async fn runs_tasks_in_fifo_order() {
        let client = ScriptedClient::new();
        client
            .push_search(Ok(page(1, &["1"])))
            .push_search(Ok(page(0, &[])))
            .push_search(Ok(page(1, &["2"])))
            .push_search(Ok(page(0, &[])));
        let queue = queue(client.clone());
        let mut sub = queue.subscribe();

        let first = queue.enqueue(task("10"));
        let second = queue.enqueue(task("20"));

        assert_eq!(wait_removed(&mut sub, &first).await, TaskOutcome::Completed);
        assert_eq!(wait_removed(&mut sub, &second).await, TaskOutcome::Completed);

        let targets: Vec<_> = client
            .searched()
            .into_iter()
            .map(|filter| filter.target_id)
            .collect();
        assert_eq!(targets, vec!["10", "10", "20", "20"]);
        assert_eq!(client.deleted(), vec!["1", "2"]);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn cancelling_queued_task_makes_no_calls() {
        let client = ScriptedClient::new();
        let queue = queue(client.clone());

        // fill the store directly so nothing is driving it yet
        let first = task("10");
        let second = task("20");
        let (first_id, second_id) = (first.id().clone(), second.id().clone());
        queue.store.push(first);
        queue.store.push(second);

        queue.cancel(&second_id).unwrap();
        assert!(queue.get(&second_id).is_none());

        queue.advance().await;

        assert!(queue.get(&first_id).is_none());
        assert!(
            client
                .searched()
                .iter()
                .all(|filter| filter.target_id == "10")
        );
    }

    #[tokio::test]
    async fn cancelling_running_task_advances_to_next() {
        let client = ScriptedClient::new();
        client
            .push_search(Ok(page(3, &["3", "2", "1"])))
            .push_search(Ok(page(1, &["9"])))
            .push_search(Ok(page(0, &[])));
        let queue = queue(client.clone());
        let mut sub = queue.subscribe();

        let running = task("10");
        let running_id = running.id().clone();
        let hook_queue = queue.clone();
        let hook_id = running_id.clone();
        client.on_delete(move |message| {
            if message == "3" {
                hook_queue.cancel(&hook_id).unwrap();
            }
        });

        queue.enqueue(running);
        let next = queue.enqueue(task("20"));

        assert_eq!(
            wait_removed(&mut sub, &running_id).await,
            TaskOutcome::Cancelled
        );
        assert_eq!(wait_removed(&mut sub, &next).await, TaskOutcome::Completed);
        assert_eq!(client.deleted(), vec!["3", "9"]);
    }

    #[tokio::test]
    async fn advance_is_a_no_op_while_head_runs() {
        let client = ScriptedClient::new();
        let queue = queue(client.clone());
        let t = task("10");
        let id = t.id().clone();
        queue.store.push(t);
        queue.store.promote_head().unwrap();

        queue.advance().await;

        assert_eq!(queue.get(&id).unwrap().state, TaskState::Preparing);
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_task_cannot_be_cancelled() {
        let queue = queue(ScriptedClient::new());
        let err = queue.cancel(&TaskId::from("missing")).unwrap_err();
        assert_eq!(err, CoreError::TaskNotFound(TaskId::from("missing")));
    }

    #[tokio::test]
    async fn query_exposes_queued_tasks() {
        let queue = queue(ScriptedClient::new());
        queue.store.push(task("10"));
        queue.store.push(task("20"));

        let page = queue.query(&TaskQuery::new().with_state(TaskState::Queued));
        assert_eq!(page.total, 2);
        assert_eq!(queue.snapshot().len(), 2);
    }
}
