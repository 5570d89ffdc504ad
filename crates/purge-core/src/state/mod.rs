mod subscriber;
pub use subscriber::StateSubscriber;

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::SystemTime,
};

use purge_model::{Task, TaskId, TaskInfo, TaskOutcome, TaskPage, TaskQuery, TaskState};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::{error::CoreError, event::QueueEvent};

const EVENT_CAPACITY: usize = 1024;

/// In-memory queue state: task order plus the mutable fields of every task.
///
/// Every mutation happens under one write lock and publishes its [`QueueEvent`] before
/// the lock is released, so subscribers see events in the order the changes were applied.
/// Readers get cloned [`TaskInfo`] snapshots.
#[derive(Clone)]
pub struct TaskStore {
    inner: Arc<RwLock<StoreInner>>,
    events: broadcast::Sender<QueueEvent>,
}

struct StoreInner {
    /// FIFO order; the front is the head.
    order: VecDeque<TaskId>,
    entries: HashMap<TaskId, Entry>,
}

struct Entry {
    task: Arc<Task>,
    info: TaskInfo,
    cancel: CancellationToken,
}

impl Entry {
    fn touch(&mut self) {
        self.info.updated_at = SystemTime::now();
    }
}

impl TaskStore {
    /// Create an empty store.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(RwLock::new(StoreInner {
                order: VecDeque::new(),
                entries: HashMap::new(),
            })),
            events,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreInner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreInner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, events: impl IntoIterator<Item = QueueEvent>) {
        for event in events {
            // No receivers is fine.
            let _ = self.events.send(event);
        }
    }

    /// Append a task as `queued`. Returns `true` if the queue was empty before.
    pub fn push(&self, task: Task) -> bool {
        let id = task.id().clone();
        let now = SystemTime::now();
        let info = TaskInfo {
            id: id.clone(),
            account: task.account().to_string(),
            description: task.description().to_string(),
            state: TaskState::Queued,
            current: None,
            total: None,
            created_at: now,
            updated_at: now,
        };

        let mut inner = self.write();
        let was_empty = inner.order.is_empty();
        inner.order.push_back(id.clone());
        inner.entries.insert(
            id.clone(),
            Entry {
                task: Arc::new(task),
                info,
                cancel: CancellationToken::new(),
            },
        );

        self.publish([QueueEvent::TaskQueued { id }]);
        was_empty
    }

    /// Move the head from `queued` to `preparing` and hand it out for execution.
    ///
    /// Returns `None` when the queue is empty or the head is already taken, so only one
    /// caller can ever run the head.
    pub fn promote_head(&self) -> Option<(Arc<Task>, CancellationToken)> {
        let mut inner = self.write();
        let head = inner.order.front()?.clone();
        let entry = inner.entries.get_mut(&head)?;
        if entry.info.state != TaskState::Queued {
            return None;
        }
        entry.info.state = TaskState::Preparing;
        entry.touch();
        let claimed = (Arc::clone(&entry.task), entry.cancel.clone());

        self.publish([QueueEvent::StateChanged {
            id: head,
            state: TaskState::Preparing,
        }]);
        Some(claimed)
    }

    /// Record the first page: set `total`, reset `current` and switch to `progress`.
    ///
    /// Returns `false` without touching anything if the task is no longer `preparing`.
    pub fn begin_progress(&self, id: &TaskId, total: Option<u64>) -> bool {
        let mut inner = self.write();
        let Some(entry) = inner.entries.get_mut(id) else {
            return false;
        };
        if entry.info.state != TaskState::Preparing {
            return false;
        }
        entry.info.total = total;
        entry.info.current = Some(0);
        entry.info.state = TaskState::Progress;
        entry.touch();

        self.publish([QueueEvent::StateChanged {
            id: id.clone(),
            state: TaskState::Progress,
        }]);
        if let Some(total) = total {
            self.publish([QueueEvent::Progress {
                id: id.clone(),
                current: 0,
                total,
            }]);
        }
        true
    }

    /// Derive `current` from the server's remaining count: `total - remaining`.
    ///
    /// The result is clamped to `total` and never lowers `current`.
    pub fn record_remaining(&self, id: &TaskId, remaining: u64) {
        self.update_current(id, |current, total| {
            current.max(total.saturating_sub(remaining).min(total))
        });
    }

    /// Count one deleted message, never exceeding `total`.
    pub fn increment(&self, id: &TaskId) {
        self.update_current(id, |current, total| current.saturating_add(1).min(total));
    }

    fn update_current(&self, id: &TaskId, next: impl FnOnce(u64, u64) -> u64) {
        let mut inner = self.write();
        let Some(entry) = inner.entries.get_mut(id) else {
            return;
        };
        let (Some(current), Some(total)) = (entry.info.current, entry.info.total) else {
            return;
        };
        let updated = next(current, total);
        if updated == current {
            return;
        }
        entry.info.current = Some(updated);
        entry.touch();

        self.publish([QueueEvent::Progress {
            id: id.clone(),
            current: updated,
            total,
        }]);
    }

    /// Request cancellation and return the state the task was in.
    ///
    /// A queued task is removed at once. A running task is marked `cancelled` and its token
    /// fired; it stays at the head until the queue removes it.
    pub fn cancel(&self, id: &TaskId) -> Result<TaskState, CoreError> {
        let mut inner = self.write();
        let Some(entry) = inner.entries.get_mut(id) else {
            return Err(CoreError::TaskNotFound(id.clone()));
        };
        let previous = entry.info.state;

        match previous {
            TaskState::Queued => {
                inner.entries.remove(id);
                inner.order.retain(|queued| queued != id);
                self.publish([QueueEvent::TaskRemoved {
                    id: id.clone(),
                    outcome: TaskOutcome::Cancelled,
                }]);
            }
            TaskState::Preparing | TaskState::Progress => {
                entry.info.state = TaskState::Cancelled;
                entry.touch();
                entry.cancel.cancel();
                self.publish([QueueEvent::StateChanged {
                    id: id.clone(),
                    state: TaskState::Cancelled,
                }]);
            }
            TaskState::Cancelled => {}
        }
        Ok(previous)
    }

    /// Drop a task from the queue, publishing why it left.
    pub fn remove(&self, id: &TaskId, outcome: TaskOutcome) -> Option<TaskInfo> {
        let mut inner = self.write();
        let removed = inner.entries.remove(id)?;
        inner.order.retain(|queued| queued != id);

        self.publish([QueueEvent::TaskRemoved {
            id: id.clone(),
            outcome,
        }]);
        Some(removed.info)
    }

    /// Current state of a task.
    pub fn state(&self, id: &TaskId) -> Option<TaskState> {
        self.read().entries.get(id).map(|entry| entry.info.state)
    }

    /// Get task info by ID.
    pub fn get(&self, id: &TaskId) -> Option<TaskInfo> {
        self.read().entries.get(id).map(|entry| entry.info.clone())
    }

    /// All tasks in queue order, head first.
    pub fn list(&self) -> Vec<TaskInfo> {
        let inner = self.read();
        inner
            .order
            .iter()
            .filter_map(|id| inner.entries.get(id))
            .map(|entry| entry.info.clone())
            .collect()
    }

    /// Query tasks in queue order with an optional state filter and pagination.
    ///
    /// `total` in the result counts matches *before* pagination.
    pub fn query(&self, q: &TaskQuery) -> TaskPage<TaskInfo> {
        let inner = self.read();

        let filtered: Vec<&TaskInfo> = inner
            .order
            .iter()
            .filter_map(|id| inner.entries.get(id))
            .map(|entry| &entry.info)
            .filter(|info| q.state.is_none_or(|state| info.state == state))
            .collect();
        let total = filtered.len();

        let items = filtered
            .into_iter()
            .skip(q.offset)
            .take(q.limit)
            .cloned()
            .collect();

        TaskPage { items, total }
    }

    pub fn len(&self) -> usize {
        self.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().order.is_empty()
    }

    /// Receive every event published from now on.
    pub fn subscribe(&self) -> StateSubscriber {
        StateSubscriber::new(self.events.subscribe())
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}
