use purge_model::{TaskId, TaskOutcome, TaskState};

/// Change notification published by the [`TaskStore`](crate::TaskStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueEvent {
    /// Task appended to the tail of the queue.
    TaskQueued { id: TaskId },
    /// Lifecycle state changed.
    StateChanged { id: TaskId, state: TaskState },
    /// Counters moved.
    Progress { id: TaskId, current: u64, total: u64 },
    /// Task left the queue.
    TaskRemoved { id: TaskId, outcome: TaskOutcome },
}

impl QueueEvent {
    pub fn task_id(&self) -> &TaskId {
        match self {
            QueueEvent::TaskQueued { id }
            | QueueEvent::StateChanged { id, .. }
            | QueueEvent::Progress { id, .. }
            | QueueEvent::TaskRemoved { id, .. } => id,
        }
    }
}
