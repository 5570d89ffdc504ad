use serde::{Deserialize, Serialize};

/// Lifecycle state of a task while it sits in the queue.
///
/// `queued → preparing → progress → (removed)`, or any of the first three `→ cancelled → (removed)`.
/// Completion is not a state: a finished task is simply removed from the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskState {
    /// Waiting behind the queue head.
    Queued,
    /// Promoted to head; the first search page has not been received yet.
    Preparing,
    /// Deleting; `total` is known.
    Progress,
    /// Cancellation requested while running; removed on the next advance.
    Cancelled,
}

impl TaskState {
    /// Returns `true` for the states only the queue head can be in.
    pub fn is_running(&self) -> bool {
        matches!(self, TaskState::Preparing | TaskState::Progress)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Queued => "queued",
            TaskState::Preparing => "preparing",
            TaskState::Progress => "progress",
            TaskState::Cancelled => "cancelled",
        }
    }
}
