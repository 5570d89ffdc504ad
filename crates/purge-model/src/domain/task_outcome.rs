use serde::{Deserialize, Serialize};

/// Why a task left the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum TaskOutcome {
    /// The search index reported no remaining matches.
    Completed,
    /// Cancelled by the caller, either while queued or while running.
    Cancelled,
    /// The search itself was refused; the target is not accessible with this credential.
    Denied,
    /// The remote broke its contract and the run was abandoned.
    Failed { reason: String },
}

impl TaskOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskOutcome::Completed => "completed",
            TaskOutcome::Cancelled => "cancelled",
            TaskOutcome::Denied => "denied",
            TaskOutcome::Failed { .. } => "failed",
        }
    }
}
