use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::{TaskId, TaskState};

/// Point-in-time view of a queued or running task.
///
/// This is what observers read; it never carries the credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInfo {
    /// Unique task identifier.
    pub id: TaskId,
    /// Account label the task acts for.
    pub account: String,
    /// Human readable description.
    pub description: String,
    /// Current lifecycle state.
    pub state: TaskState,
    /// Messages processed so far (set once the run starts).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<u64>,
    /// Matches reported by the first search page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    /// When the task was enqueued.
    #[serde(with = "time_serde")]
    pub created_at: SystemTime,
    /// When any field above last changed.
    #[serde(with = "time_serde")]
    pub updated_at: SystemTime,
}

impl TaskInfo {
    /// Fraction of work done in `0.0..=1.0`, once both counters are known.
    pub fn ratio(&self) -> Option<f64> {
        match (self.current, self.total) {
            (Some(current), Some(total)) if total > 0 => Some(current as f64 / total as f64),
            _ => None,
        }
    }
}

mod time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let since_epoch = time
            .duration_since(UNIX_EPOCH)
            .map_err(serde::ser::Error::custom)?;
        since_epoch.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(UNIX_EPOCH + std::time::Duration::from_secs(secs))
    }
}
