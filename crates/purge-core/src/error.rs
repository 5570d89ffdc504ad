use purge_model::{ModelError, TaskId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    #[error(transparent)]
    InvalidTask(#[from] ModelError),
}
