use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
    #[error("invalid task: {0}")]
    InvalidTask(String),
    #[error("match group for message {first_id} has no hit record")]
    MissingHit { first_id: String },
    #[error("empty match group")]
    EmptyGroup,
}
