mod credential;
pub use credential::Credential;

mod task;
pub use task::Task;

mod task_id;
pub use task_id::TaskId;

mod task_info;
pub use task_info::TaskInfo;

mod task_outcome;
pub use task_outcome::TaskOutcome;

mod task_query;
pub use task_query::{TaskPage, TaskQuery};

mod task_state;
pub use task_state::TaskState;

/// Identifier of a remote message, channel, guild or user.
///
/// The platform encodes these as decimal snowflakes carried in JSON strings.
pub type Snowflake = String;

/// Returns `true` if `value` looks like a decimal snowflake.
pub fn is_snowflake(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}
