use purge_core::QueueEvent;
use purge_model::{TaskOutcome, TaskState};
use tracing::{debug, error, info, trace, warn};

#[inline]
pub fn message_for(event: &QueueEvent) -> &'static str {
    match event {
        QueueEvent::TaskQueued { .. } => "task queued",
        QueueEvent::StateChanged { state, .. } => match state {
            TaskState::Queued => "task back in queue",
            TaskState::Preparing => "task is preparing (waiting for the first page)",
            TaskState::Progress => "task is deleting messages",
            TaskState::Cancelled => "task cancellation requested",
        },
        QueueEvent::Progress { .. } => "task progress",
        QueueEvent::TaskRemoved { outcome, .. } => match outcome {
            TaskOutcome::Completed => "task removed (no matches left)",
            TaskOutcome::Cancelled => "task removed (cancelled)",
            TaskOutcome::Denied => "task removed (search denied)",
            TaskOutcome::Failed { .. } => "task removed (failed)",
        },
    }
}

#[inline]
pub fn log_event(event: &QueueEvent) {
    let msg = message_for(event);
    let task = event.task_id().as_str();

    match event {
        QueueEvent::TaskQueued { .. } => debug!(task, "{msg}"),

        QueueEvent::StateChanged { state, .. } => match state {
            TaskState::Cancelled => info!(task, state = state.as_str(), "{msg}"),
            _ => debug!(task, state = state.as_str(), "{msg}"),
        },

        QueueEvent::Progress { current, total, .. } => {
            trace!(task, current, total, "{msg}")
        }

        QueueEvent::TaskRemoved { outcome, .. } => match outcome {
            TaskOutcome::Completed | TaskOutcome::Cancelled => {
                info!(task, outcome = outcome.as_str(), "{msg}")
            }
            TaskOutcome::Denied => warn!(task, outcome = outcome.as_str(), "{msg}"),
            TaskOutcome::Failed { reason } => {
                error!(task, outcome = outcome.as_str(), reason = %reason, "{msg}")
            }
        },
    }
}
