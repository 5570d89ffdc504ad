mod view;
pub use view::{log_event, message_for};

use purge_core::StateSubscriber;
use tokio::task::JoinHandle;

/// Log every queue event until the queue is dropped.
pub fn spawn_queue_logger(mut events: StateSubscriber) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            log_event(&event);
        }
    })
}
