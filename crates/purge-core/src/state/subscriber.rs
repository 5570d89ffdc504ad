use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::warn;

use crate::event::QueueEvent;

/// Receiving end of the store's event stream.
///
/// A slow subscriber that falls behind loses the oldest events; the gap is logged and the
/// stream continues. Read [`TaskStore::list`](crate::TaskStore::list) to resynchronise.
pub struct StateSubscriber {
    rx: broadcast::Receiver<QueueEvent>,
}

impl StateSubscriber {
    pub(crate) fn new(rx: broadcast::Receiver<QueueEvent>) -> Self {
        Self { rx }
    }

    /// Wait for the next event. Returns `None` once the store is gone.
    pub async fn recv(&mut self) -> Option<QueueEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "queue subscriber lagged behind");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next already buffered event, without waiting.
    pub fn try_next(&mut self) -> Option<QueueEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "queue subscriber lagged behind");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }
}
