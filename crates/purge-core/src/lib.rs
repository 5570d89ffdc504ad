//! Task queue and deletion engine.
//!
//! [`TaskQueue`] owns a [`TaskStore`] and runs one task at a time through the
//! [`DeletionEngine`]; observers read snapshots or subscribe to [`QueueEvent`]s.

pub mod error;
pub use error::CoreError;

mod event;
pub use event::QueueEvent;

mod metrics;
pub use metrics::{MetricsBackend, MetricsHandle, NoOpMetrics, RetryOp};

pub mod state;
pub use state::{StateSubscriber, TaskStore};

pub mod engine;
pub use engine::{DeletionEngine, EngineConfig};

pub mod queue;
pub use queue::TaskQueue;

#[cfg(test)]
mod testing;
