//! Domain types shared by the purge crates.
//!
//! Everything here is plain data: tasks and their lifecycle states, the typed search filter,
//! the wire shape of a search page and the retry policies that drive the engine.

mod error;
pub use error::ModelError;

mod domain;
pub use domain::*;

mod search;
pub use search::*;

mod retry;
pub use retry::RetryPolicy;
