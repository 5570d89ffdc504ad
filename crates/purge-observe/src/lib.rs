//! Logging setup for purge binaries.
//!
//! `logger_init` installs the global `tracing` subscriber. With the `subscriber` feature the
//! crate also turns queue events into log lines.

mod logger;
pub use logger::*;

#[cfg(feature = "subscriber")]
mod subscriber;
#[cfg(feature = "subscriber")]
pub use subscriber::*;
