//! Prometheus metrics backend for the purge engine.
//!
//! [`PrometheusMetrics`] implements [`purge_core::MetricsBackend`] and keeps its own
//! [`Registry`].
//!
//! ## Example
//! ```rust,ignore
//! use std::sync::Arc;
//! use purge_core::DeletionEngine;
//! use purge_prometheus::PrometheusMetrics;
//!
//! let metrics = PrometheusMetrics::new()?;
//! let engine = DeletionEngine::new(client).with_metrics(Arc::new(metrics.clone()));
//!
//! // later, from whatever serves /metrics
//! let text = metrics.encode_text()?;
//! ```
//!
//! ## Metrics
//! - `purge_tasks_started_total` - Counter
//! - `purge_tasks_finished_total{outcome}` - Counter
//! - `purge_messages_deleted_total` - Counter
//! - `purge_messages_skipped_total` - Counter
//! - `purge_search_pages_total` - Counter
//! - `purge_retries_total{op}` - Counter
//!
//! This crate does not serve HTTP; expose [`PrometheusMetrics::gather`] from your own server.

mod backend;
pub use backend::PrometheusMetrics;

pub use prometheus::{Encoder, Registry, TextEncoder};
