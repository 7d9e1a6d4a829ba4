//! Observability for Oneul.
//!
//! This crate provides:
//! - Log/trace subscriber setup (stdout, optional JSON, optional OTLP export)
//! - Prometheus metrics recorder and request metrics helpers

pub mod metrics;
pub mod tracing_layer;

pub use metrics::{setup_metrics_recorder, track_request};
pub use tracing_layer::configure_tracing;
