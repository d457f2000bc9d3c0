//! HTTP middleware: request metrics and request tracing.

pub mod metrics;
pub mod tracing_layer;
