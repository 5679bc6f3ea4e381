// src/observability/mod.rs
//! Tracing integration.
//!
//! - **Span**: the minimal span seam the layer consumes, plus its
//!   OpenTelemetry binding
//! - **Semantic**: span attribute key conventions

pub mod semantic;
pub mod span;

// Re-export commonly used types
pub use span::{OtelSpanSink, OtelSpanSource, SpanSource, TraceSink};
