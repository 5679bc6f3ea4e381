// src/observability/span.rs
//! Span sink seam.
//!
//! The capture layer needs exactly one thing from a tracing span: string
//! attributes. [`TraceSink`] is that seam; [`SpanSource`] produces the
//! sink for the exchange currently being processed. The OpenTelemetry
//! binding snapshots the active context at entry, so the completion path
//! writes to the same span from whichever thread finishes the exchange.

use opentelemetry::trace::TraceContextExt;
use opentelemetry::{Context, KeyValue};

/// Write-only view of a tracing span.
pub trait TraceSink: Send {
    /// Set a string attribute on the span.
    fn set_attribute(&mut self, key: String, value: String);
}

/// Produces the span sink for the exchange entering the layer.
pub trait SpanSource: Send + Sync {
    fn current_span(&self) -> Box<dyn TraceSink + Send>;
}

/// Sink bound to the span of a captured OpenTelemetry context.
pub struct OtelSpanSink {
    cx: Context,
}

impl OtelSpanSink {
    /// Bind to the span active on the calling thread.
    pub fn current() -> Self {
        Self {
            cx: Context::current(),
        }
    }
}

impl TraceSink for OtelSpanSink {
    fn set_attribute(&mut self, key: String, value: String) {
        self.cx.span().set_attribute(KeyValue::new(key, value));
    }
}

/// [`SpanSource`] reading the active OpenTelemetry context.
#[derive(Debug, Default, Clone, Copy)]
pub struct OtelSpanSource;

impl SpanSource for OtelSpanSource {
    fn current_span(&self) -> Box<dyn TraceSink + Send> {
        Box::new(OtelSpanSink::current())
    }
}
