// src/lib.rs
//! Spantap: transparent HTTP exchange capture for distributed tracing.
//!
//! This library sits inside a host server's request-processing pipeline
//! and records each exchange onto the active tracing span without
//! changing what the application reads or writes.
//!
//! # Architecture
//!
//! The crate is structured into three key modules:
//!
//! - **capture**: pass-through stream proxies and the dual-mode buffer
//! - **interception**: once-per-exchange controller, facades, policy
//!   gate, and the completion/emission state machine
//! - **observability**: the span seam, its OpenTelemetry binding, and
//!   the attribute key conventions
//!
//! The host calls [`InterceptionController::on_entry`] with the native
//! exchange pieces, runs the application against the returned facades,
//! and calls [`InterceptionController::on_exit`] afterwards. For an
//! exchange that continues asynchronously, the host passes the handle of
//! a [`completion_channel`] and fires the notifier when processing
//! finishes; capture is emitted exactly once either way.

// Public module exports
pub mod capture;
pub mod interception;
pub mod observability;
pub mod utils;

// Re-export commonly used types
pub use interception::{
    completion_channel, BufferingRequest, BufferingResponse, CaptureToken, CompletionHandle,
    CompletionNotifier, CompletionOutcome, EntryDecision, ExchangeContext, HeaderSnapshot,
    InterceptionController, PolicyDecision, PolicyEvaluator, ServerRequest, ServerResponse,
};
pub use observability::{SpanSource, TraceSink};
pub use utils::config::CaptureConfig;
pub use utils::errors::{CaptureError, Result};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
