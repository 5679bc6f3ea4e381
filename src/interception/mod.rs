// src/interception/mod.rs
//! Request interception layer.
//!
//! This module drives capture around the host's handler chain:
//!
//! - **Controller**: once-per-exchange entry/exit protocol
//! - **Wrapper**: buffering request/response facades
//! - **Policy**: header-based blocking gate
//! - **Completion**: one-shot completion signal and exactly-once emission
//!
//! # Architecture
//!
//! ```text
//! host handler chain
//!     │
//!     ├─ on_entry ─→ headers to span ─→ policy gate ─→ facades
//!     │                                      │
//!     │                                   Blocked: status set, app skipped
//!     │
//!     ├─ application runs against the facades (buffers fill)
//!     │
//!     └─ on_exit ─→ synchronous: emit now
//!               └─→ asynchronous: emit on the completion signal
//! ```

pub mod completion;
pub mod controller;
pub mod policy;
pub mod wrapper;

// Re-export commonly used types
pub use completion::{completion_channel, CompletionHandle, CompletionNotifier, CompletionOutcome};
pub use controller::{CaptureToken, EntryDecision, ExchangeContext, InterceptionController};
pub use policy::{AllowAll, HeaderSnapshot, PolicyDecision, PolicyEvaluator};
pub use wrapper::{
    BufferingRequest, BufferingResponse, ResponseMeta, ServerRequest, ServerResponse,
};
