// src/interception/controller.rs
//! Root interception protocol.
//!
//! `on_entry` runs once per exchange at the outermost interception point:
//! it deduplicates nested invocations, snapshots the inbound headers,
//! applies the blocking policy, and installs the buffering facades.
//! `on_exit` decides between synchronous and deferred capture and hands
//! both paths one exactly-once emission. Nothing in either path may
//! disturb the application's own request/response processing.

use crate::interception::completion::{CaptureEmission, CompletionHandle};
use crate::interception::policy::{AllowAll, HeaderSnapshot, PolicyDecision, PolicyEvaluator};
use crate::interception::wrapper::{
    BufferingRequest, BufferingResponse, ServerRequest, ServerResponse,
};
use crate::observability::semantic;
use crate::observability::span::{OtelSpanSource, SpanSource, TraceSink};
use crate::utils::config::CaptureConfig;
use crate::utils::errors::CaptureError;
use http::StatusCode;
use std::io::{Read, Write};
use std::sync::Arc;
use tracing::{debug, warn};

/// Per-exchange state owned by the host and threaded through the layer.
///
/// One context per physical exchange; nested interception points share
/// it, which is how the layer detects re-entry.
#[derive(Debug, Default)]
pub struct ExchangeContext {
    /// Root-invocation marker: set while the exchange is between the
    /// root `on_entry` and its `on_exit`.
    processing: bool,
}

impl ExchangeContext {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Proof that `on_entry` installed the facades for this exchange.
///
/// Threading the token to `on_exit` replaces runtime inspection of the
/// request/response types: without a token there is nothing to finish.
pub struct CaptureToken {
    span: Box<dyn TraceSink + Send>,
}

/// What the caller must do after `on_entry`.
pub enum EntryDecision<R, W> {
    /// Instrumentation did not engage. Run the application against the
    /// native pair.
    NotHandled {
        request: ServerRequest<R>,
        response: ServerResponse<W>,
    },

    /// Policy vetoed the exchange. The status is already applied to the
    /// response; the application must not run and nothing is captured.
    Blocked {
        request: ServerRequest<R>,
        response: ServerResponse<W>,
        status: StatusCode,
    },

    /// Facades installed. Run the application against them, then call
    /// `on_exit` with the token.
    Handled {
        token: CaptureToken,
        request: BufferingRequest<R>,
        response: BufferingResponse<W>,
    },
}

impl<R, W> EntryDecision<R, W> {
    pub fn is_handled(&self) -> bool {
        matches!(self, EntryDecision::Handled { .. })
    }
}

/// Drives header/body capture for one interception point.
pub struct InterceptionController {
    config: CaptureConfig,
    spans: Arc<dyn SpanSource>,
    policy: Arc<dyn PolicyEvaluator>,
}

impl InterceptionController {
    /// Controller with the given capture switches, the OpenTelemetry
    /// span source, and an allow-everything policy.
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            spans: Arc::new(OtelSpanSource),
            policy: Arc::new(AllowAll),
        }
    }

    pub fn with_spans(mut self, spans: Arc<dyn SpanSource>) -> Self {
        self.spans = spans;
        self
    }

    pub fn with_policy(mut self, policy: Arc<dyn PolicyEvaluator>) -> Self {
        self.policy = policy;
        self
    }

    /// Enter the interception point for an exchange.
    ///
    /// Exactly one of the nested interception points a request passes
    /// through gets `Handled`: the first one. Everything after it sees
    /// the marker on the shared context and backs off.
    pub fn on_entry<R: Read, W: Write>(
        &self,
        ctx: &mut ExchangeContext,
        request: ServerRequest<R>,
        mut response: ServerResponse<W>,
    ) -> EntryDecision<R, W> {
        if !self.config.enabled {
            return EntryDecision::NotHandled { request, response };
        }
        if ctx.processing {
            debug!("nested interception entry; deferring to the root");
            return EntryDecision::NotHandled { request, response };
        }
        ctx.processing = true;

        let mut span = self.spans.current_span();
        let snapshot = HeaderSnapshot::from_headers(&request.headers);
        if self.config.request_headers {
            for (name, value) in snapshot.iter() {
                span.set_attribute(semantic::request_header(name), value.to_string());
            }
        }

        if let PolicyDecision::Block(status) = self
            .policy
            .evaluate_request_headers(span.as_mut(), &snapshot)
        {
            debug!(%status, "request blocked by policy");
            response.status = status;
            // No facade exists for a blocked exchange; release the marker.
            ctx.processing = false;
            return EntryDecision::Blocked {
                request,
                response,
                status,
            };
        }

        let request = BufferingRequest::new(request);
        let response = BufferingResponse::new(response);
        EntryDecision::Handled {
            token: CaptureToken { span },
            request,
            response,
        }
    }

    /// Leave the interception point, on normal return and on application
    /// error paths alike.
    ///
    /// A `Some` continuation means the native exchange is still running
    /// asynchronously: emission is deferred to its completion signal.
    /// When registration loses the race against completion, the work
    /// falls through to the synchronous path; the emission's own guard
    /// keeps it from ever running twice.
    pub fn on_exit<R: Read, W: Write>(
        &self,
        ctx: &mut ExchangeContext,
        token: CaptureToken,
        request: &BufferingRequest<R>,
        response: &BufferingResponse<W>,
        continuation: Option<&CompletionHandle>,
    ) {
        // A later, logically distinct pass over the same context must be
        // treated as new.
        ctx.processing = false;

        let emission = Arc::new(CaptureEmission::new(
            token.span,
            self.config.clone(),
            request.captured_buffer(),
            response.captured_buffer(),
            response.meta_handle(),
        ));

        if let Some(handle) = continuation {
            let deferred = Arc::clone(&emission);
            match handle.register(move |outcome| {
                debug!(?outcome, "asynchronous exchange finished");
                deferred.emit();
            }) {
                Ok(()) => return,
                Err(CaptureError::AlreadyCompleted) => {
                    // The continuation finished between the async check
                    // and registration; capture synchronously instead.
                    debug!("continuation already finished; capturing synchronously");
                }
                Err(e) => warn!(error = %e, "completion registration failed"),
            }
        }

        emission.emit();
    }
}
