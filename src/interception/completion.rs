// src/interception/completion.rs
//! Exchange completion and capture emission.
//!
//! Two paths can finish an exchange: the synchronous exit right after the
//! handler returns, and the completion signal of an exchange that went
//! asynchronous. Both funnel into one [`CaptureEmission`] guarded by a
//! compare-and-set flag, so the span is written exactly once no matter
//! which path wins or whether both race.

use crate::capture::SharedBuffer;
use crate::interception::wrapper::{declared_charset, ResponseMeta};
use crate::observability::semantic;
use crate::observability::span::TraceSink;
use crate::utils::config::CaptureConfig;
use crate::utils::errors::{CaptureError, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// How an asynchronous exchange finished.
///
/// Error and timeout still drive capture: partial content on the span
/// beats a lost attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    Completed,
    Errored,
    TimedOut,
}

type Listener = Box<dyn FnOnce(CompletionOutcome) + Send>;

enum SignalState {
    /// No listener yet, not completed.
    Idle,
    /// Listener waiting for the signal.
    Registered(Listener),
    /// Signal fired; later registrations fail.
    Done(CompletionOutcome),
}

struct Signal {
    state: Mutex<SignalState>,
}

/// Create a one-shot completion signal pair.
///
/// The host keeps the [`CompletionNotifier`] and fires it when
/// asynchronous processing finishes; the controller registers the capture
/// emission on the [`CompletionHandle`].
pub fn completion_channel() -> (CompletionNotifier, CompletionHandle) {
    let signal = Arc::new(Signal {
        state: Mutex::new(SignalState::Idle),
    });
    (
        CompletionNotifier {
            signal: Arc::clone(&signal),
        },
        CompletionHandle { signal },
    )
}

/// Host-side end of the completion signal.
pub struct CompletionNotifier {
    signal: Arc<Signal>,
}

impl CompletionNotifier {
    /// Signal that the exchange finished. The first call runs the
    /// registered listener, whatever the outcome; later calls are no-ops.
    pub fn notify(&self, outcome: CompletionOutcome) {
        let listener = {
            let mut state = self.signal.state.lock();
            match std::mem::replace(&mut *state, SignalState::Done(outcome)) {
                SignalState::Registered(listener) => Some(listener),
                SignalState::Idle => None,
                SignalState::Done(first) => {
                    // One-shot: keep the first outcome.
                    *state = SignalState::Done(first);
                    None
                }
            }
        };
        // Run outside the lock; the listener may take its time.
        if let Some(listener) = listener {
            listener(outcome);
        }
    }
}

/// Controller-side end of the completion signal.
pub struct CompletionHandle {
    signal: Arc<Signal>,
}

impl CompletionHandle {
    /// Register the completion listener. At most one listener is held;
    /// registering again replaces it.
    ///
    /// Fails with [`CaptureError::AlreadyCompleted`] when the signal
    /// fired before the listener could attach; the caller then falls
    /// back to synchronous emission.
    pub fn register<F>(&self, listener: F) -> Result<()>
    where
        F: FnOnce(CompletionOutcome) + Send + 'static,
    {
        let mut state = self.signal.state.lock();
        match &*state {
            SignalState::Done(_) => Err(CaptureError::AlreadyCompleted),
            _ => {
                *state = SignalState::Registered(Box::new(listener));
                Ok(())
            }
        }
    }
}

/// Single-use capture emission shared by the synchronous exit and the
/// asynchronous completion listener.
pub(crate) struct CaptureEmission {
    emitted: AtomicBool,
    span: Mutex<Box<dyn TraceSink + Send>>,
    config: CaptureConfig,
    request_body: SharedBuffer,
    response_body: SharedBuffer,
    response_meta: Arc<Mutex<ResponseMeta>>,
}

impl CaptureEmission {
    pub(crate) fn new(
        span: Box<dyn TraceSink + Send>,
        config: CaptureConfig,
        request_body: SharedBuffer,
        response_body: SharedBuffer,
        response_meta: Arc<Mutex<ResponseMeta>>,
    ) -> Self {
        Self {
            emitted: AtomicBool::new(false),
            span: Mutex::new(span),
            config,
            request_body,
            response_body,
            response_meta,
        }
    }

    /// Run the emission routine at most once. Whichever caller wins the
    /// compare-and-set does the work; everyone else returns immediately.
    pub(crate) fn emit(&self) {
        if self
            .emitted
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("capture already emitted; skipping");
            return;
        }

        // Finalize both buffers; the response charset is only known now
        // that its headers are final.
        let response_charset = declared_charset(&self.response_meta.lock().headers);
        {
            let mut body = self.request_body.lock();
            body.seal();
        }
        {
            let mut body = self.response_body.lock();
            body.set_charset(response_charset);
            body.seal();
        }

        let mut span = self.span.lock();

        if self.config.response_headers {
            let meta = self.response_meta.lock();
            for name in meta.headers.keys() {
                if let Some(value) = meta.headers.get(name) {
                    span.set_attribute(
                        semantic::response_header(name.as_str()),
                        String::from_utf8_lossy(value.as_bytes()).into_owned(),
                    );
                }
            }
        }

        if self.config.request_body {
            let body = self.request_body.lock().as_text();
            span.set_attribute(semantic::REQUEST_BODY.to_string(), body);
        }

        if self.config.response_body {
            let body = self.response_body.lock().as_text();
            span.set_attribute(semantic::RESPONSE_BODY.to_string(), body);
        }
    }
}
