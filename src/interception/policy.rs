// src/interception/policy.rs
//! Request policy gate.
//!
//! Before the application runs, the inbound headers are handed to an
//! external evaluator that may veto execution. The layer only understands
//! the decision; how it is made lives behind the trait.

use crate::observability::span::TraceSink;
use http::{HeaderMap, StatusCode};
use std::collections::HashMap;

/// Inbound headers as seen by policy evaluation.
///
/// Name-keyed and order-irrelevant, one value per name (the first, as the
/// wire carried it), built once at entry time.
#[derive(Debug, Clone, Default)]
pub struct HeaderSnapshot {
    entries: HashMap<String, String>,
}

impl HeaderSnapshot {
    /// Snapshot the given headers. Values that are not valid UTF-8 are
    /// replaced lossily; names are lowercase.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut entries = HashMap::new();
        for name in headers.keys() {
            if let Some(value) = headers.get(name) {
                entries.insert(
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                );
            }
        }
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome of evaluating a request against policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    /// Let the application run.
    Allow,

    /// Short-circuit with the given status; the application never runs.
    Block(StatusCode),
}

impl PolicyDecision {
    pub fn blocks(&self) -> bool {
        matches!(self, PolicyDecision::Block(_))
    }
}

/// External policy seam.
pub trait PolicyEvaluator: Send + Sync {
    /// Decide whether the exchange may proceed. The evaluator may
    /// annotate the span while deciding.
    fn evaluate_request_headers(
        &self,
        span: &mut dyn TraceSink,
        headers: &HeaderSnapshot,
    ) -> PolicyDecision;
}

impl<F> PolicyEvaluator for F
where
    F: Fn(&mut dyn TraceSink, &HeaderSnapshot) -> PolicyDecision + Send + Sync,
{
    fn evaluate_request_headers(
        &self,
        span: &mut dyn TraceSink,
        headers: &HeaderSnapshot,
    ) -> PolicyDecision {
        self(span, headers)
    }
}

/// Default evaluator: everything is allowed.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl PolicyEvaluator for AllowAll {
    fn evaluate_request_headers(
        &self,
        _span: &mut dyn TraceSink,
        _headers: &HeaderSnapshot,
    ) -> PolicyDecision {
        PolicyDecision::Allow
    }
}
