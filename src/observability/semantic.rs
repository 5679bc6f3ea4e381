// src/observability/semantic.rs
//! Span attribute conventions.
//!
//! Header attributes follow the literal `request.header.<name>` /
//! `response.header.<name>` convention; bodies use the fixed keys below.
//! Downstream processors match on these strings, so they are part of the
//! crate's compatibility surface.

/// Attribute key for the captured request body.
pub const REQUEST_BODY: &str = "request.body";

/// Attribute key for the captured response body.
pub const RESPONSE_BODY: &str = "response.body";

/// Attribute key for one inbound request header.
pub fn request_header(name: &str) -> String {
    format!("request.header.{name}")
}

/// Attribute key for one response header.
pub fn response_header(name: &str) -> String {
    format!("response.header.{name}")
}
