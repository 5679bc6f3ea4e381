// src/interception/wrapper.rs
//! Exchange facades.
//!
//! `ServerRequest`/`ServerResponse` are the native exchange pieces the
//! host hands in. When the controller engages, they are wrapped into
//! `BufferingRequest`/`BufferingResponse`: pure decorators that the
//! application uses in place of the native pair. Body access is lazy and
//! single-mode: the first call decides between the byte stream and the
//! character view, and the other mode is rejected for the rest of the
//! exchange.

use crate::capture::{
    shared_buffer, CaptureBuffer, CapturingReader, CapturingTextReader, CapturingTextWriter,
    CapturingWriter, SharedBuffer,
};
use crate::utils::errors::{CaptureError, Result};
use encoding_rs::Encoding;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, StatusCode};
use parking_lot::Mutex;
use std::io::{Read, Write};
use std::sync::Arc;

/// Charset declared by a header block's content-type, UTF-8 otherwise.
pub(crate) fn declared_charset(headers: &HeaderMap) -> &'static Encoding {
    let label = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|content_type| {
            content_type.split(';').skip(1).find_map(|param| {
                let (key, value) = param.split_once('=')?;
                if key.trim().eq_ignore_ascii_case("charset") {
                    Some(value.trim().trim_matches('"'))
                } else {
                    None
                }
            })
        });
    CaptureBuffer::charset_for_label(label)
}

/// Request side of a native exchange, as the host hands it in.
pub struct ServerRequest<R> {
    pub headers: HeaderMap,
    pub body: R,
}

impl<R: Read> ServerRequest<R> {
    pub fn new(headers: HeaderMap, body: R) -> Self {
        Self { headers, body }
    }
}

/// Response side of a native exchange, as the host hands it in.
pub struct ServerResponse<W> {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub sink: W,
}

impl<W: Write> ServerResponse<W> {
    pub fn new(sink: W) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            sink,
        }
    }
}

/// Response metadata shared between the facade and the emission path.
///
/// Asynchronous processing keeps mutating status and headers after the
/// synchronous exit; emission reads whatever is final.
#[derive(Debug)]
pub struct ResponseMeta {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

enum InputAccess<R> {
    /// Body untouched; access mode still open.
    Untouched(R),
    Bytes(CapturingReader<R>),
    Text(CapturingTextReader<R>),
    /// Transient placeholder during hand-off; never observable.
    Claimed,
}

enum OutputAccess<W> {
    Untouched(W),
    Bytes(CapturingWriter<W>),
    Text(CapturingTextWriter<W>),
    Claimed,
}

/// Decorated request the application reads from.
pub struct BufferingRequest<R> {
    headers: HeaderMap,
    captured: SharedBuffer,
    access: InputAccess<R>,
}

impl<R: Read> BufferingRequest<R> {
    pub(crate) fn new(request: ServerRequest<R>) -> Self {
        // Request headers are final here; snapshot the declared encoding.
        let charset = declared_charset(&request.headers);
        Self {
            headers: request.headers,
            captured: shared_buffer(CaptureBuffer::with_charset(charset)),
            access: InputAccess::Untouched(request.body),
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Byte view of the request body. The first access fixes the mode;
    /// asking for the character view afterward fails.
    pub fn byte_stream(&mut self) -> Result<&mut CapturingReader<R>> {
        if let InputAccess::Untouched(_) = self.access {
            if let InputAccess::Untouched(body) =
                std::mem::replace(&mut self.access, InputAccess::Claimed)
            {
                self.access =
                    InputAccess::Bytes(CapturingReader::new(body, Arc::clone(&self.captured)));
            }
        }
        match &mut self.access {
            InputAccess::Bytes(reader) => Ok(reader),
            _ => Err(CaptureError::AccessModeConflict {
                existing: "text",
                requested: "bytes",
            }),
        }
    }

    /// Character view of the request body. The first access fixes the
    /// mode; asking for the byte stream afterward fails.
    pub fn text_reader(&mut self) -> Result<&mut CapturingTextReader<R>> {
        if let InputAccess::Untouched(_) = self.access {
            if let InputAccess::Untouched(body) =
                std::mem::replace(&mut self.access, InputAccess::Claimed)
            {
                self.access =
                    InputAccess::Text(CapturingTextReader::new(body, Arc::clone(&self.captured)));
            }
        }
        match &mut self.access {
            InputAccess::Text(reader) => Ok(reader),
            _ => Err(CaptureError::AccessModeConflict {
                existing: "bytes",
                requested: "text",
            }),
        }
    }

    /// Decoded view of the request body captured so far. Safe to call
    /// after the exchange completes.
    pub fn captured_body(&self) -> String {
        self.captured.lock().as_text()
    }

    pub(crate) fn captured_buffer(&self) -> SharedBuffer {
        Arc::clone(&self.captured)
    }
}

/// Decorated response the application writes to.
pub struct BufferingResponse<W> {
    meta: Arc<Mutex<ResponseMeta>>,
    captured: SharedBuffer,
    access: OutputAccess<W>,
}

impl<W: Write> BufferingResponse<W> {
    pub(crate) fn new(response: ServerResponse<W>) -> Self {
        Self {
            meta: Arc::new(Mutex::new(ResponseMeta {
                status: response.status,
                headers: response.headers,
            })),
            // Response charset is resolved again at capture finalization,
            // once the headers are final.
            captured: shared_buffer(CaptureBuffer::new()),
            access: OutputAccess::Untouched(response.sink),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.meta.lock().status
    }

    pub fn set_status(&self, status: StatusCode) {
        self.meta.lock().status = status;
    }

    pub fn insert_header(&self, name: HeaderName, value: HeaderValue) {
        self.meta.lock().headers.insert(name, value);
    }

    /// First value of the named response header, if present.
    pub fn header(&self, name: &str) -> Option<String> {
        self.meta
            .lock()
            .headers
            .get(name)
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
    }

    /// Names of all response headers set so far.
    pub fn header_names(&self) -> Vec<String> {
        self.meta
            .lock()
            .headers
            .keys()
            .map(|name| name.as_str().to_string())
            .collect()
    }

    /// Byte view of the response sink. The first access fixes the mode;
    /// asking for the character view afterward fails.
    pub fn byte_sink(&mut self) -> Result<&mut CapturingWriter<W>> {
        if let OutputAccess::Untouched(_) = self.access {
            if let OutputAccess::Untouched(sink) =
                std::mem::replace(&mut self.access, OutputAccess::Claimed)
            {
                self.access =
                    OutputAccess::Bytes(CapturingWriter::new(sink, Arc::clone(&self.captured)));
            }
        }
        match &mut self.access {
            OutputAccess::Bytes(writer) => Ok(writer),
            _ => Err(CaptureError::AccessModeConflict {
                existing: "text",
                requested: "bytes",
            }),
        }
    }

    /// Character view of the response sink, encoding with the charset
    /// declared at the time of this call. The first access fixes the
    /// mode; asking for the byte sink afterward fails.
    pub fn text_writer(&mut self) -> Result<&mut CapturingTextWriter<W>> {
        if let OutputAccess::Untouched(_) = self.access {
            if let OutputAccess::Untouched(sink) =
                std::mem::replace(&mut self.access, OutputAccess::Claimed)
            {
                let charset = declared_charset(&self.meta.lock().headers);
                self.access = OutputAccess::Text(CapturingTextWriter::new(
                    sink,
                    Arc::clone(&self.captured),
                    charset,
                ));
            }
        }
        match &mut self.access {
            OutputAccess::Text(writer) => Ok(writer),
            _ => Err(CaptureError::AccessModeConflict {
                existing: "bytes",
                requested: "text",
            }),
        }
    }

    /// Decoded view of the response body captured so far. Safe to call
    /// after the exchange completes.
    pub fn captured_body(&self) -> String {
        self.captured.lock().as_text()
    }

    /// Hand the underlying sink back to the host. `None` only if the
    /// facade is mid-access, which cannot happen across a call boundary.
    pub fn into_inner(self) -> Option<W> {
        match self.access {
            OutputAccess::Untouched(sink) => Some(sink),
            OutputAccess::Bytes(writer) => Some(writer.into_inner()),
            OutputAccess::Text(writer) => Some(writer.into_inner()),
            OutputAccess::Claimed => None,
        }
    }

    pub(crate) fn captured_buffer(&self) -> SharedBuffer {
        Arc::clone(&self.captured)
    }

    pub(crate) fn meta_handle(&self) -> Arc<Mutex<ResponseMeta>> {
        Arc::clone(&self.meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read as _;

    fn request_with(headers: HeaderMap, body: &[u8]) -> BufferingRequest<&[u8]> {
        BufferingRequest::new(ServerRequest::new(headers, body))
    }

    #[test]
    fn test_request_capture_through_byte_stream() {
        let mut request = request_with(HeaderMap::new(), b"xyz");

        let mut out = Vec::new();
        request.byte_stream().unwrap().read_to_end(&mut out).unwrap();

        assert_eq!(out, b"xyz");
        assert_eq!(request.captured_body(), "xyz");
    }

    #[test]
    fn test_request_capture_through_text_reader() {
        let mut request = request_with(HeaderMap::new(), b"line one\nline two");

        let mut text = String::new();
        request
            .text_reader()
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();

        assert_eq!(text, "line one\nline two");
        assert_eq!(request.captured_body(), "line one\nline two");
    }

    #[test]
    fn test_request_access_mode_is_fixed_by_first_use() {
        let mut request = request_with(HeaderMap::new(), b"xyz");
        request.byte_stream().unwrap();

        let err = request.text_reader().unwrap_err();
        assert!(matches!(err, CaptureError::AccessModeConflict { .. }));

        // The original mode keeps working.
        assert!(request.byte_stream().is_ok());
    }

    #[test]
    fn test_request_charset_snapshot_from_content_type() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=iso-8859-1"),
        );
        let body: &[u8] = &[0x63, 0x61, 0x66, 0xe9];
        let mut request = request_with(headers, body);

        let mut out = Vec::new();
        request.byte_stream().unwrap().read_to_end(&mut out).unwrap();

        assert_eq!(request.captured_body(), "café");
    }

    #[test]
    fn test_response_capture_and_meta() {
        let mut response = BufferingResponse::new(ServerResponse::new(Vec::new()));
        response.set_status(StatusCode::CREATED);
        response.insert_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("r-1"),
        );

        use std::io::Write as _;
        response.byte_sink().unwrap().write_all(b"abc").unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.header("x-request-id").as_deref(), Some("r-1"));
        assert_eq!(response.header_names(), vec!["x-request-id".to_string()]);
        assert_eq!(response.captured_body(), "abc");
        assert_eq!(response.into_inner().unwrap(), b"abc");
    }

    #[test]
    fn test_response_access_mode_is_fixed_by_first_use() {
        let mut response = BufferingResponse::new(ServerResponse::new(Vec::new()));
        response.text_writer().unwrap();

        let err = response.byte_sink().unwrap_err();
        assert!(matches!(err, CaptureError::AccessModeConflict { .. }));
    }

    #[test]
    fn test_text_writer_uses_declared_charset() {
        let mut response = BufferingResponse::new(ServerResponse::new(Vec::new()));
        response.insert_header(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=windows-1252"),
        );

        response.text_writer().unwrap().write_str("café").unwrap();

        assert_eq!(response.captured_body(), "café");
        assert_eq!(response.into_inner().unwrap(), &[0x63, 0x61, 0x66, 0xe9]);
    }

    #[test]
    fn test_declared_charset_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(declared_charset(&headers), encoding_rs::UTF_8);

        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=\"utf-8\""),
        );
        assert_eq!(declared_charset(&headers), encoding_rs::UTF_8);

        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/html; boundary=x; charset=ISO-8859-1"),
        );
        assert_eq!(declared_charset(&headers).name(), "windows-1252");
    }
}
