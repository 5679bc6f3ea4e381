// src/capture/output.rs
//! Response-side stream proxies.
//!
//! `CapturingWriter` and `CapturingTextWriter` sit between the
//! application and the real response sink. Every write is forwarded to
//! the delegate first, preserving its ordering and backpressure; what was
//! actually accepted is then appended to the shared capture buffer, and
//! any delegate failure propagates untouched. `flush` is forwarded but
//! never triggers capture emission; a response may be flushed many times
//! before the exchange completes.

use crate::capture::SharedBuffer;
use encoding_rs::Encoding;
use std::io::{self, Write};

/// Byte view of a response sink.
#[derive(Debug)]
pub struct CapturingWriter<W> {
    inner: W,
    captured: SharedBuffer,
}

impl<W: Write> CapturingWriter<W> {
    pub fn new(inner: W, captured: SharedBuffer) -> Self {
        Self { inner, captured }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwrap the proxy, keeping whatever was captured so far.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CapturingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        if n > 0 {
            self.captured.lock().append_bytes(&buf[..n]);
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Character view of a response sink.
///
/// Text is encoded with the charset the response declared when the view
/// was created (UTF-8 when undeclared), forwarded to the delegate, and
/// captured as characters.
pub struct CapturingTextWriter<W> {
    inner: W,
    captured: SharedBuffer,
    charset: &'static Encoding,
}

impl<W: Write> CapturingTextWriter<W> {
    pub fn new(inner: W, captured: SharedBuffer, charset: &'static Encoding) -> Self {
        Self {
            inner,
            captured,
            charset,
        }
    }

    /// Encode and forward `text`, then capture it. A delegate failure
    /// propagates and nothing is captured for the failed write.
    pub fn write_str(&mut self, text: &str) -> io::Result<()> {
        let (encoded, _, _) = self.charset.encode(text);
        self.inner.write_all(&encoded)?;
        self.captured.lock().append_text(text);
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    /// Unwrap the proxy, keeping whatever was captured so far.
    pub fn into_inner(self) -> W {
        self.inner
    }
}
