// src/capture/buffer.rs
//! Dual-mode capture buffer.
//!
//! One `CaptureBuffer` accumulates an independent copy of everything the
//! application read from (or wrote to) a stream. The first non-empty
//! append fixes the buffer's mode: raw bytes or decoded characters.
//! Appending in the other mode afterward is a programming error in the
//! layer above; the buffer drops the data and logs instead of failing
//! the live exchange. The facades reject mixed access before it gets
//! this far.

use encoding_rs::{Encoding, UTF_8};
use tracing::warn;

/// Accumulated capture data. Mode is fixed by the first non-empty append.
#[derive(Debug)]
enum BufferData {
    /// Nothing captured yet; the mode is still open.
    Empty,

    /// Byte mode: raw stream bytes, decoded on demand.
    Bytes(Vec<u8>),

    /// Character mode: text exactly as the application saw it.
    Text(String),
}

/// Append-only capture buffer with a byte view and a text view.
///
/// Content only grows while the exchange is live; after [`seal`] the
/// buffer is immutable and [`as_text`] returns the same string on every
/// call.
///
/// [`seal`]: CaptureBuffer::seal
/// [`as_text`]: CaptureBuffer::as_text
#[derive(Debug)]
pub struct CaptureBuffer {
    data: BufferData,

    /// Declared stream encoding, used to decode byte-mode content.
    charset: &'static Encoding,

    /// Set once capture is finalized; appends are no-ops afterward.
    sealed: bool,
}

impl CaptureBuffer {
    /// Create an empty buffer that decodes byte content as UTF-8.
    pub fn new() -> Self {
        Self::with_charset(UTF_8)
    }

    /// Create an empty buffer with the given declared encoding.
    pub fn with_charset(charset: &'static Encoding) -> Self {
        Self {
            data: BufferData::Empty,
            charset,
            sealed: false,
        }
    }

    /// Resolve an encoding label (e.g. from a `charset=` content-type
    /// parameter). Unknown or absent labels fall back to UTF-8.
    pub fn charset_for_label(label: Option<&str>) -> &'static Encoding {
        label
            .and_then(|l| Encoding::for_label(l.trim().as_bytes()))
            .unwrap_or(UTF_8)
    }

    /// Replace the declared encoding. No-op once sealed, so the decoded
    /// view stays stable after finalization.
    pub fn set_charset(&mut self, charset: &'static Encoding) {
        if !self.sealed {
            self.charset = charset;
        }
    }

    /// Append raw bytes. Zero-length input is tolerated and does not fix
    /// the mode. Appending to a text-mode or sealed buffer is a no-op.
    pub fn append_bytes(&mut self, bytes: &[u8]) {
        if self.sealed || bytes.is_empty() {
            return;
        }
        match &mut self.data {
            BufferData::Empty => self.data = BufferData::Bytes(bytes.to_vec()),
            BufferData::Bytes(existing) => existing.extend_from_slice(bytes),
            BufferData::Text(_) => {
                warn!("byte append on a character-mode capture buffer; dropped");
            }
        }
    }

    /// Append characters. Zero-length input is tolerated and does not fix
    /// the mode. Appending to a byte-mode or sealed buffer is a no-op.
    pub fn append_text(&mut self, text: &str) {
        if self.sealed || text.is_empty() {
            return;
        }
        match &mut self.data {
            BufferData::Empty => self.data = BufferData::Text(text.to_string()),
            BufferData::Text(existing) => existing.push_str(text),
            BufferData::Bytes(_) => {
                warn!("character append on a byte-mode capture buffer; dropped");
            }
        }
    }

    /// Decoded view of the captured content.
    ///
    /// Byte mode decodes with the declared encoding; malformed sequences
    /// become replacement characters rather than errors. Character mode
    /// returns the accumulated text. Stable across calls once writing has
    /// stopped.
    pub fn as_text(&self) -> String {
        match &self.data {
            BufferData::Empty => String::new(),
            BufferData::Bytes(bytes) => {
                let (text, _, _) = self.charset.decode(bytes);
                text.into_owned()
            }
            BufferData::Text(text) => text.clone(),
        }
    }

    /// Raw view of the captured content. Character mode yields the UTF-8
    /// bytes of the accumulated text.
    pub fn as_bytes(&self) -> &[u8] {
        match &self.data {
            BufferData::Empty => &[],
            BufferData::Bytes(bytes) => bytes,
            BufferData::Text(text) => text.as_bytes(),
        }
    }

    /// Number of captured units (bytes, or bytes of text).
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Finalize the buffer. Later appends and charset changes are no-ops.
    pub fn seal(&mut self) {
        self.sealed = true;
    }
}

impl Default for CaptureBuffer {
    fn default() -> Self {
        Self::new()
    }
}
