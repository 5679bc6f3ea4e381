// src/capture/input.rs
//! Request-side stream proxies.
//!
//! `CapturingReader` and `CapturingTextReader` sit between the
//! application and the real request body. Every read goes to the delegate
//! first; whatever actually came back (never the requested length) is
//! appended to the shared capture buffer, and the delegate's result is
//! returned unchanged. End of stream is captured as "no more data", and
//! delegate errors pass through without touching the buffer.

use crate::capture::SharedBuffer;
use std::io::{self, BufRead, BufReader, Read};

/// Byte view of a request body.
pub struct CapturingReader<R> {
    inner: R,
    captured: SharedBuffer,
}

impl<R: Read> CapturingReader<R> {
    pub fn new(inner: R, captured: SharedBuffer) -> Self {
        Self { inner, captured }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Unwrap the proxy, keeping whatever was captured so far.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for CapturingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.captured.lock().append_bytes(&buf[..n]);
        }
        Ok(n)
    }
}

/// Character view of a request body.
///
/// Line-oriented reads over an internal `BufReader`; the characters that
/// were actually produced (line terminators included, they are stream
/// data) are appended to the shared capture buffer.
#[derive(Debug)]
pub struct CapturingTextReader<R> {
    inner: BufReader<R>,
    captured: SharedBuffer,
}

impl<R: Read> CapturingTextReader<R> {
    pub fn new(inner: R, captured: SharedBuffer) -> Self {
        Self {
            inner: BufReader::new(inner),
            captured,
        }
    }

    /// Read one line into `out`, returning the number of bytes read.
    /// `Ok(0)` is end of stream.
    pub fn read_line(&mut self, out: &mut String) -> io::Result<usize> {
        let start = out.len();
        let n = self.inner.read_line(out)?;
        if n > 0 {
            self.captured.lock().append_text(&out[start..]);
        }
        Ok(n)
    }

    /// Read the remainder of the stream into `out`.
    pub fn read_to_string(&mut self, out: &mut String) -> io::Result<usize> {
        let start = out.len();
        let n = self.inner.read_to_string(out)?;
        if n > 0 {
            self.captured.lock().append_text(&out[start..]);
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{shared_buffer, CaptureBuffer};
    use proptest::prelude::*;

    #[test]
    fn test_read_captures_what_was_returned() {
        let captured = shared_buffer(CaptureBuffer::new());
        let mut reader = CapturingReader::new(&b"xyz"[..], captured.clone());

        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();

        assert_eq!(out, b"xyz");
        assert_eq!(captured.lock().as_text(), "xyz");
    }

    #[test]
    fn test_partial_reads_capture_everything() {
        let captured = shared_buffer(CaptureBuffer::new());
        let mut reader = CapturingReader::new(&b"xyz"[..], captured.clone());

        // One byte at a time.
        let mut one = [0u8; 1];
        let mut seen = Vec::new();
        loop {
            match reader.read(&mut one).unwrap() {
                0 => break,
                n => seen.extend_from_slice(&one[..n]),
            }
        }

        assert_eq!(seen, b"xyz");
        assert_eq!(captured.lock().as_text(), "xyz");
    }

    #[test]
    fn test_eof_is_not_captured_as_data() {
        let captured = shared_buffer(CaptureBuffer::new());
        let mut reader = CapturingReader::new(&b""[..], captured.clone());

        let mut buf = [0u8; 8];
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
        assert!(captured.lock().is_empty());
    }

    #[test]
    fn test_read_error_passes_through_untouched() {
        struct Failing;
        impl Read for Failing {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "boom"))
            }
        }

        let captured = shared_buffer(CaptureBuffer::new());
        let mut reader = CapturingReader::new(Failing, captured.clone());

        let mut buf = [0u8; 8];
        let err = reader.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert!(captured.lock().is_empty());
    }

    #[test]
    fn test_read_line_captures_terminator() {
        let captured = shared_buffer(CaptureBuffer::new());
        let mut reader = CapturingTextReader::new(&b"one\ntwo"[..], captured.clone());

        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        assert_eq!(line, "one\n");

        line.clear();
        reader.read_line(&mut line).unwrap();
        assert_eq!(line, "two");

        line.clear();
        assert_eq!(reader.read_line(&mut line).unwrap(), 0);

        assert_eq!(captured.lock().as_text(), "one\ntwo");
    }

    #[test]
    fn test_read_to_string_captures_all() {
        let captured = shared_buffer(CaptureBuffer::new());
        let mut reader = CapturingTextReader::new(&b"alpha beta"[..], captured.clone());

        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();

        assert_eq!(out, "alpha beta");
        assert_eq!(captured.lock().as_text(), "alpha beta");
    }

    proptest! {
        // Pass-through fidelity: whatever chunking the application uses,
        // it observes the source byte-for-byte and the capture matches.
        #[test]
        fn prop_passthrough_preserves_bytes(
            data in proptest::collection::vec(any::<u8>(), 0..2048),
            chunk in 1usize..96,
        ) {
            let captured = shared_buffer(CaptureBuffer::new());
            let mut reader = CapturingReader::new(&data[..], captured.clone());

            let mut observed = Vec::new();
            let mut buf = vec![0u8; chunk];
            loop {
                match reader.read(&mut buf).unwrap() {
                    0 => break,
                    n => observed.extend_from_slice(&buf[..n]),
                }
            }

            prop_assert_eq!(&observed, &data);
            let captured_guard = captured.lock();
            prop_assert_eq!(captured_guard.as_bytes(), &data[..]);
        }
    }
}
