// src/capture/mod.rs
//! Pass-through stream capture.
//!
//! This module provides the buffering layer of the crate:
//!
//! - **Buffer**: dual-mode (byte/char) append-only capture buffer
//! - **Input**: `Read` proxy and character reader over a request body
//! - **Output**: `Write` proxy and character writer over a response sink
//!
//! The proxies never change what the wrapped application reads or
//! writes; they tee an independent copy of the same data into a shared
//! [`CaptureBuffer`] for later inspection.

pub mod buffer;
pub mod input;
pub mod output;

// Re-export commonly used types
pub use buffer::CaptureBuffer;
pub use input::{CapturingReader, CapturingTextReader};
pub use output::{CapturingTextWriter, CapturingWriter};

use parking_lot::Mutex;
use std::sync::Arc;

/// Capture buffer shared between a stream proxy and the emission path.
///
/// The asynchronous completion path may finalize capture on a different
/// thread than the one that filled the buffer.
pub type SharedBuffer = Arc<Mutex<CaptureBuffer>>;

/// Wrap a buffer for sharing between a proxy and the emission path.
pub fn shared_buffer(buffer: CaptureBuffer) -> SharedBuffer {
    Arc::new(Mutex::new(buffer))
}
