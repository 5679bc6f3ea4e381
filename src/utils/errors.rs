// src/utils/errors.rs
//! Error types for the capture layer.
//!
//! Capture is an observer: nothing in the capture path is allowed to leak
//! into the application's control flow. The variants below cover the few
//! places where the caller made an API mistake or asked for something
//! that can no longer happen.

use thiserror::Error;

/// Errors surfaced by the capture layer.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// A body was already opened in the other access mode.
    #[error("body already accessed as {existing}, cannot reopen as {requested}")]
    AccessModeConflict {
        existing: &'static str,
        requested: &'static str,
    },

    /// The completion signal fired before a listener could be registered.
    #[error("exchange already completed")]
    AlreadyCompleted,

    /// Configuration could not be loaded or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CaptureError>;
