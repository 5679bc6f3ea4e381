// src/utils/config.rs
//! Capture configuration.
//!
//! Five switches, read once when an exchange enters the layer. There is
//! no mid-request reconfiguration: the controller copies the values it
//! needs at entry time.

use crate::utils::errors::{CaptureError, Result};
use serde::Deserialize;

/// Capture switches for the interception layer.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Global instrumentation switch. Off makes every entry a no-op.
    pub enabled: bool,

    /// Copy inbound request headers onto the span at entry.
    pub request_headers: bool,

    /// Copy response headers onto the span at completion.
    pub response_headers: bool,

    /// Capture the request body and attach it at completion.
    pub request_body: bool,

    /// Capture the response body and attach it at completion.
    pub response_body: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            request_headers: true,
            response_headers: true,
            request_body: true,
            response_body: true,
        }
    }
}

impl CaptureConfig {
    /// Load configuration from the environment.
    ///
    /// Reads `SPANTAP_*` variables (e.g. `SPANTAP_RESPONSE_BODY=false`);
    /// anything unset keeps its default.
    pub fn load() -> Result<Self> {
        let source = config::Config::builder()
            .add_source(config::Environment::with_prefix("SPANTAP").try_parsing(true))
            .build()
            .map_err(|e| CaptureError::Config(e.to_string()))?;

        source
            .try_deserialize()
            .map_err(|e| CaptureError::Config(e.to_string()))
    }
}
