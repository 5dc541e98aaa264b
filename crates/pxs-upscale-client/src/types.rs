//! Upscale service request/response types.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pxs_models::{ScaleFactor, TierLevel};
use serde::{Deserialize, Serialize};

/// Image selected by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl SourceImage {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Body of `POST /upscale`.
#[derive(Debug, Clone)]
pub struct UpscaleRequest {
    pub source: SourceImage,
    pub scale: ScaleFactor,
    /// Sent as `quality_tier`; the service caps input resolution for free.
    pub tier: TierLevel,
}

/// Upscaled image returned by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpscaledImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
    /// Wall-clock time from request to last byte.
    pub processing_time: Duration,
}

impl UpscaledImage {
    /// `data:` URL suitable for direct display.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.content_type, STANDARD.encode(&self.bytes))
    }

    /// Processing time rounded to whole seconds, as shown to the user.
    pub fn processing_secs(&self) -> u64 {
        (self.processing_time.as_millis() as u64 + 500) / 1000
    }
}

/// Health check response (`GET /`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub device: Option<String>,
}
