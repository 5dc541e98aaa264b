//! Upscale client error types.

use thiserror::Error;

pub type UpscaleResult<T> = Result<T, UpscaleError>;

#[derive(Debug, Error)]
pub enum UpscaleError {
    #[error("Upscale service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Upscale rejected ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl UpscaleError {
    /// Map a non-2xx response to an error.
    pub fn from_http_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            502..=504 => Self::ServiceUnavailable(format!("{}: {}", status, body)),
            _ => Self::Rejected { status, body },
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            UpscaleError::ServiceUnavailable(_) => true,
            UpscaleError::Network(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }
}
