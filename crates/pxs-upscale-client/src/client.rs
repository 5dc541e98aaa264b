//! Upscale service HTTP client.

use std::time::{Duration, Instant};

use reqwest::multipart::{Form, Part};
use reqwest::{header::CONTENT_TYPE, Client};
use tracing::{debug, info, warn};

use crate::error::{UpscaleError, UpscaleResult};
use crate::types::{UpscaleRequest, UpscaledImage};

/// Content type assumed when the service omits one.
const DEFAULT_IMAGE_CONTENT_TYPE: &str = "image/png";

/// Configuration for the upscale client.
#[derive(Debug, Clone)]
pub struct UpscaleClientConfig {
    /// Base URL of the upscale service
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Max retries on retryable errors
    pub max_retries: u32,
}

impl Default for UpscaleClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001".to_string(),
            timeout: Duration::from_secs(300), // large inputs at 16x are slow
            max_retries: 0,
        }
    }
}

impl UpscaleClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("UPSCALE_API_URL")
                .unwrap_or_else(|_| "http://localhost:8001".to_string()),
            timeout: Duration::from_secs(
                std::env::var("UPSCALE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
            max_retries: std::env::var("UPSCALE_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
        }
    }
}

/// Client for the upscale service.
#[derive(Debug, Clone)]
pub struct UpscaleClient {
    http: Client,
    config: UpscaleClientConfig,
}

impl UpscaleClient {
    /// Create a new upscale client.
    pub fn new(config: UpscaleClientConfig) -> UpscaleResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("pxs-upscale-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(UpscaleError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> UpscaleResult<Self> {
        Self::new(UpscaleClientConfig::from_env())
    }

    pub fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    /// Check if the upscale service is reachable.
    pub async fn health_check(&self) -> UpscaleResult<bool> {
        let url = format!("{}/", self.base_url());

        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => Ok(true),
            Ok(response) => {
                warn!("Upscale service health check failed: {}", response.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Upscale service health check error: {}", e);
                Ok(false)
            }
        }
    }

    /// Upscale an image. Returns the image bytes and the elapsed time.
    pub async fn upscale(&self, request: &UpscaleRequest) -> UpscaleResult<UpscaledImage> {
        if request.source.bytes.is_empty() {
            return Err(UpscaleError::InvalidRequest("empty image".to_string()));
        }

        let url = format!("{}/upscale", self.base_url());
        debug!(
            file = %request.source.file_name,
            bytes = request.source.size(),
            scale = %request.scale,
            tier = %request.tier,
            "Sending upscale request to {}", url
        );

        let started = Instant::now();
        let response = self
            .with_retry(|| async {
                let form = build_form(request)?;
                let response = self
                    .http
                    .post(&url)
                    .multipart(form)
                    .send()
                    .await
                    .map_err(UpscaleError::Network)?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(UpscaleError::from_http_status(status.as_u16(), body));
                }
                Ok(response)
            })
            .await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
            .unwrap_or_else(|| DEFAULT_IMAGE_CONTENT_TYPE.to_string());
        let bytes = response.bytes().await?.to_vec();
        let processing_time = started.elapsed();

        info!(
            file = %request.source.file_name,
            scale = %request.scale,
            output_bytes = bytes.len(),
            elapsed_ms = processing_time.as_millis() as u64,
            "Upscale complete"
        );

        Ok(UpscaledImage {
            bytes,
            content_type,
            processing_time,
        })
    }

    /// Execute with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> UpscaleResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = UpscaleResult<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                    warn!(
                        "Upscale request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error
            .unwrap_or_else(|| UpscaleError::ServiceUnavailable("Unknown error".to_string())))
    }
}

fn build_form(request: &UpscaleRequest) -> UpscaleResult<Form> {
    let file = Part::bytes(request.source.bytes.clone())
        .file_name(request.source.file_name.clone())
        .mime_str(&request.source.content_type)
        .map_err(|e| UpscaleError::InvalidRequest(format!("bad content type: {}", e)))?;

    Ok(Form::new()
        .part("file", file)
        .text("scale", request.scale.form_value())
        .text("quality_tier", request.tier.as_str()))
}
