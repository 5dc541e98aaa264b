//! Client for the image upscaling service.
//!
//! The service is a black box reached over HTTP: `POST /upscale` with a
//! multipart body returns the upscaled image bytes, `GET /` reports health.

pub mod client;
pub mod error;
pub mod types;

pub use client::{UpscaleClient, UpscaleClientConfig};
pub use error::{UpscaleError, UpscaleResult};
pub use types::{HealthResponse, SourceImage, UpscaleRequest, UpscaledImage};
