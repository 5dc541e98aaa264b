//! Application configuration.

use pxs_supabase::SupabaseConfig;
use pxs_upscale_client::UpscaleClientConfig;
use url::Url;

use crate::checkout::CheckoutConfig;
use crate::error::{CoreError, CoreResult};

pub const DEFAULT_SITE_ORIGIN: &str = "http://localhost:3000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Public origin of the site; used for referral and return links.
    pub site_origin: Url,
    pub upscale: UpscaleClientConfig,
    pub supabase: SupabaseConfig,
    pub checkout: CheckoutConfig,
}

impl AppConfig {
    /// Create config from environment variables.
    ///
    /// Fails when the site origin does not parse or the Supabase URL or key
    /// is missing.
    pub fn from_env() -> CoreResult<Self> {
        let origin =
            std::env::var("PXS_SITE_ORIGIN").unwrap_or_else(|_| DEFAULT_SITE_ORIGIN.to_string());
        let site_origin = Url::parse(&origin)
            .map_err(|e| CoreError::config(format!("PXS_SITE_ORIGIN {:?}: {}", origin, e)))?;

        Ok(Self {
            upscale: UpscaleClientConfig::from_env(),
            supabase: SupabaseConfig::from_env()?,
            checkout: CheckoutConfig::from_env(site_origin.clone()),
            site_origin,
        })
    }
}
