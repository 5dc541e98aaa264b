//! Hosted checkout URLs.
//!
//! The `payment=success` flag on return is advisory only; entitlements are
//! granted by the provider's webhook on the server.

use pxs_models::TierLevel;
use tracing::info;
use url::Url;

use crate::entitlement::deny;
use crate::error::{CoreError, CoreResult, Denial};
use crate::session::Session;

const PAYMENT_PARAM: &str = "payment";
const PAYMENT_SUCCESS: &str = "success";

/// Checkout provider settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutConfig {
    pub store_id: String,
    pub starter_variant: String,
    pub pro_variant: String,
    pub business_variant: String,
    /// Site origin used for the default success URL.
    pub site_origin: Url,
}

impl CheckoutConfig {
    /// Placeholder store and variants for `site_origin`.
    pub fn new(site_origin: Url) -> Self {
        Self {
            store_id: "your_store_id".to_string(),
            starter_variant: "starter_variant".to_string(),
            pro_variant: "pro_variant".to_string(),
            business_variant: "business_variant".to_string(),
            site_origin,
        }
    }

    /// Create config from environment variables.
    pub fn from_env(site_origin: Url) -> Self {
        let defaults = Self::new(site_origin);
        Self {
            store_id: env_or("LEMONSQUEEZY_STORE_ID", defaults.store_id),
            starter_variant: env_or("LEMONSQUEEZY_STARTER_VARIANT_ID", defaults.starter_variant),
            pro_variant: env_or("LEMONSQUEEZY_PRO_VARIANT_ID", defaults.pro_variant),
            business_variant: env_or("LEMONSQUEEZY_BUSINESS_VARIANT_ID", defaults.business_variant),
            site_origin: defaults.site_origin,
        }
    }

    pub fn variant_for(&self, plan: TierLevel) -> CoreResult<&str> {
        let variant = match plan {
            TierLevel::Starter => &self.starter_variant,
            TierLevel::Pro => &self.pro_variant,
            TierLevel::Business => &self.business_variant,
            TierLevel::Free => return Err(CoreError::InvalidPlan(plan)),
        };
        if variant.trim().is_empty() {
            return Err(CoreError::InvalidPlan(plan));
        }
        Ok(variant)
    }

    /// `{origin}?payment=success`
    pub fn default_success_url(&self) -> String {
        format!(
            "{}?{}={}",
            self.site_origin.as_str().trim_end_matches('/'),
            PAYMENT_PARAM,
            PAYMENT_SUCCESS
        )
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(default)
}

/// Build the checkout URL for `plan`.
pub fn checkout_url(
    config: &CheckoutConfig,
    plan: TierLevel,
    user_id: &str,
    email: &str,
    success_url: Option<&str>,
    cancel_url: Option<&str>,
) -> CoreResult<Url> {
    let variant = config.variant_for(plan)?;
    let base = format!(
        "https://{}.lemonsqueezy.com/checkout/buy/{}",
        config.store_id, variant
    );
    let mut url = Url::parse(&base)
        .map_err(|e| CoreError::config(format!("bad checkout store or variant: {}", e)))?;

    let success_url = success_url
        .map(str::to_string)
        .unwrap_or_else(|| config.default_success_url());

    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("checkout[custom][user_id]", user_id)
            .append_pair("checkout[email]", email)
            .append_pair("checkout[success_url]", &success_url);
        if let Some(cancel_url) = cancel_url {
            query.append_pair("checkout[cancel_url]", cancel_url);
        }
    }

    Ok(url)
}

/// Checkout URL for the signed-in member. Guests must sign in first.
pub fn purchase_url(config: &CheckoutConfig, session: &Session, plan: TierLevel) -> CoreResult<Url> {
    let actor = session.actor();
    let member = actor
        .member()
        .ok_or_else(|| deny(Denial::LoginRequired))?;

    let url = checkout_url(config, plan, &member.id, &member.email, None, None)?;
    info!(user_id = %member.id, plan = %plan, "Checkout opened");
    Ok(url)
}

/// Whether the return URL carries `payment=success`.
pub fn payment_succeeded(url: &Url) -> bool {
    url.query_pairs()
        .any(|(key, value)| key == PAYMENT_PARAM && value == PAYMENT_SUCCESS)
}

/// `url` without the `payment` parameter.
pub fn clear_payment_param(url: &Url) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != PAYMENT_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut cleared = url.clone();
    if kept.is_empty() {
        cleared.set_query(None);
    } else {
        cleared.query_pairs_mut().clear().extend_pairs(kept);
    }
    cleared
}
