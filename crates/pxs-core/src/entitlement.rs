//! Entitlement gate.
//!
//! Pure lookups over the tier catalog. A missing tier (guest, or a member
//! without a plan) is treated as free. Every refusal is counted.

use pxs_models::{Feature, ScaleFactor, TierLevel, UpscaleOptions};
use tracing::debug;

use crate::error::Denial;
use crate::metrics::record_denial;

fn level_of(tier: Option<TierLevel>) -> TierLevel {
    tier.unwrap_or(TierLevel::Free)
}

/// Whether `tier` unlocks `feature`.
pub fn has_access(tier: Option<TierLevel>, feature: Feature) -> bool {
    level_of(tier) >= feature.required_tier()
}

/// Same as [`has_access`] for a raw feature name. Unknown names use
/// [`pxs_models::UNKNOWN_FEATURE_REQUIREMENT`].
pub fn has_access_by_name(tier: Option<TierLevel>, feature: &str) -> bool {
    level_of(tier) >= Feature::requirement_for_name(feature)
}

pub fn max_scale_for(tier: Option<TierLevel>) -> ScaleFactor {
    level_of(tier).benefits().max_upscale
}

/// Gate an upscale request before anything is sent.
///
/// The scale is checked first, then each enabled enhancement flag.
pub fn check_options(tier: Option<TierLevel>, options: &UpscaleOptions) -> Result<(), Denial> {
    let tier = level_of(tier);
    let max = max_scale_for(Some(tier));

    if options.scale > max {
        return Err(deny(Denial::ScaleNotAllowed {
            requested: options.scale,
            max,
            tier,
        }));
    }

    for feature in options.requested_features() {
        if !has_access(Some(tier), feature) {
            return Err(deny(Denial::FeatureLocked {
                feature,
                required: feature.required_tier(),
            }));
        }
    }

    Ok(())
}

/// Gate the number of files submitted at once.
pub fn check_batch(tier: Option<TierLevel>, count: usize) -> Result<(), Denial> {
    let tier = level_of(tier);
    let limit = tier.benefits().batch_limit;
    if count > limit as usize {
        return Err(deny(Denial::BatchTooLarge {
            requested: count,
            limit,
            tier,
        }));
    }
    Ok(())
}

pub(crate) fn deny(denial: Denial) -> Denial {
    debug!(reason = denial.reason(), "Entitlement denied: {}", denial);
    record_denial(denial.reason());
    denial
}
