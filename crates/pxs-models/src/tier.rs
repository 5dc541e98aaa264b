//! Subscription tiers and the benefits each one grants.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::options::ScaleFactor;

/// Credits granted to a free member on every daily reset.
pub const FREE_DAILY_CREDITS: u32 = 10;

/// Credits spent by one successful upscale.
pub const COST_PER_UPSCALE: u32 = 1;

/// Credits the referral processor grants to each side of a referral.
/// Granted server-side; kept here for display.
pub const REFERRAL_BONUS: u32 = 3;

/// Subscription tier, totally ordered `free < starter < pro < business`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum TierLevel {
    #[default]
    Free,
    Starter,
    Pro,
    Business,
}

impl TierLevel {
    /// All tiers in ascending order.
    pub const ALL: [TierLevel; 4] = [
        TierLevel::Free,
        TierLevel::Starter,
        TierLevel::Pro,
        TierLevel::Business,
    ];

    /// Parse from string (case-insensitive). Unknown names yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "free" => Some(TierLevel::Free),
            "starter" => Some(TierLevel::Starter),
            "pro" => Some(TierLevel::Pro),
            "business" => Some(TierLevel::Business),
            _ => None,
        }
    }

    /// Ordinal used for every entitlement comparison.
    pub fn level(&self) -> u8 {
        match self {
            TierLevel::Free => 0,
            TierLevel::Starter => 1,
            TierLevel::Pro => 2,
            TierLevel::Business => 3,
        }
    }

    /// Whether this tier is sold through checkout.
    pub fn is_paid(&self) -> bool {
        !matches!(self, TierLevel::Free)
    }

    /// Get the tier name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TierLevel::Free => "free",
            TierLevel::Starter => "starter",
            TierLevel::Pro => "pro",
            TierLevel::Business => "business",
        }
    }

    /// Benefits granted by this tier.
    pub fn benefits(&self) -> TierBenefits {
        TierBenefits::for_tier(*self)
    }
}

impl std::fmt::Display for TierLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a tier's credit grant is replenished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CreditGrantKind {
    /// Restored to the grant once per calendar day.
    Daily,
    /// Granted once on purchase, never reset.
    OneShot,
}

/// Numeric benefits of a tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierBenefits {
    /// Processing speed relative to the free tier.
    pub speed_multiplier: f64,
    /// Credits granted by the tier.
    pub credit_grant: u32,
    /// Whether the grant is daily or one-shot.
    pub grant_kind: CreditGrantKind,
    /// Largest scale factor the tier may request.
    pub max_upscale: ScaleFactor,
    /// Maximum files in one batch.
    pub batch_limit: u32,
    /// Upscale history is kept.
    pub has_history: bool,
    /// API access is enabled.
    pub has_api: bool,
}

impl TierBenefits {
    /// Benefits for a specific tier.
    pub fn for_tier(tier: TierLevel) -> Self {
        match tier {
            TierLevel::Free => Self {
                speed_multiplier: 1.0,
                credit_grant: FREE_DAILY_CREDITS,
                grant_kind: CreditGrantKind::Daily,
                max_upscale: ScaleFactor::X4,
                batch_limit: 1,
                has_history: false,
                has_api: false,
            },
            TierLevel::Starter => Self {
                speed_multiplier: 1.0,
                credit_grant: 75,
                grant_kind: CreditGrantKind::OneShot,
                max_upscale: ScaleFactor::X8,
                batch_limit: 1,
                has_history: false,
                has_api: false,
            },
            TierLevel::Pro => Self {
                speed_multiplier: 2.0,
                credit_grant: 200,
                grant_kind: CreditGrantKind::OneShot,
                max_upscale: ScaleFactor::X8,
                batch_limit: 5,
                has_history: true,
                has_api: false,
            },
            TierLevel::Business => Self {
                speed_multiplier: 4.0,
                credit_grant: 600,
                grant_kind: CreditGrantKind::OneShot,
                max_upscale: ScaleFactor::X16,
                batch_limit: 20,
                has_history: true,
                has_api: true,
            },
        }
    }
}
