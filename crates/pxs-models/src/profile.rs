//! Member profile rows as stored in the `profiles` table.
//!
//! The row is the authoritative credit ledger for a member. Dates are
//! calendar days (`YYYY-MM-DD`); timestamp strings written by older
//! clients are truncated to their date part on read.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::tier::{TierLevel, FREE_DAILY_CREDITS};

/// A row of the `profiles` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRow {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub credits: i64,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub daily_limit: Option<i64>,
    #[serde(default, deserialize_with = "date_prefix")]
    pub last_reset_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "date_prefix")]
    pub premium_expiry_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "tier_name")]
    pub premium_tier: Option<TierLevel>,
}

impl ProfileRow {
    /// Stored credits, with negative values read as zero.
    pub fn credit_balance(&self) -> u32 {
        clamp_credits(self.credits)
    }

    /// Stored daily limit, falling back to the free grant when unset or zero.
    pub fn effective_daily_limit(&self) -> u32 {
        match self.daily_limit {
            Some(limit) if limit > 0 => clamp_credits(limit),
            _ => FREE_DAILY_CREDITS,
        }
    }
}

fn clamp_credits(value: i64) -> u32 {
    value.clamp(0, u32::MAX as i64) as u32
}

/// Row inserted the first time a member's profile is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewProfile {
    pub id: String,
    pub email: String,
    pub credits: u32,
    pub is_premium: bool,
    pub daily_limit: u32,
    pub last_reset_date: NaiveDate,
}

impl NewProfile {
    /// Free-tier profile created on `today`.
    pub fn free(id: impl Into<String>, email: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            credits: FREE_DAILY_CREDITS,
            is_premium: false,
            daily_limit: FREE_DAILY_CREDITS,
            last_reset_date: today,
        }
    }
}

/// Partial update of a profile row. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credits: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_premium: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reset_date: Option<NaiveDate>,
}

impl ProfilePatch {
    pub fn credits(credits: u32) -> Self {
        Self {
            credits: Some(credits),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Reconciled view of a member's ledger after a profile fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberStats {
    pub credits: u32,
    pub is_premium: bool,
    pub last_reset_date: NaiveDate,
    pub premium_expiry_date: Option<NaiveDate>,
    pub daily_limit: u32,
    pub premium_tier: Option<TierLevel>,
}

impl MemberStats {
    /// Tier used for entitlement checks. A stored tier only counts while
    /// the member is premium.
    pub fn tier(&self) -> TierLevel {
        if self.is_premium {
            self.premium_tier.unwrap_or_default()
        } else {
            TierLevel::Free
        }
    }
}

fn date_prefix<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => {
            let day = value.split('T').next().unwrap_or(value);
            NaiveDate::parse_from_str(day, "%Y-%m-%d")
                .map(Some)
                .map_err(serde::de::Error::custom)
        }
    }
}

fn tier_name<'de, D>(deserializer: D) -> Result<Option<TierLevel>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(TierLevel::parse))
}
