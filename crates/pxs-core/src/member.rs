//! Server-resident credit ledger for signed-in members.
//!
//! Every profile fetch is a side-effecting read: the row is created if
//! missing, an expired premium is demoted, and free members get their daily
//! reset. The decision is a pure function of the row and today's date
//! ([`reconcile_profile`]); [`MemberLedger`] persists what it decides.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use pxs_models::{MemberStats, NewProfile, ProfilePatch, ProfileRow, FREE_DAILY_CREDITS};
use tracing::{info, warn};

use crate::clock::Clock;
use crate::entitlement::deny;
use crate::error::{CoreResult, Denial};
use crate::session::ActorKind;

/// Storage for member profile rows.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn fetch_profile(&self, user_id: &str) -> CoreResult<Option<ProfileRow>>;
    async fn insert_profile(&self, profile: &NewProfile) -> CoreResult<()>;
    async fn update_profile(&self, user_id: &str, patch: &ProfilePatch) -> CoreResult<()>;
}

/// Write needed to bring the stored row in line with the reconciled state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerWrite {
    None,
    Create(NewProfile),
    Update(ProfilePatch),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub stats: MemberStats,
    pub write: LedgerWrite,
}

/// Decide the member's ledger state for `today`.
///
/// Expiry demotion is applied before the daily reset is evaluated, so a
/// member demoted today is reset in the same pass. Both changes go out as
/// one patch.
pub fn reconcile_profile(
    user_id: &str,
    email: &str,
    row: Option<&ProfileRow>,
    today: NaiveDate,
) -> Reconciliation {
    let Some(row) = row else {
        let profile = NewProfile::free(user_id, email, today);
        return Reconciliation {
            stats: MemberStats {
                credits: profile.credits,
                is_premium: false,
                last_reset_date: today,
                premium_expiry_date: None,
                daily_limit: profile.daily_limit,
                premium_tier: None,
            },
            write: LedgerWrite::Create(profile),
        };
    };

    let mut patch = ProfilePatch::default();
    let mut is_premium = row.is_premium;
    let mut daily_limit = row.effective_daily_limit();
    let mut credits = row.credit_balance();
    let mut last_reset_date = row.last_reset_date;

    let expired = row.premium_expiry_date.is_some_and(|expiry| expiry < today);
    if is_premium && expired {
        is_premium = false;
        daily_limit = FREE_DAILY_CREDITS;
        patch.is_premium = Some(false);
        patch.daily_limit = Some(FREE_DAILY_CREDITS);
    }

    if !is_premium && last_reset_date != Some(today) {
        credits = daily_limit;
        last_reset_date = Some(today);
        patch.credits = Some(credits);
        patch.last_reset_date = Some(today);
    }

    let write = if patch.is_empty() {
        LedgerWrite::None
    } else {
        LedgerWrite::Update(patch)
    };

    Reconciliation {
        stats: MemberStats {
            credits,
            is_premium,
            last_reset_date: last_reset_date.unwrap_or(today),
            premium_expiry_date: row.premium_expiry_date,
            daily_limit,
            premium_tier: row.premium_tier,
        },
        write,
    }
}

/// Member ledger over a [`ProfileStore`].
#[derive(Clone)]
pub struct MemberLedger {
    store: Arc<dyn ProfileStore>,
    clock: Arc<dyn Clock>,
}

impl MemberLedger {
    pub fn new(store: Arc<dyn ProfileStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Fetch, reconcile and persist. Store failures are returned; the caller
    /// keeps its last known balance.
    pub async fn fetch(&self, user_id: &str, email: &str) -> CoreResult<MemberStats> {
        let today = self.clock.today();
        let row = self.store.fetch_profile(user_id).await?;
        let reconciliation = reconcile_profile(user_id, email, row.as_ref(), today);

        match &reconciliation.write {
            LedgerWrite::None => {}
            LedgerWrite::Create(profile) => {
                self.store.insert_profile(profile).await?;
                info!(user_id = %user_id, "Created member profile");
            }
            LedgerWrite::Update(patch) => {
                self.store.update_profile(user_id, patch).await?;
                info!(
                    user_id = %user_id,
                    demoted = patch.is_premium == Some(false),
                    reset = patch.last_reset_date.is_some(),
                    credits = reconciliation.stats.credits,
                    "Reconciled member ledger"
                );
            }
        }

        Ok(reconciliation.stats)
    }

    /// Persist `current - 1`. Refused at zero without touching the store.
    pub async fn debit(&self, user_id: &str, current: u32) -> CoreResult<u32> {
        if current == 0 {
            return Err(deny(Denial::OutOfCredits {
                actor: ActorKind::Member,
            })
            .into());
        }
        let remaining = current - 1;
        if let Err(e) = self
            .store
            .update_profile(user_id, &ProfilePatch::credits(remaining))
            .await
        {
            warn!(user_id = %user_id, "Credit debit failed: {}", e);
            return Err(e);
        }
        Ok(remaining)
    }
}
