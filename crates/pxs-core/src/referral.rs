//! Referral attribution: captured from the landing URL, held on the device,
//! and submitted once when the referred visitor signs in.

use async_trait::async_trait;
use tracing::{info, warn};
use url::Url;

use crate::device_store::{keys, LocalDeviceStore};
use crate::error::CoreResult;
use crate::metrics::record_referral;

/// Query parameter carrying the referrer id.
pub const REFERRAL_PARAM: &str = "ref";

/// Code shared by visitors who are not signed in; never an attribution.
pub const GUEST_REFERRAL_CODE: &str = "guest";

/// Server-side referral processing. Grants both bonuses and deduplicates by
/// referrer and referee.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReferralProcessor: Send + Sync {
    async fn process_referral(&self, new_user_id: &str, referrer_id: &str) -> CoreResult<bool>;
}

/// Result of trying to consume the pending attribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferralOutcome {
    NonePending,
    /// Processor accepted; local attribution deleted.
    Credited { referrer_id: String },
    /// Processor answered `false`; attribution stays pending.
    Declined { referrer_id: String },
    /// Processor call failed; attribution stays pending.
    Failed { referrer_id: String },
    /// Attribution named the member themself; discarded unsent.
    SelfReferral,
}

impl ReferralOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ReferralOutcome::NonePending => "none",
            ReferralOutcome::Credited { .. } => "credited",
            ReferralOutcome::Declined { .. } => "declined",
            ReferralOutcome::Failed { .. } => "failed",
            ReferralOutcome::SelfReferral => "self",
        }
    }
}

/// Store the `ref` code from a landing URL unless one is already pending.
///
/// Returns the code when a new attribution was stored.
pub fn capture_referral(store: &dyn LocalDeviceStore, landing_url: &Url) -> Option<String> {
    let code = landing_url
        .query_pairs()
        .find(|(key, _)| key == REFERRAL_PARAM)
        .map(|(_, value)| value.trim().to_string())?;

    if code.is_empty() || code == GUEST_REFERRAL_CODE {
        return None;
    }
    if let Some(existing) = pending_referral(store) {
        info!(pending = %existing, ignored = %code, "Referral already pending");
        return None;
    }

    store.set(keys::REFERRER, &code);
    info!(referrer_id = %code, "Referral captured");
    Some(code)
}

pub fn pending_referral(store: &dyn LocalDeviceStore) -> Option<String> {
    store
        .get(keys::REFERRER)
        .filter(|code| !code.trim().is_empty())
}

/// Share link for a member: `{origin}/?ref={member_id}`.
pub fn referral_link(origin: &Url, member_id: &str) -> String {
    let mut link = origin.clone();
    link.set_path("/");
    link.set_fragment(None);
    link.query_pairs_mut()
        .clear()
        .append_pair(REFERRAL_PARAM, member_id);
    link.to_string()
}

/// Submit the pending attribution for a freshly signed-in member.
///
/// At most one processor call per invocation. Only a `true` answer deletes
/// the attribution; a self-referral is deleted without a call.
pub async fn consume_pending_referral(
    store: &dyn LocalDeviceStore,
    processor: &dyn ReferralProcessor,
    member_id: &str,
) -> ReferralOutcome {
    let Some(referrer_id) = pending_referral(store) else {
        return ReferralOutcome::NonePending;
    };

    let outcome = if referrer_id == member_id {
        store.remove(keys::REFERRER);
        warn!(member_id = %member_id, "Self-referral discarded");
        ReferralOutcome::SelfReferral
    } else {
        match processor.process_referral(member_id, &referrer_id).await {
            Ok(true) => {
                store.remove(keys::REFERRER);
                info!(member_id = %member_id, referrer_id = %referrer_id, "Referral credited");
                ReferralOutcome::Credited { referrer_id }
            }
            Ok(false) => {
                info!(member_id = %member_id, referrer_id = %referrer_id, "Referral declined");
                ReferralOutcome::Declined { referrer_id }
            }
            Err(e) => {
                warn!(member_id = %member_id, referrer_id = %referrer_id, "Referral processing failed: {}", e);
                ReferralOutcome::Failed { referrer_id }
            }
        }
    };

    record_referral(outcome.label());
    outcome
}
