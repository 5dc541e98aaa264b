//! Signed-in state and the sign-in reconciliation pipeline.
//!
//! On a signed-out to signed-in transition the pipeline runs, in order:
//! ledger fetch, pending referral, member view. A ledger failure stops it
//! before any referral work.

use std::sync::{Arc, Mutex, MutexGuard};

use pxs_models::{MemberStats, TierLevel};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{error, info, warn};

use crate::device_store::LocalDeviceStore;
use crate::entitlement::deny;
use crate::error::{CoreError, CoreResult, Denial};
use crate::guest::GuestLedger;
use crate::member::MemberLedger;
use crate::metrics::{record_debit, record_leak};
use crate::referral::{consume_pending_referral, ReferralOutcome, ReferralProcessor};

const DEFAULT_DISPLAY_NAME: &str = "User";
const AVATAR_FALLBACK_BASE: &str = "https://api.dicebear.com/7.x/avataaars/svg?seed=";

/// Which kind of actor holds a balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorKind {
    Guest,
    Member,
}

impl ActorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorKind::Guest => "guest",
            ActorKind::Member => "member",
        }
    }
}

impl std::fmt::Display for ActorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity delivered by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthIdentity {
    pub user_id: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl AuthIdentity {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: Some(email.into()),
            ..Self::default()
        }
    }
}

/// Auth state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(AuthIdentity),
    SignedOut,
}

/// In-memory view of a signed-in member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberView {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub avatar_url: String,
    pub credits: u32,
    pub tier: TierLevel,
    pub is_premium: bool,
}

impl MemberView {
    pub fn new(identity: &AuthIdentity, stats: &MemberStats) -> Self {
        let email = identity.email.clone().unwrap_or_default();
        Self {
            id: identity.user_id.clone(),
            display_name: display_name(identity),
            avatar_url: non_empty(identity.avatar_url.as_deref())
                .map(str::to_string)
                .unwrap_or_else(|| format!("{}{}", AVATAR_FALLBACK_BASE, identity.user_id)),
            email,
            credits: stats.credits,
            tier: stats.tier(),
            is_premium: stats.is_premium,
        }
    }

    fn apply(&mut self, stats: &MemberStats) {
        self.credits = stats.credits;
        self.tier = stats.tier();
        self.is_premium = stats.is_premium;
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn display_name(identity: &AuthIdentity) -> String {
    if let Some(name) = non_empty(identity.full_name.as_deref()) {
        return name.to_string();
    }
    non_empty(identity.email.as_deref())
        .and_then(|email| email.split('@').next())
        .filter(|local| !local.is_empty())
        .unwrap_or(DEFAULT_DISPLAY_NAME)
        .to_string()
}

/// Current actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Guest,
    Member(MemberView),
}

impl Actor {
    pub fn kind(&self) -> ActorKind {
        match self {
            Actor::Guest => ActorKind::Guest,
            Actor::Member(_) => ActorKind::Member,
        }
    }

    /// Tier for entitlement checks; `None` for guests.
    pub fn tier(&self) -> Option<TierLevel> {
        match self {
            Actor::Guest => None,
            Actor::Member(member) => Some(member.tier),
        }
    }

    pub fn member(&self) -> Option<&MemberView> {
        match self {
            Actor::Guest => None,
            Actor::Member(member) => Some(member),
        }
    }

    /// Whether both actors hold the same balance: both guests, or the same
    /// member id.
    pub fn same_payer(&self, other: &Actor) -> bool {
        match (self, other) {
            (Actor::Guest, Actor::Guest) => true,
            (Actor::Member(a), Actor::Member(b)) => a.id == b.id,
            _ => false,
        }
    }
}

/// Result of one sign-in reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub member: MemberView,
    pub stats: MemberStats,
    pub referral: ReferralOutcome,
}

/// Runs the sign-in pipeline.
#[derive(Clone)]
pub struct SessionReconciler {
    ledger: MemberLedger,
    device: Arc<dyn LocalDeviceStore>,
    referrals: Arc<dyn ReferralProcessor>,
}

impl SessionReconciler {
    pub fn new(
        ledger: MemberLedger,
        device: Arc<dyn LocalDeviceStore>,
        referrals: Arc<dyn ReferralProcessor>,
    ) -> Self {
        Self {
            ledger,
            device,
            referrals,
        }
    }

    pub fn ledger(&self) -> &MemberLedger {
        &self.ledger
    }

    pub async fn reconcile(&self, identity: &AuthIdentity) -> CoreResult<Reconciled> {
        let email = identity.email.as_deref().unwrap_or_default();
        let stats = self.ledger.fetch(&identity.user_id, email).await?;

        let referral =
            consume_pending_referral(self.device.as_ref(), self.referrals.as_ref(), &identity.user_id)
                .await;

        let member = MemberView::new(identity, &stats);
        info!(
            user_id = %member.id,
            tier = %member.tier,
            credits = member.credits,
            referral = referral.label(),
            "Member signed in"
        );

        Ok(Reconciled {
            member,
            stats,
            referral,
        })
    }
}

/// What an auth event did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    SignedIn(Box<Reconciled>),
    SignedOut,
    Unchanged,
}

/// The current actor plus the device's guest ledger.
///
/// Auth events are applied one at a time, and so are debits. The std locks
/// guard the in-memory state and are never held across an await.
pub struct Session {
    reconciler: SessionReconciler,
    guest: Mutex<GuestLedger>,
    actor: Mutex<Actor>,
    auth_gate: AsyncMutex<()>,
    debit_gate: AsyncMutex<()>,
}

impl Session {
    /// Start as a guest, loading the device ledger.
    pub fn new(reconciler: SessionReconciler, device: Arc<dyn LocalDeviceStore>) -> Self {
        Self {
            reconciler,
            guest: Mutex::new(GuestLedger::load(device)),
            actor: Mutex::new(Actor::Guest),
            auth_gate: AsyncMutex::new(()),
            debit_gate: AsyncMutex::new(()),
        }
    }

    fn actor_lock(&self) -> MutexGuard<'_, Actor> {
        self.actor.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn guest_lock(&self) -> MutexGuard<'_, GuestLedger> {
        self.guest.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn actor(&self) -> Actor {
        self.actor_lock().clone()
    }

    pub fn tier(&self) -> Option<TierLevel> {
        self.actor_lock().tier()
    }

    /// Balance of the current actor.
    pub fn balance(&self) -> u32 {
        match &*self.actor_lock() {
            Actor::Guest => self.guest_lock().balance(),
            Actor::Member(member) => member.credits,
        }
    }

    /// Apply an auth event.
    ///
    /// Events are applied one at a time. Reconciles only on a transition
    /// into a member, or to a different member; a repeated or overlapping
    /// sign-in for the current member is ignored. On failure the actor is
    /// left as it was.
    pub async fn handle_auth_event(&self, event: AuthEvent) -> CoreResult<SessionChange> {
        let _serial = self.auth_gate.lock().await;

        match event {
            AuthEvent::SignedOut => {
                let mut actor = self.actor_lock();
                if matches!(*actor, Actor::Guest) {
                    return Ok(SessionChange::Unchanged);
                }
                *actor = Actor::Guest;
                info!("Member signed out");
                Ok(SessionChange::SignedOut)
            }
            AuthEvent::SignedIn(identity) => {
                let already = self
                    .actor_lock()
                    .member()
                    .is_some_and(|m| m.id == identity.user_id);
                if already {
                    return Ok(SessionChange::Unchanged);
                }

                let reconciled = self.reconciler.reconcile(&identity).await.map_err(|e| {
                    warn!(user_id = %identity.user_id, "Sign-in reconciliation failed: {}", e);
                    e
                })?;

                *self.actor_lock() = Actor::Member(reconciled.member.clone());
                Ok(SessionChange::SignedIn(Box::new(reconciled)))
            }
        }
    }

    /// Re-read the member ledger. On failure the cached balance stays.
    pub async fn refresh_member(&self) -> CoreResult<Option<MemberView>> {
        let _serial = self.debit_gate.lock().await;
        let Some(member) = self.actor_lock().member().cloned() else {
            return Ok(None);
        };

        let stats = match self.reconciler.ledger().fetch(&member.id, &member.email).await {
            Ok(stats) => stats,
            Err(e) => {
                warn!(
                    user_id = %member.id,
                    cached_credits = member.credits,
                    "Ledger refresh failed, keeping cached balance: {}", e
                );
                return Err(e);
            }
        };

        let mut actor = self.actor_lock();
        match &mut *actor {
            Actor::Member(current) if current.id == member.id => {
                current.apply(&stats);
                Ok(Some(current.clone()))
            }
            _ => Ok(None),
        }
    }

    /// Refuse early when the actor has nothing to spend.
    pub fn ensure_can_spend(&self) -> CoreResult<()> {
        let kind = {
            let actor = self.actor_lock();
            match &*actor {
                Actor::Guest if self.guest_lock().can_spend() => return Ok(()),
                Actor::Member(member) if member.credits > 0 => return Ok(()),
                other => other.kind(),
            }
        };
        Err(deny(Denial::OutOfCredits { actor: kind }).into())
    }

    /// Debit one credit from the current actor. Returns the new balance.
    pub async fn charge_one(&self) -> CoreResult<u32> {
        let payer = self.actor();
        self.charge(&payer).await
    }

    /// Debit one credit from `payer`, who must still be the current actor.
    ///
    /// Debits run one at a time, so the member's cached balance read here is
    /// the one the previous debit left behind.
    pub async fn charge(&self, payer: &Actor) -> CoreResult<u32> {
        let _serial = self.debit_gate.lock().await;

        let current = self.actor();
        if !current.same_payer(payer) {
            warn!(
                expected = %payer.kind(),
                current = %current.kind(),
                "Actor changed before debit"
            );
            return Err(CoreError::PayerChanged);
        }

        let remaining = match &current {
            Actor::Guest => {
                let mut guest = self.guest_lock();
                guest.debit()?
            }
            Actor::Member(member) => {
                let remaining = self
                    .reconciler
                    .ledger()
                    .debit(&member.id, member.credits)
                    .await?;
                if let Actor::Member(cached) = &mut *self.actor_lock() {
                    if cached.id == member.id {
                        cached.credits = remaining;
                    }
                }
                remaining
            }
        };

        record_debit(current.kind().as_str());
        Ok(remaining)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("actor", &*self.actor_lock())
            .field("guest", &*self.guest_lock())
            .finish()
    }
}

/// Log a debit that failed after the user already received the result.
pub(crate) fn report_leak(kind: ActorKind, err: &CoreError) {
    error!(actor = %kind, "Credit leak: upscale delivered but debit failed: {}", err);
    record_leak(kind.as_str());
}
