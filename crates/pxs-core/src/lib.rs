//! PixelScale core: entitlements, credit ledgers, sign-in reconciliation
//! and the upscale pipeline.
//!
//! External collaborators sit behind traits ([`ProfileStore`],
//! [`ReferralProcessor`], [`Upscaler`], [`HistoryStore`], [`SupportDesk`],
//! [`LocalDeviceStore`], [`Clock`]); [`adapters`] implements them over the
//! Supabase and upscale clients.

pub mod adapters;
pub mod batch;
pub mod checkout;
pub mod clock;
pub mod config;
pub mod device_store;
pub mod entitlement;
pub mod error;
pub mod guest;
pub mod history;
pub mod logging;
pub mod member;
pub mod metrics;
pub mod preferences;
pub mod referral;
pub mod services;
pub mod session;
pub mod support;
pub mod upscale;

pub use batch::{admit_batch, BatchAdmission, BatchCandidate, RejectReason, MAX_BATCH_FILE_BYTES};
pub use checkout::{checkout_url, clear_payment_param, payment_succeeded, purchase_url, CheckoutConfig};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::AppConfig;
pub use device_store::{keys, LocalDeviceStore, MemoryDeviceStore};
pub use entitlement::{check_batch, check_options, has_access, has_access_by_name, max_scale_for};
pub use error::{CoreError, CoreResult, Denial, Prompt};
pub use guest::{GuestLedger, GUEST_STARTING_CREDITS, GUEST_TOP_UP_THRESHOLD};
pub use history::{HistoryService, HistoryStore};
pub use logging::init_tracing;
pub use member::{reconcile_profile, LedgerWrite, MemberLedger, ProfileStore, Reconciliation};
pub use preferences::{cookie_consent, language, set_cookie_consent, set_language, CookieConsent, Language};
pub use referral::{
    capture_referral, consume_pending_referral, pending_referral, referral_link, ReferralOutcome,
    ReferralProcessor,
};
pub use services::Services;
pub use session::{
    Actor, ActorKind, AuthEvent, AuthIdentity, MemberView, Reconciled, Session, SessionChange,
    SessionReconciler,
};
pub use support::{submit_ticket, SupportDesk};
pub use upscale::{DebitStatus, UpscaleOutcome, UpscalePipeline, Upscaler};
