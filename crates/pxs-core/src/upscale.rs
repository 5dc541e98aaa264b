//! The upscale pipeline: gate, call the service, then debit.
//!
//! The debit is only issued once the upscaled image is in hand, and only
//! against the actor the gate approved. A failed debit at that point is a
//! credit leak: logged, counted and reported in the outcome, never retried.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pxs_models::{TierLevel, UpscaleOptions, UpscaleRecord};
use pxs_upscale_client::{SourceImage, UpscaleRequest, UpscaledImage};
use tracing::{info, warn};

use crate::entitlement::check_options;
use crate::error::{CoreError, CoreResult};
use crate::history::HistoryStore;
use crate::metrics::record_upscale;
use crate::session::{report_leak, Actor, Session};

/// External upscale service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Upscaler: Send + Sync {
    async fn upscale(&self, request: UpscaleRequest) -> CoreResult<UpscaledImage>;
}

/// What happened to the credit after a successful upscale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebitStatus {
    Charged { remaining: u32 },
    Leaked { reason: String },
}

#[derive(Debug, Clone)]
pub struct UpscaleOutcome {
    pub image: UpscaledImage,
    pub processing_time: Duration,
    pub debit: DebitStatus,
}

/// Clears the in-flight flag when dropped.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct UpscalePipeline {
    upscaler: Arc<dyn Upscaler>,
    history: Option<Arc<dyn HistoryStore>>,
    in_flight: AtomicBool,
}

impl UpscalePipeline {
    pub fn new(upscaler: Arc<dyn Upscaler>) -> Self {
        Self {
            upscaler,
            history: None,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Record finished upscales for tiers that keep history.
    pub fn with_history(mut self, history: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn is_processing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn acquire(&self) -> CoreResult<InFlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| CoreError::AlreadyProcessing)?;
        Ok(InFlightGuard(&self.in_flight))
    }

    /// Run one upscale for the session's current actor.
    pub async fn submit(
        &self,
        session: &Session,
        source: SourceImage,
        options: UpscaleOptions,
    ) -> CoreResult<UpscaleOutcome> {
        let _guard = self.acquire()?;

        let actor = session.actor();
        let tier = actor.tier();

        if let Err(denial) = check_options(tier, &options) {
            record_upscale("denied", None);
            return Err(denial.into());
        }
        if let Err(e) = session.ensure_can_spend() {
            record_upscale("denied", None);
            return Err(e);
        }

        let file_name = source.file_name.clone();
        let request = UpscaleRequest {
            source,
            scale: options.scale,
            tier: tier.unwrap_or(TierLevel::Free),
        };

        let image = match self.upscaler.upscale(request).await {
            Ok(image) => image,
            Err(e) => {
                warn!(file = %file_name, scale = %options.scale, "Upscale failed: {}", e);
                record_upscale("failed", None);
                return Err(e);
            }
        };
        let processing_time = image.processing_time;
        record_upscale("success", Some(processing_time));

        let debit = match session.charge(&actor).await {
            Ok(remaining) => DebitStatus::Charged { remaining },
            Err(e) => {
                report_leak(actor.kind(), &e);
                DebitStatus::Leaked {
                    reason: e.to_string(),
                }
            }
        };

        if let Actor::Member(member) = &actor {
            if member.tier.benefits().has_history {
                self.record_history(&member.id, &file_name, options.scale.factor(), processing_time)
                    .await;
            }
        }

        info!(
            actor = %actor.kind(),
            file = %file_name,
            scale = %options.scale,
            elapsed_ms = processing_time.as_millis() as u64,
            debit = ?debit,
            "Upscale delivered"
        );

        Ok(UpscaleOutcome {
            image,
            processing_time,
            debit,
        })
    }

    async fn record_history(&self, user_id: &str, file_name: &str, scale: u32, elapsed: Duration) {
        let Some(history) = &self.history else {
            return;
        };
        let record = UpscaleRecord::new(user_id, file_name, scale, elapsed.as_millis() as u64);
        if let Err(e) = history.save(&record).await {
            warn!(user_id = %user_id, "History save failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::device_store::{keys, LocalDeviceStore, MemoryDeviceStore};
    use crate::error::Denial;
    use crate::member::{MemberLedger, MockProfileStore};
    use crate::referral::MockReferralProcessor;
    use crate::session::{AuthEvent, AuthIdentity, SessionReconciler};
    use pxs_models::ScaleFactor;
    use pxs_upscale_client::UpscaleError;

    fn image() -> UpscaledImage {
        UpscaledImage {
            bytes: b"out".to_vec(),
            content_type: "image/png".to_string(),
            processing_time: Duration::from_millis(800),
        }
    }

    fn source() -> SourceImage {
        SourceImage::new("cat.png", "image/png", b"in".to_vec())
    }

    fn guest_session(device: Arc<MemoryDeviceStore>) -> Session {
        let mut store = MockProfileStore::new();
        store.expect_fetch_profile().never();
        let ledger = MemberLedger::new(
            Arc::new(store),
            Arc::new(FixedClock::new(chrono::NaiveDate::from_ymd_opt(2025, 3, 2).unwrap())),
        );
        let reconciler =
            SessionReconciler::new(ledger, device.clone(), Arc::new(MockReferralProcessor::new()));
        Session::new(reconciler, device)
    }

    #[tokio::test]
    async fn test_success_debits_after_upscale() {
        let device = Arc::new(MemoryDeviceStore::new());
        let session = guest_session(device.clone());
        let mut upscaler = MockUpscaler::new();
        upscaler
            .expect_upscale()
            .withf(|req| req.scale == ScaleFactor::X4 && req.tier == TierLevel::Free)
            .times(1)
            .returning(|_| Ok(image()));

        let pipeline = UpscalePipeline::new(Arc::new(upscaler));
        let outcome = pipeline
            .submit(&session, source(), UpscaleOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome.debit, DebitStatus::Charged { remaining: 49 });
        assert_eq!(device.get(keys::GUEST_CREDITS).as_deref(), Some("49"));
        assert!(!pipeline.is_processing());
    }

    #[tokio::test]
    async fn test_failure_leaves_balance() {
        let device = Arc::new(MemoryDeviceStore::new());
        let session = guest_session(device.clone());
        let mut upscaler = MockUpscaler::new();
        upscaler.expect_upscale().times(1).returning(|_| {
            Err(CoreError::Upscale(UpscaleError::Rejected {
                status: 500,
                body: "CUDA OOM".to_string(),
            }))
        });

        let pipeline = UpscalePipeline::new(Arc::new(upscaler));
        assert!(pipeline
            .submit(&session, source(), UpscaleOptions::default())
            .await
            .is_err());
        assert_eq!(session.balance(), 50);
        assert!(!pipeline.is_processing());
    }

    #[tokio::test]
    async fn test_denied_scale_never_calls_service() {
        let session = guest_session(Arc::new(MemoryDeviceStore::new()));
        let mut upscaler = MockUpscaler::new();
        upscaler.expect_upscale().never();

        let pipeline = UpscalePipeline::new(Arc::new(upscaler));
        let err = pipeline
            .submit(&session, source(), UpscaleOptions::with_scale(ScaleFactor::X8))
            .await
            .unwrap_err();
        assert!(matches!(err.denial(), Some(Denial::ScaleNotAllowed { .. })));
    }

    #[tokio::test]
    async fn test_guest_at_zero_prompted_to_login() {
        let device = Arc::new(MemoryDeviceStore::with_entries([(keys::GUEST_CREDITS, "10")]));
        let session = guest_session(device);
        for _ in 0..10 {
            session.charge_one().await.unwrap();
        }
        let mut upscaler = MockUpscaler::new();
        upscaler.expect_upscale().never();

        let err = UpscalePipeline::new(Arc::new(upscaler))
            .submit(&session, source(), UpscaleOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.prompt(), Some(crate::error::Prompt::Login));
    }

    #[tokio::test]
    async fn test_member_debit_failure_is_leak() {
        let today = chrono::NaiveDate::from_ymd_opt(2025, 3, 2).unwrap();
        let mut store = MockProfileStore::new();
        store.expect_fetch_profile().returning(move |id| {
            Ok(Some(pxs_models::ProfileRow {
                id: id.to_string(),
                email: None,
                credits: 3,
                is_premium: false,
                daily_limit: Some(10),
                last_reset_date: Some(today),
                premium_expiry_date: None,
                premium_tier: None,
            }))
        });
        store.expect_update_profile().times(1).returning(|_, _| {
            Err(CoreError::Store(pxs_supabase::SupabaseError::from_http_status(503, "down")))
        });

        let device = Arc::new(MemoryDeviceStore::new());
        let ledger = MemberLedger::new(Arc::new(store), Arc::new(FixedClock::new(today)));
        let reconciler =
            SessionReconciler::new(ledger, device.clone(), Arc::new(MockReferralProcessor::new()));
        let session = Session::new(reconciler, device);
        session
            .handle_auth_event(AuthEvent::SignedIn(AuthIdentity::new("u1", "a@b.co")))
            .await
            .unwrap();

        let mut upscaler = MockUpscaler::new();
        upscaler.expect_upscale().times(1).returning(|_| Ok(image()));
        let outcome = UpscalePipeline::new(Arc::new(upscaler))
            .submit(&session, source(), UpscaleOptions::default())
            .await
            .unwrap();

        assert!(matches!(outcome.debit, DebitStatus::Leaked { .. }));
        assert_eq!(outcome.image.bytes, b"out".to_vec());
        assert_eq!(session.balance(), 3);
    }

    #[test]
    fn test_second_acquire_rejected_until_drop() {
        let pipeline = UpscalePipeline::new(Arc::new(MockUpscaler::new()));
        let guard = pipeline.acquire().unwrap();
        assert!(matches!(pipeline.acquire(), Err(CoreError::AlreadyProcessing)));
        drop(guard);
        assert!(pipeline.acquire().is_ok());
    }
}
