//! In-memory stand-ins for the external collaborators.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use pxs_core::{
    CoreError, CoreResult, FixedClock, MemberLedger, MemoryDeviceStore, ProfileStore,
    ReferralProcessor, Session, SessionReconciler, Upscaler,
};
use pxs_models::{NewProfile, ProfilePatch, ProfileRow, TierLevel};
use pxs_supabase::SupabaseError;
use pxs_upscale_client::{SourceImage, UpscaleRequest, UpscaledImage};

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn free_row(id: &str, credits: i64, last_reset: NaiveDate) -> ProfileRow {
    ProfileRow {
        id: id.to_string(),
        email: Some(format!("{id}@example.com")),
        credits,
        is_premium: false,
        daily_limit: Some(10),
        last_reset_date: Some(last_reset),
        premium_expiry_date: None,
        premium_tier: None,
    }
}

pub fn premium_row(id: &str, tier: TierLevel, credits: i64, expiry: Option<NaiveDate>) -> ProfileRow {
    ProfileRow {
        is_premium: true,
        daily_limit: Some(tier.benefits().credit_grant as i64),
        premium_expiry_date: expiry,
        premium_tier: Some(tier),
        ..free_row(id, credits, day(2025, 1, 1))
    }
}

/// Profile table held in memory. Applies patches like PostgREST would.
#[derive(Default)]
pub struct InMemoryProfiles {
    rows: Mutex<HashMap<String, ProfileRow>>,
    pub inserts: AtomicUsize,
    pub updates: AtomicUsize,
    offline: Mutex<bool>,
    latency: Mutex<Duration>,
}

impl InMemoryProfiles {
    pub fn with_rows(rows: impl IntoIterator<Item = ProfileRow>) -> Self {
        let store = Self::default();
        {
            let mut map = store.rows.lock().unwrap();
            for row in rows {
                map.insert(row.id.clone(), row);
            }
        }
        store
    }

    pub fn row(&self, id: &str) -> Option<ProfileRow> {
        self.rows.lock().unwrap().get(id).cloned()
    }

    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock().unwrap() = offline;
    }

    /// Delay applied to every fetch and update.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    async fn round_trip(&self) {
        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    fn check_online(&self) -> CoreResult<()> {
        if *self.offline.lock().unwrap() {
            return Err(CoreError::Store(SupabaseError::from_http_status(503, "unavailable")));
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfiles {
    async fn fetch_profile(&self, user_id: &str) -> CoreResult<Option<ProfileRow>> {
        self.round_trip().await;
        self.check_online()?;
        Ok(self.row(user_id))
    }

    async fn insert_profile(&self, profile: &NewProfile) -> CoreResult<()> {
        self.check_online()?;
        self.inserts.fetch_add(1, Ordering::SeqCst);
        let row = ProfileRow {
            id: profile.id.clone(),
            email: Some(profile.email.clone()),
            credits: profile.credits as i64,
            is_premium: profile.is_premium,
            daily_limit: Some(profile.daily_limit as i64),
            last_reset_date: Some(profile.last_reset_date),
            premium_expiry_date: None,
            premium_tier: None,
        };
        self.rows.lock().unwrap().insert(row.id.clone(), row);
        Ok(())
    }

    async fn update_profile(&self, user_id: &str, patch: &ProfilePatch) -> CoreResult<()> {
        self.round_trip().await;
        self.check_online()?;
        self.updates.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.get_mut(user_id) else {
            return Ok(());
        };
        if let Some(credits) = patch.credits {
            row.credits = credits as i64;
        }
        if let Some(is_premium) = patch.is_premium {
            row.is_premium = is_premium;
        }
        if let Some(limit) = patch.daily_limit {
            row.daily_limit = Some(limit as i64);
        }
        if let Some(date) = patch.last_reset_date {
            row.last_reset_date = Some(date);
        }
        Ok(())
    }
}

/// Referral processor answering a fixed value and counting calls.
pub struct CountingReferrals {
    answer: bool,
    pub calls: Mutex<Vec<(String, String)>>,
}

impl CountingReferrals {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ReferralProcessor for CountingReferrals {
    async fn process_referral(&self, new_user_id: &str, referrer_id: &str) -> CoreResult<bool> {
        self.calls
            .lock()
            .unwrap()
            .push((new_user_id.to_string(), referrer_id.to_string()));
        Ok(self.answer)
    }
}

/// Upscaler that echoes the input and counts calls.
#[derive(Default)]
pub struct EchoUpscaler {
    pub calls: AtomicUsize,
    pub last: Mutex<Option<UpscaleRequest>>,
    latency: Duration,
}

impl EchoUpscaler {
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Upscaler for EchoUpscaler {
    async fn upscale(&self, request: UpscaleRequest) -> CoreResult<UpscaledImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let bytes = request.source.bytes.repeat(2);
        *self.last.lock().unwrap() = Some(request);
        Ok(UpscaledImage {
            bytes,
            content_type: "image/png".to_string(),
            processing_time: Duration::from_millis(250),
        })
    }
}

pub fn photo() -> SourceImage {
    SourceImage::new("photo.png", "image/png", b"pixels".to_vec())
}

/// Everything a scenario needs, wired around the fakes.
pub struct Harness {
    pub device: Arc<MemoryDeviceStore>,
    pub profiles: Arc<InMemoryProfiles>,
    pub referrals: Arc<CountingReferrals>,
    pub clock: Arc<FixedClock>,
    pub session: Session,
}

impl Harness {
    pub fn new(device: MemoryDeviceStore, profiles: InMemoryProfiles, today: NaiveDate) -> Self {
        Self::with_referrals(device, profiles, CountingReferrals::answering(true), today)
    }

    pub fn with_referrals(
        device: MemoryDeviceStore,
        profiles: InMemoryProfiles,
        referrals: CountingReferrals,
        today: NaiveDate,
    ) -> Self {
        let device = Arc::new(device);
        let profiles = Arc::new(profiles);
        let referrals = Arc::new(referrals);
        let clock = Arc::new(FixedClock::new(today));

        let ledger = MemberLedger::new(profiles.clone(), clock.clone());
        let reconciler = SessionReconciler::new(ledger, device.clone(), referrals.clone());
        let session = Session::new(reconciler, device.clone());

        Self {
            device,
            profiles,
            referrals,
            clock,
            session,
        }
    }

    pub fn ledger(&self) -> MemberLedger {
        MemberLedger::new(self.profiles.clone(), self.clock.clone())
    }
}
