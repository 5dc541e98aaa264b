//! Wiring of the live clients into the core services.

use std::sync::Arc;

use pxs_supabase::{
    HistoryRepository, ProfileRepository, ReferralRpc, SupabaseClient, SupportTicketRepository,
};
use pxs_upscale_client::UpscaleClient;
use url::Url;

use crate::checkout::CheckoutConfig;
use crate::clock::SystemClock;
use crate::config::AppConfig;
use crate::device_store::LocalDeviceStore;
use crate::error::CoreResult;
use crate::history::HistoryService;
use crate::member::MemberLedger;
use crate::session::{Session, SessionReconciler};
use crate::support::SupportDesk;
use crate::upscale::UpscalePipeline;

/// Everything a front end needs for one device.
pub struct Services {
    pub site_origin: Url,
    pub session: Session,
    pub pipeline: UpscalePipeline,
    pub history: HistoryService,
    pub support: Arc<dyn SupportDesk>,
    pub checkout: CheckoutConfig,
    pub device: Arc<dyn LocalDeviceStore>,
}

impl Services {
    /// Connect to the live backends. `access_token` is the signed-in user's
    /// JWT, if any.
    pub fn connect(
        config: &AppConfig,
        device: Arc<dyn LocalDeviceStore>,
        access_token: Option<&str>,
    ) -> CoreResult<Self> {
        let mut supabase = SupabaseClient::new(config.supabase.clone())?;
        if let Some(token) = access_token {
            supabase = supabase.with_access_token(token);
        }
        let upscaler = UpscaleClient::new(config.upscale.clone())?;

        let ledger = MemberLedger::new(
            Arc::new(ProfileRepository::new(supabase.clone())),
            Arc::new(SystemClock),
        );
        let reconciler = SessionReconciler::new(
            ledger,
            Arc::clone(&device),
            Arc::new(ReferralRpc::new(supabase.clone())),
        );
        let history = HistoryService::new(Arc::new(HistoryRepository::new(supabase.clone())));
        let pipeline = UpscalePipeline::new(Arc::new(upscaler)).with_history(history.store());

        Ok(Self {
            site_origin: config.site_origin.clone(),
            session: Session::new(reconciler, Arc::clone(&device)),
            pipeline,
            history,
            support: Arc::new(SupportTicketRepository::new(supabase)),
            checkout: config.checkout.clone(),
            device,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device_store::{keys, MemoryDeviceStore};
    use pxs_supabase::SupabaseConfig;
    use pxs_upscale_client::UpscaleClientConfig;

    fn config() -> AppConfig {
        let site_origin = Url::parse("https://pixelscale.ai").unwrap();
        AppConfig {
            upscale: UpscaleClientConfig::default(),
            supabase: SupabaseConfig::new("https://proj.supabase.co", "anon"),
            checkout: CheckoutConfig::new(site_origin.clone()),
            site_origin,
        }
    }

    #[test]
    fn test_connect_starts_as_guest() {
        let device = Arc::new(MemoryDeviceStore::new());
        let services = Services::connect(&config(), device.clone(), Some("jwt")).unwrap();

        assert!(services.session.actor().member().is_none());
        assert_eq!(services.session.balance(), 50);
        assert_eq!(device.get(keys::GUEST_CREDITS).as_deref(), Some("50"));
        assert!(!services.pipeline.is_processing());
        assert_eq!(services.site_origin.as_str(), "https://pixelscale.ai/");
    }
}
