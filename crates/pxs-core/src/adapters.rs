//! Trait implementations over the Supabase repositories and the upscale
//! client.

use async_trait::async_trait;
use pxs_models::{NewProfile, ProfilePatch, ProfileRow, SupportTicket, UpscaleRecord};
use pxs_supabase::{HistoryRepository, ProfileRepository, ReferralRpc, SupportTicketRepository};
use pxs_upscale_client::{UpscaleClient, UpscaleRequest, UpscaledImage};

use crate::error::CoreResult;
use crate::history::HistoryStore;
use crate::member::ProfileStore;
use crate::referral::ReferralProcessor;
use crate::support::SupportDesk;
use crate::upscale::Upscaler;

#[async_trait]
impl ProfileStore for ProfileRepository {
    async fn fetch_profile(&self, user_id: &str) -> CoreResult<Option<ProfileRow>> {
        Ok(self.fetch(user_id).await?)
    }

    async fn insert_profile(&self, profile: &NewProfile) -> CoreResult<()> {
        Ok(self.insert(profile).await?)
    }

    async fn update_profile(&self, user_id: &str, patch: &ProfilePatch) -> CoreResult<()> {
        Ok(self.update(user_id, patch).await?)
    }
}

#[async_trait]
impl ReferralProcessor for ReferralRpc {
    async fn process_referral(&self, new_user_id: &str, referrer_id: &str) -> CoreResult<bool> {
        Ok(self.process(new_user_id, referrer_id).await?)
    }
}

#[async_trait]
impl HistoryStore for HistoryRepository {
    async fn save(&self, record: &UpscaleRecord) -> CoreResult<()> {
        Ok(HistoryRepository::save(self, record).await?)
    }

    async fn list(&self, user_id: &str) -> CoreResult<Vec<UpscaleRecord>> {
        Ok(HistoryRepository::list(self, user_id).await?)
    }

    async fn clear(&self, user_id: &str) -> CoreResult<()> {
        Ok(HistoryRepository::clear(self, user_id).await?)
    }
}

#[async_trait]
impl SupportDesk for SupportTicketRepository {
    async fn create_ticket(&self, ticket: &SupportTicket) -> CoreResult<()> {
        Ok(self.create(ticket).await?)
    }
}

#[async_trait]
impl Upscaler for UpscaleClient {
    async fn upscale(&self, request: UpscaleRequest) -> CoreResult<UpscaledImage> {
        Ok(UpscaleClient::upscale(self, &request).await?)
    }
}
