//! Upscale history for tiers that keep it.

use std::sync::Arc;

use async_trait::async_trait;
use pxs_models::{Feature, UpscaleRecord};
use tracing::info;

use crate::entitlement::{deny, has_access};
use crate::error::{CoreResult, Denial};
use crate::session::{Actor, MemberView};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn save(&self, record: &UpscaleRecord) -> CoreResult<()>;
    /// Newest first, at most [`pxs_models::HISTORY_PAGE_LIMIT`] entries.
    async fn list(&self, user_id: &str) -> CoreResult<Vec<UpscaleRecord>>;
    async fn clear(&self, user_id: &str) -> CoreResult<()>;
}

/// History access gated behind [`Feature::History`].
#[derive(Clone)]
pub struct HistoryService {
    store: Arc<dyn HistoryStore>,
}

impl HistoryService {
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> Arc<dyn HistoryStore> {
        Arc::clone(&self.store)
    }

    fn member<'a>(&self, actor: &'a Actor) -> Result<&'a MemberView, Denial> {
        let member = actor.member().ok_or_else(|| deny(Denial::LoginRequired))?;
        if !has_access(Some(member.tier), Feature::History) {
            return Err(deny(Denial::FeatureLocked {
                feature: Feature::History,
                required: Feature::History.required_tier(),
            }));
        }
        Ok(member)
    }

    pub async fn list(&self, actor: &Actor) -> CoreResult<Vec<UpscaleRecord>> {
        let member = self.member(actor)?;
        self.store.list(&member.id).await
    }

    pub async fn clear(&self, actor: &Actor) -> CoreResult<()> {
        let member = self.member(actor)?;
        self.store.clear(&member.id).await?;
        info!(user_id = %member.id, "History cleared");
        Ok(())
    }
}
