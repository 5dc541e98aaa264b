//! `profiles` table access.

use pxs_models::{NewProfile, ProfilePatch, ProfileRow};
use tracing::{debug, info};

use crate::client::{eq, SupabaseClient};
use crate::error::SupabaseResult;

pub const PROFILES_TABLE: &str = "profiles";

/// Reads and writes member profile rows.
#[derive(Debug, Clone)]
pub struct ProfileRepository {
    client: SupabaseClient,
}

impl ProfileRepository {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// Fetch a member's row. `None` when the member has no row yet.
    pub async fn fetch(&self, user_id: &str) -> SupabaseResult<Option<ProfileRow>> {
        let rows: Vec<ProfileRow> = self
            .client
            .select(PROFILES_TABLE, &[("id", eq(user_id)), ("limit", "1".to_string())])
            .await?;

        debug!(user_id = %user_id, found = !rows.is_empty(), "Fetched profile");
        Ok(rows.into_iter().next())
    }

    pub async fn insert(&self, profile: &NewProfile) -> SupabaseResult<()> {
        self.client
            .insert(PROFILES_TABLE, std::slice::from_ref(profile))
            .await?;
        info!(user_id = %profile.id, credits = profile.credits, "Created profile");
        Ok(())
    }

    /// Apply a partial update. An empty patch sends nothing.
    pub async fn update(&self, user_id: &str, patch: &ProfilePatch) -> SupabaseResult<()> {
        if patch.is_empty() {
            return Ok(());
        }
        self.client
            .update(PROFILES_TABLE, &[("id", eq(user_id))], patch)
            .await
    }
}
