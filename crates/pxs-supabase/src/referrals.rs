//! Server-side referral processing.

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::client::SupabaseClient;
use crate::error::SupabaseResult;

pub const PROCESS_REFERRAL_FN: &str = "process_referral";

#[derive(Debug, Serialize)]
struct ProcessReferralArgs<'a> {
    new_user_id: &'a str,
    referrer_id: &'a str,
}

/// Calls the `process_referral` function. The function grants both
/// bonuses atomically, so the call is never repeated on failure.
#[derive(Debug, Clone)]
pub struct ReferralRpc {
    client: SupabaseClient,
}

impl ReferralRpc {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// Returns `true` only when the function answered literally `true`.
    pub async fn process(&self, new_user_id: &str, referrer_id: &str) -> SupabaseResult<bool> {
        let args = ProcessReferralArgs {
            new_user_id,
            referrer_id,
        };
        let result: Value = self.client.rpc(PROCESS_REFERRAL_FN, &args).await?;
        let credited = result == Value::Bool(true);

        info!(
            new_user_id = %new_user_id,
            referrer_id = %referrer_id,
            credited,
            "Referral processed"
        );
        Ok(credited)
    }
}
