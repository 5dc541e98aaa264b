//! Upscale history records (kept for tiers with history enabled).

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Maximum number of history entries returned by a listing.
pub const HISTORY_PAGE_LIMIT: usize = 50;

/// A completed upscale as stored in the `upscale_history` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UpscaleRecord {
    /// Row ID, assigned by the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub user_id: String,
    pub original_filename: String,
    pub output_filename: String,
    pub scale_factor: u32,
    pub processing_time_ms: u64,
    pub created_at: DateTime<Utc>,
}

impl UpscaleRecord {
    /// Build a record for a finished upscale. The output name is
    /// `{file}_{scale}x`.
    pub fn new(
        user_id: impl Into<String>,
        file_name: impl Into<String>,
        scale_factor: u32,
        processing_time_ms: u64,
    ) -> Self {
        let original_filename = file_name.into();
        Self {
            id: None,
            user_id: user_id.into(),
            output_filename: format!("{}_{}x", original_filename, scale_factor),
            original_filename,
            scale_factor,
            processing_time_ms,
            created_at: Utc::now(),
        }
    }
}
