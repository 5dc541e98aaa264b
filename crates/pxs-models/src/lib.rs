//! Shared data models for PixelScale.
//!
//! This crate provides Serde-serializable types for:
//! - Subscription tiers and their benefits
//! - Feature requirements
//! - Upscale options and quality presets
//! - Member profile rows and reconciled member stats
//! - Upscale history and support tickets

pub mod feature;
pub mod history;
pub mod options;
pub mod profile;
pub mod support;
pub mod tier;

// Re-export common types
pub use feature::{Feature, UNKNOWN_FEATURE_REQUIREMENT};
pub use history::{UpscaleRecord, HISTORY_PAGE_LIMIT};
pub use options::{BackendModel, QualityPreset, ScaleFactor, UnsupportedScale, UpscaleMode, UpscaleOptions};
pub use profile::{MemberStats, NewProfile, ProfilePatch, ProfileRow};
pub use support::{SupportTicket, SupportTicketDraft, TicketStatus};
pub use tier::{
    CreditGrantKind, TierBenefits, TierLevel, COST_PER_UPSCALE, FREE_DAILY_CREDITS, REFERRAL_BONUS,
};
