//! Supabase REST access for PixelScale.
//!
//! This crate provides:
//! - `SupabaseClient`: PostgREST client with retry, tracing and metrics
//! - Repositories for profiles, history and support tickets
//! - The `process_referral` RPC

pub mod client;
pub mod error;
pub mod history;
pub mod metrics;
pub mod profiles;
pub mod referrals;
pub mod retry;
pub mod support;

pub use client::{eq, QueryPair, SupabaseClient, SupabaseConfig};
pub use error::{SupabaseError, SupabaseResult};
pub use history::HistoryRepository;
pub use profiles::ProfileRepository;
pub use referrals::ReferralRpc;
pub use retry::RetryConfig;
pub use support::SupportTicketRepository;
