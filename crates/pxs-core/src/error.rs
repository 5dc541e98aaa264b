//! Core error types.
//!
//! Two families: [`Denial`] is a user-facing gate refusal that never mutates
//! state, everything else in [`CoreError`] is a failed external call or a
//! misuse of the pipeline.

use pxs_models::{Feature, ScaleFactor, TierLevel};
use pxs_supabase::SupabaseError;
use pxs_upscale_client::UpscaleError;
use thiserror::Error;

use crate::session::ActorKind;

pub type CoreResult<T> = Result<T, CoreError>;

/// What the UI should offer after a denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// Show the pricing modal.
    Upgrade,
    /// Show the sign-in modal.
    Login,
}

/// Entitlement or credit gate refusal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Denial {
    #[error("{requested} exceeds the {tier} tier maximum of {max}")]
    ScaleNotAllowed {
        requested: ScaleFactor,
        max: ScaleFactor,
        tier: TierLevel,
    },

    #[error("{feature} requires the {required} tier")]
    FeatureLocked { feature: Feature, required: TierLevel },

    #[error("{requested} files exceed the {tier} batch limit of {limit}")]
    BatchTooLarge {
        requested: usize,
        limit: u32,
        tier: TierLevel,
    },

    #[error("No credits left")]
    OutOfCredits { actor: ActorKind },

    #[error("Sign in required")]
    LoginRequired,
}

impl Denial {
    pub fn prompt(&self) -> Prompt {
        match self {
            Denial::OutOfCredits {
                actor: ActorKind::Guest,
            }
            | Denial::LoginRequired => Prompt::Login,
            _ => Prompt::Upgrade,
        }
    }

    /// Metric label.
    pub fn reason(&self) -> &'static str {
        match self {
            Denial::ScaleNotAllowed { .. } => "scale",
            Denial::FeatureLocked { .. } => "feature",
            Denial::BatchTooLarge { .. } => "batch",
            Denial::OutOfCredits { .. } => "credits",
            Denial::LoginRequired => "login",
        }
    }
}

/// Errors from core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Denied: {0}")]
    Denied(#[from] Denial),

    #[error("An upscale is already in progress")]
    AlreadyProcessing,

    #[error("Signed-in user changed before the credit was debited")]
    PayerChanged,

    #[error("Store error: {0}")]
    Store(#[from] SupabaseError),

    #[error("Upscale failed: {0}")]
    Upscale(#[from] UpscaleError),

    #[error("Not a purchasable plan: {0}")]
    InvalidPlan(TierLevel),

    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CoreError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn denial(&self) -> Option<&Denial> {
        match self {
            CoreError::Denied(denial) => Some(denial),
            _ => None,
        }
    }

    /// Prompt to show, if this error is a gate refusal.
    pub fn prompt(&self) -> Option<Prompt> {
        self.denial().map(Denial::prompt)
    }
}
