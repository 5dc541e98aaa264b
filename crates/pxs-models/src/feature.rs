//! Named features and the minimum tier each one requires.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tier::TierLevel;

/// Requirement applied to feature names that are not in [`Feature::ALL`].
///
/// Fail-open: an unknown name only needs the lowest tier. Switching this to
/// `TierLevel::Business` makes unknown names fail-closed everywhere.
pub const UNKNOWN_FEATURE_REQUIREMENT: TierLevel = TierLevel::Free;

/// Gated product feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Feature {
    #[serde(rename = "BASIC_UPSCALE")]
    BasicUpscale,
    #[serde(rename = "8X_UPSCALE")]
    Upscale8x,
    #[serde(rename = "BATCH_UPLOAD")]
    BatchUpload,
    #[serde(rename = "NO_ADS")]
    NoAds,
    #[serde(rename = "CROP")]
    Crop,
    #[serde(rename = "HISTORY")]
    History,
    #[serde(rename = "ANIME_MODE")]
    AnimeMode,
    #[serde(rename = "AI_MODEL_SELECT")]
    AiModelSelect,
    #[serde(rename = "ARTIFACT_REMOVAL")]
    ArtifactRemoval,
    #[serde(rename = "16X_UPSCALE")]
    Upscale16x,
    #[serde(rename = "REMOVE_BG")]
    RemoveBackground,
    #[serde(rename = "FACE_ENHANCE")]
    FaceEnhance,
    #[serde(rename = "API_ACCESS")]
    ApiAccess,
}

impl Feature {
    pub const ALL: [Feature; 13] = [
        Feature::BasicUpscale,
        Feature::Upscale8x,
        Feature::BatchUpload,
        Feature::NoAds,
        Feature::Crop,
        Feature::History,
        Feature::AnimeMode,
        Feature::AiModelSelect,
        Feature::ArtifactRemoval,
        Feature::Upscale16x,
        Feature::RemoveBackground,
        Feature::FaceEnhance,
        Feature::ApiAccess,
    ];

    /// Minimum tier that unlocks this feature.
    pub fn required_tier(&self) -> TierLevel {
        match self {
            Feature::BasicUpscale => TierLevel::Free,
            Feature::Upscale8x | Feature::BatchUpload | Feature::NoAds => TierLevel::Starter,
            Feature::Crop
            | Feature::History
            | Feature::AnimeMode
            | Feature::AiModelSelect
            | Feature::ArtifactRemoval => TierLevel::Pro,
            Feature::Upscale16x
            | Feature::RemoveBackground
            | Feature::FaceEnhance
            | Feature::ApiAccess => TierLevel::Business,
        }
    }

    /// Wire name, e.g. `8X_UPSCALE`.
    pub fn name(&self) -> &'static str {
        match self {
            Feature::BasicUpscale => "BASIC_UPSCALE",
            Feature::Upscale8x => "8X_UPSCALE",
            Feature::BatchUpload => "BATCH_UPLOAD",
            Feature::NoAds => "NO_ADS",
            Feature::Crop => "CROP",
            Feature::History => "HISTORY",
            Feature::AnimeMode => "ANIME_MODE",
            Feature::AiModelSelect => "AI_MODEL_SELECT",
            Feature::ArtifactRemoval => "ARTIFACT_REMOVAL",
            Feature::Upscale16x => "16X_UPSCALE",
            Feature::RemoveBackground => "REMOVE_BG",
            Feature::FaceEnhance => "FACE_ENHANCE",
            Feature::ApiAccess => "API_ACCESS",
        }
    }

    /// Parse a wire name. Exact match only.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    /// Requirement for an arbitrary feature name, falling back to
    /// [`UNKNOWN_FEATURE_REQUIREMENT`].
    pub fn requirement_for_name(name: &str) -> TierLevel {
        Self::from_name(name)
            .map(|f| f.required_tier())
            .unwrap_or(UNKNOWN_FEATURE_REQUIREMENT)
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
