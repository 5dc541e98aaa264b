//! Upscale request options and quality presets.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::feature::Feature;

/// Scale factor accepted by the upscale service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "u32", into = "u32")]
pub enum ScaleFactor {
    X2,
    #[default]
    X4,
    X8,
    X16,
}

/// Returned for a scale factor outside `{2, 4, 8, 16}`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported scale factor: {0}")]
pub struct UnsupportedScale(pub u32);

impl ScaleFactor {
    pub const ALL: [ScaleFactor; 4] = [
        ScaleFactor::X2,
        ScaleFactor::X4,
        ScaleFactor::X8,
        ScaleFactor::X16,
    ];

    pub fn factor(&self) -> u32 {
        match self {
            ScaleFactor::X2 => 2,
            ScaleFactor::X4 => 4,
            ScaleFactor::X8 => 8,
            ScaleFactor::X16 => 16,
        }
    }

    /// Value sent in the `scale` form field.
    pub fn form_value(&self) -> &'static str {
        match self {
            ScaleFactor::X2 => "2",
            ScaleFactor::X4 => "4",
            ScaleFactor::X8 => "8",
            ScaleFactor::X16 => "16",
        }
    }

    /// Feature that licenses this scale, if any beyond basic upscaling.
    pub fn required_feature(&self) -> Option<Feature> {
        match self {
            ScaleFactor::X2 | ScaleFactor::X4 => None,
            ScaleFactor::X8 => Some(Feature::Upscale8x),
            ScaleFactor::X16 => Some(Feature::Upscale16x),
        }
    }
}

impl TryFrom<u32> for ScaleFactor {
    type Error = UnsupportedScale;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(ScaleFactor::X2),
            4 => Ok(ScaleFactor::X4),
            8 => Ok(ScaleFactor::X8),
            16 => Ok(ScaleFactor::X16),
            other => Err(UnsupportedScale(other)),
        }
    }
}

impl From<ScaleFactor> for u32 {
    fn from(scale: ScaleFactor) -> Self {
        scale.factor()
    }
}

impl std::fmt::Display for ScaleFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x", self.factor())
    }
}

/// Model run by the upscale service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum BackendModel {
    #[serde(rename = "real-esrgan")]
    RealEsrgan,
    #[serde(rename = "anime-4x")]
    Anime4x,
}

impl BackendModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendModel::RealEsrgan => "real-esrgan",
            BackendModel::Anime4x => "anime-4x",
        }
    }
}

/// Content mode of an upscale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum UpscaleMode {
    #[default]
    Photo,
    Anime,
}

/// User-facing quality preset. The backend model and mode are derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum QualityPreset {
    /// Balanced speed and quality.
    #[default]
    Standard,
    /// Best result, slower.
    High,
    /// Anime and illustrations.
    Anime,
}

impl QualityPreset {
    pub fn backend_model(&self) -> BackendModel {
        match self {
            QualityPreset::Standard | QualityPreset::High => BackendModel::RealEsrgan,
            QualityPreset::Anime => BackendModel::Anime4x,
        }
    }

    pub fn mode(&self) -> UpscaleMode {
        match self {
            QualityPreset::Anime => UpscaleMode::Anime,
            QualityPreset::Standard | QualityPreset::High => UpscaleMode::Photo,
        }
    }
}

/// Options for a single upscale request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UpscaleOptions {
    pub scale: ScaleFactor,
    pub preset: QualityPreset,
    #[serde(default)]
    pub remove_artifacts: bool,
    #[serde(default)]
    pub face_enhance: bool,
    #[serde(default)]
    pub remove_background: bool,
}

impl UpscaleOptions {
    pub fn with_scale(scale: ScaleFactor) -> Self {
        Self {
            scale,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> UpscaleMode {
        self.preset.mode()
    }

    pub fn model(&self) -> BackendModel {
        self.preset.backend_model()
    }

    /// Features that must be licensed for these options, scale first.
    pub fn requested_features(&self) -> Vec<Feature> {
        let mut features = Vec::new();
        if let Some(feature) = self.scale.required_feature() {
            features.push(feature);
        }
        if self.remove_artifacts {
            features.push(Feature::ArtifactRemoval);
        }
        if self.face_enhance {
            features.push(Feature::FaceEnhance);
        }
        if self.remove_background {
            features.push(Feature::RemoveBackground);
        }
        features
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_try_from() {
        assert_eq!(ScaleFactor::try_from(8), Ok(ScaleFactor::X8));
        assert_eq!(ScaleFactor::try_from(3), Err(UnsupportedScale(3)));
    }

    #[test]
    fn test_scale_serde_as_number() {
        assert_eq!(serde_json::to_string(&ScaleFactor::X16).unwrap(), "16");
        let scale: ScaleFactor = serde_json::from_str("2").unwrap();
        assert_eq!(scale, ScaleFactor::X2);
        assert!(serde_json::from_str::<ScaleFactor>("5").is_err());
    }

    #[test]
    fn test_preset_derives_model_and_mode() {
        assert_eq!(QualityPreset::Standard.backend_model(), BackendModel::RealEsrgan);
        assert_eq!(QualityPreset::High.backend_model(), BackendModel::RealEsrgan);
        assert_eq!(QualityPreset::Anime.backend_model(), BackendModel::Anime4x);
        assert_eq!(QualityPreset::Anime.mode(), UpscaleMode::Anime);
        assert_eq!(QualityPreset::High.mode(), UpscaleMode::Photo);
    }

    #[test]
    fn test_default_options() {
        let options = UpscaleOptions::default();
        assert_eq!(options.scale, ScaleFactor::X4);
        assert_eq!(options.model(), BackendModel::RealEsrgan);
        assert!(options.requested_features().is_empty());
    }

    #[test]
    fn test_requested_features() {
        let options = UpscaleOptions {
            scale: ScaleFactor::X16,
            preset: QualityPreset::Anime,
            remove_artifacts: true,
            face_enhance: false,
            remove_background: true,
        };
        assert_eq!(
            options.requested_features(),
            vec![Feature::Upscale16x, Feature::ArtifactRemoval, Feature::RemoveBackground]
        );
    }
}
