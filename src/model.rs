//! Registry of supported backend models.

use serde::{Deserialize, Serialize};

/// Identifier for a supported video generation model.
///
/// The set is closed: each variant maps to exactly one fal.ai queue
/// endpoint, so an unknown model can only enter the system as external
/// input and is rejected by [`ModelId::resolve`] before any backend call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelId {
    /// Luma Dream Machine Ray2 Flash (default).
    #[default]
    Luma,
    /// Kling v1.6 Pro.
    Kling,
}

impl ModelId {
    /// All supported models, in catalog order.
    pub const ALL: [ModelId; 2] = [ModelId::Luma, ModelId::Kling];

    /// Returns the fal.ai queue endpoint for this model.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Luma => "fal-ai/luma-dream-machine/ray-2-flash/image-to-video",
            Self::Kling => "fal-ai/kling-video/v1.6/pro/image-to-video",
        }
    }

    /// Looks up a model by its external identifier.
    pub fn resolve(name: &str) -> Option<ModelId> {
        match name {
            "luma" => Some(Self::Luma),
            "kling" => Some(Self::Kling),
            _ => None,
        }
    }

    /// Comma-joined list of supported identifiers, for error messages.
    pub fn supported() -> String {
        Self::ALL
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Luma => write!(f, "luma"),
            Self::Kling => write!(f, "kling"),
        }
    }
}
