//! Reinforcement intensity presets.

use serde::{Deserialize, Serialize};

/// Typical rebar intensities for reinforced elements.
///
/// `Custom` leaves whatever intensity the user entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RebarLevel {
    #[default]
    Custom,
    Light,
    Medium,
    Heavy,
}

impl RebarLevel {
    pub const ALL: [RebarLevel; 4] = [
        RebarLevel::Custom,
        RebarLevel::Light,
        RebarLevel::Medium,
        RebarLevel::Heavy,
    ];

    /// Preset intensity in kg of steel per m³ of concrete.
    pub fn intensity_kg_per_m3(&self) -> Option<f64> {
        match self {
            RebarLevel::Custom => None,
            RebarLevel::Light => Some(60.0),
            RebarLevel::Medium => Some(90.0),
            RebarLevel::Heavy => Some(120.0),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            RebarLevel::Custom => "Custom",
            RebarLevel::Light => "Light (60 kg/m³)",
            RebarLevel::Medium => "Medium (90 kg/m³)",
            RebarLevel::Heavy => "Heavy (120 kg/m³)",
        }
    }

    /// Parse from common string representations
    pub fn from_str_flexible(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "custom" => Some(RebarLevel::Custom),
            "light" => Some(RebarLevel::Light),
            "medium" => Some(RebarLevel::Medium),
            "heavy" => Some(RebarLevel::Heavy),
            _ => None,
        }
    }
}

impl std::fmt::Display for RebarLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
