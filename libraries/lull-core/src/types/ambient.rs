//! Ambient soundscape selection
use serde::{Deserialize, Serialize};

/// Looping soundscape mixed under narration
///
/// Exactly one value is active at a time; `None` means no soundscape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AmbientSelection {
    /// No soundscape
    #[default]
    None,
    /// Steady rainfall
    Rain,
    /// Waves on a shore
    Ocean,
    /// Forest birdsong
    Nature,
    /// Crackling fire
    Fireplace,
    /// Broadband noise
    WhiteNoise,
    /// Crickets at night
    Night,
}

impl AmbientSelection {
    /// Every selection that maps to an audio asset
    pub const PLAYABLE: [AmbientSelection; 6] = [
        Self::Rain,
        Self::Ocean,
        Self::Nature,
        Self::Fireplace,
        Self::WhiteNoise,
        Self::Night,
    ];

    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Rain => "rain",
            Self::Ocean => "ocean",
            Self::Nature => "nature",
            Self::Fireplace => "fireplace",
            Self::WhiteNoise => "whiteNoise",
            Self::Night => "night",
        }
    }

    /// Parse from string (case-insensitive, accepts `white-noise` and `white_noise`)
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "none" | "off" => Some(Self::None),
            "rain" => Some(Self::Rain),
            "ocean" => Some(Self::Ocean),
            "nature" => Some(Self::Nature),
            "fireplace" => Some(Self::Fireplace),
            "whitenoise" => Some(Self::WhiteNoise),
            "night" => Some(Self::Night),
            _ => None,
        }
    }

    /// Human readable label for status surfaces
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Rain => "Rain",
            Self::Ocean => "Ocean Waves",
            Self::Nature => "Nature",
            Self::Fireplace => "Fireplace",
            Self::WhiteNoise => "White Noise",
            Self::Night => "Night",
        }
    }

    /// Whether this is the "no soundscape" sentinel
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl std::fmt::Display for AmbientSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
