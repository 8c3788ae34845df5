//! Platform audio session output modes
use serde::{Deserialize, Serialize};

/// How the app's audio shares the platform output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Narration only; other apps' audio is interrupted
    Exclusive,

    /// Narration mixed with the ambient loop
    Mixed,
}

impl OutputMode {
    /// Mode required for the given set of active streams
    #[must_use]
    pub fn for_streams(ambient_active: bool) -> Self {
        if ambient_active {
            Self::Mixed
        } else {
            Self::Exclusive
        }
    }
}

impl std::fmt::Display for OutputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exclusive => write!(f, "exclusive"),
            Self::Mixed => write!(f, "mixed"),
        }
    }
}
