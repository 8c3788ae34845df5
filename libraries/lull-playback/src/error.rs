//! Error types for playback coordination

use lull_core::{AmbientSelection, LullError};
use std::path::PathBuf;
use thiserror::Error;

use crate::events::FailureKind;
use crate::types::PlaybackPhase;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Referenced audio bytes are missing or not downloaded yet
    #[error("Audio source unavailable: {0}")]
    SourceUnavailable(String),

    /// The player reported a failure status while loading
    #[error("Decode failed: {0}")]
    DecodeFailed(String),

    /// Resolved duration is zero or not finite
    #[error("Invalid duration: {0}")]
    InvalidDuration(f64),

    /// Platform audio session could not be configured or activated
    #[error("Audio session configuration failed: {0}")]
    SessionConfigurationFailed(String),

    /// Operation is not valid in the current phase
    #[error("Cannot {operation} while {phase}")]
    InvalidState {
        /// Rejected operation
        operation: &'static str,
        /// Phase at the time of the call
        phase: PlaybackPhase,
    },

    /// Ambient asset missing from the assets directory
    #[error("Ambient asset for {selection} missing at {}", .path.display())]
    AssetMissing {
        /// Selection whose asset is missing
        selection: AmbientSelection,
        /// Expected location
        path: PathBuf,
    },

    /// Platform audio engine error outside of loading
    #[error("Audio engine error: {0}")]
    Engine(String),

    /// The coordinator task is gone
    #[error("Playback coordinator is not running")]
    CoordinatorClosed,

    /// Core errors (preferences, I/O)
    #[error(transparent)]
    Core(#[from] LullError),
}

impl PlaybackError {
    /// Create a source unavailable error
    pub fn source_unavailable(msg: impl Into<String>) -> Self {
        Self::SourceUnavailable(msg.into())
    }

    /// Create a decode failure
    pub fn decode_failed(msg: impl Into<String>) -> Self {
        Self::DecodeFailed(msg.into())
    }

    /// Create an engine error
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine(msg.into())
    }

    /// Category used for one-shot error signals
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::SourceUnavailable(_) => FailureKind::SourceUnavailable,
            Self::DecodeFailed(_) => FailureKind::DecodeFailed,
            Self::InvalidDuration(_) => FailureKind::InvalidDuration,
            Self::SessionConfigurationFailed(_) => FailureKind::SessionConfigurationFailed,
            Self::InvalidState { .. } => FailureKind::InvalidState,
            Self::AssetMissing { .. } => FailureKind::AssetMissing,
            Self::Engine(_) | Self::CoordinatorClosed | Self::Core(_) => FailureKind::Internal,
        }
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
