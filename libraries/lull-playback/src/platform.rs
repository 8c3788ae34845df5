//! Platform surfaces consumed by the coordinator and its adapters

use lull_core::{LiveActivityContent, NowPlayingMetadata, OutputMode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;

/// Platform-wide audio session
pub trait AudioSessionApi: Send + Sync {
    /// Select how our output shares the device with other audio
    fn configure(&self, mode: OutputMode) -> Result<()>;

    /// Make the session active
    fn activate(&self) -> Result<()>;

    /// Release the session so other apps can resume
    fn deactivate(&self) -> Result<()>;
}

/// External transport command (lock screen, headset buttons, media keys)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TransportCommand {
    Play,
    Pause,
    TogglePlayPause,
    /// Absolute position in seconds
    Seek(f64),
    /// Skip interval in seconds, `None` for the configured default
    SkipForward(Option<f64>),
    /// Skip interval in seconds, `None` for the configured default
    SkipBackward(Option<f64>),
    ChangeRate(f64),
}

/// Result reported back to the platform for one command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandStatus {
    Success,
    /// Nothing is attached that the command could act on
    NoActiveSession,
    Failed,
}

/// Synchronous command handler installed on the platform
pub type TransportHandler = Arc<dyn Fn(TransportCommand) -> CommandStatus + Send + Sync>;

/// System now-playing surface and its remote command center
pub trait NowPlayingSurface: Send + Sync {
    /// Route incoming transport commands to `handler`
    fn register_commands(&self, handler: TransportHandler) -> Result<()>;

    /// Stop routing transport commands
    fn unregister_commands(&self);

    /// Replace the displayed metadata
    fn publish(&self, metadata: &NowPlayingMetadata) -> Result<()>;

    /// Remove our entry from the surface
    fn clear(&self);
}

/// Identifier of a running live activity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActivityId(pub String);

impl std::fmt::Display for ActivityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// OS-level glanceable status (lock screen / dynamic island style)
pub trait LiveActivitySurface: Send + Sync {
    /// Begin a live activity
    fn start(&self, content: &LiveActivityContent) -> Result<ActivityId>;

    /// Push new content to a running activity
    fn update(&self, id: &ActivityId, content: &LiveActivityContent) -> Result<()>;

    /// Terminate a running activity
    fn end(&self, id: &ActivityId);
}
