//! Platform-agnostic audio engine traits
//!
//! Abstracts the platform players for the narrated and ambient streams.
//! Decoding and output live behind these traits; the coordinator only sees
//! readiness, positions and end-of-stream.

use async_trait::async_trait;
use lull_core::AudioSource;
use std::path::Path;

use crate::error::Result;

/// What the platform learned about a narrated source while loading it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaInfo {
    /// Duration in seconds as reported by the platform (may be 0 or NaN)
    pub duration: f64,
}

/// Platform player for narrated content
///
/// Implementations are shared between the coordinator and the notification
/// tasks of `NarratedPlayer`, so every method takes `&self`. Calls must not
/// block: `seek` and `set_rate` may complete asynchronously on the platform.
#[async_trait]
pub trait NarratedEngine: Send + Sync {
    /// Prepare `source` for playback and report its duration
    ///
    /// # Returns
    /// * `Ok(info)` - Source is ready (duration not yet validated)
    /// * `Err(DecodeFailed)` - Platform reported a failure status
    async fn load(&self, source: &AudioSource) -> Result<MediaInfo>;

    /// Start or resume output
    fn play(&self) -> Result<()>;

    /// Pause output, keeping position
    fn pause(&self) -> Result<()>;

    /// Move to `position` seconds
    fn seek(&self, position: f64) -> Result<()>;

    /// Change playback rate
    fn set_rate(&self, rate: f64) -> Result<()>;

    /// Current position in seconds
    fn position(&self) -> f64;

    /// Whether the loaded source has played to the end
    fn is_finished(&self) -> bool;

    /// Stop output and release the loaded source
    fn stop(&self);
}

/// Callback invoked by a `LoopEngine` when its stream reaches the end
///
/// May be called from any thread.
pub type EndOfStream = Box<dyn Fn() + Send + Sync>;

/// Platform player for the ambient loop
pub trait LoopEngine: Send + Sync {
    /// Start playing `asset` from the beginning at `volume`
    ///
    /// `on_end` is invoked every time the stream reaches its end; the owner
    /// decides whether to restart.
    fn start(&self, asset: &Path, volume: f32, on_end: EndOfStream) -> Result<()>;

    /// Seek to zero and resume the current asset
    fn restart(&self) -> Result<()>;

    /// Change output volume (0.0 - 1.0)
    fn set_volume(&self, volume: f32);

    /// Stop output and drop the current asset
    fn stop(&self);
}
