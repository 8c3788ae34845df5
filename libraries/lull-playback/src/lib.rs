//! Lull - Playback Coordination
//!
//! Platform-agnostic coordination of the two audio streams Lull plays at once:
//! narrated content and a looping ambient soundscape.
//!
//! This crate provides:
//! - Narrated playback lifecycle (load, play/pause, seek, skip, rate)
//! - Looping ambient soundscapes from a validated asset registry
//! - Ambient ducking while narration plays (0.3 baseline, 0.2 ducked)
//! - Sleep timer that pauses narration
//! - Persisted, clamped playback rate
//! - Now-playing metadata and transport commands for the OS
//! - Live activity lifecycle tied to narrated sessions
//! - Audio session mode management and interruption handling
//!
//! # Architecture
//!
//! `lull-playback` knows nothing about a concrete platform. Audio output,
//! the audio session and OS surfaces are provided through traits
//! ([`NarratedEngine`], [`LoopEngine`], [`AudioSessionApi`],
//! [`NowPlayingSurface`], [`LiveActivitySurface`]).
//!
//! All state lives on a single coordination task. Callers talk to it through
//! a [`CoordinatorHandle`]; state comes back through `watch` channels and
//! one-shot signals through a `broadcast` channel of [`PlaybackEvent`]s.
//!
//! # Example
//!
//! ```rust,no_run
//! use lull_core::{AmbientSelection, AudioSource};
//! use lull_playback::testing::{FakeLoopEngine, FakeNarratedEngine, FakeSession};
//! use lull_playback::{AmbientRegistry, CoordinatorBuilder, NarratedRequest, PlaybackPhase};
//! use std::sync::Arc;
//!
//! # async fn run() -> lull_playback::Result<()> {
//! let runtime = CoordinatorBuilder::new()
//!     .with_session_api(Arc::new(FakeSession::new()))
//!     .with_narrated_engine(Arc::new(FakeNarratedEngine::new()))
//!     .with_loop_engine(Arc::new(FakeLoopEngine::new()))
//!     .with_registry(AmbientRegistry::load("assets")?)
//!     .spawn()?;
//! let handle = runtime.handle();
//!
//! handle.play_ambient(AmbientSelection::Rain).await?;
//! handle
//!     .play_narrated(NarratedRequest::new(
//!         AudioSource::remote("https://cdn.example.com/story.mp3"),
//!         "The Lighthouse",
//!         "Ava",
//!     ))
//!     .await?;
//!
//! let mut state = handle.subscribe_state();
//! state
//!     .wait_for(|s| s.phase == PlaybackPhase::Playing)
//!     .await
//!     .ok();
//!
//! handle.set_sleep_timer(600.0).await?;
//! runtime.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod ambient;
mod coordinator;
pub mod error;
pub mod events;
mod handle;
mod live_status;
mod narrated;
pub mod platform;
mod registry;
mod session;
mod sleep_timer;
pub mod source;
mod speed;
mod subscription;
pub mod testing;
mod transport;
pub mod types;
mod volume;

// Public exports
pub use coordinator::{CoordinatorBuilder, PlaybackRuntime};
pub use error::{PlaybackError, Result};
pub use events::{FailureKind, PlaybackEvent};
pub use handle::CoordinatorHandle;
pub use live_status::LiveStatusAdapter;
pub use platform::{
    ActivityId, AudioSessionApi, CommandStatus, LiveActivitySurface, NowPlayingSurface,
    TransportCommand, TransportHandler,
};
pub use registry::AmbientRegistry;
pub use session::AudioSessionGateway;
pub use sleep_timer::{clamp_sleep_seconds, MAX_SLEEP_SECONDS};
pub use source::{EndOfStream, LoopEngine, MediaInfo, NarratedEngine};
pub use speed::{SpeedPreference, PLAYBACK_RATE_KEY};
pub use transport::SystemTransportAdapter;
pub use types::{
    AmbientStatus, AudioInterruption, CoordinatorConfig, NarratedRequest, PlaybackPhase,
    PlaybackSnapshot, SessionId, SleepTimerState,
};
pub use volume::{clamp_volume, Ducking};
