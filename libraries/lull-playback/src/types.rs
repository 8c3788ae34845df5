//! Core types for playback coordination

use lull_core::{AmbientSelection, AudioSource, PlaybackState};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// Lifecycle phase of the narrated stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackPhase {
    /// No narrated source attached
    #[default]
    Idle,

    /// Source attached, waiting for readiness
    Loading,

    /// Source ready, playback not yet started
    Ready,

    /// Currently playing
    Playing,

    /// Paused mid-narration
    Paused,

    /// Source failed to load; caller decides what to do next
    Failed,
}

impl PlaybackPhase {
    /// Whether transport controls (pause/resume/rate) apply
    pub fn is_active(self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }

    /// Whether the duration is known and seeking is possible
    pub fn is_seekable(self) -> bool {
        matches!(self, Self::Ready | Self::Playing | Self::Paused)
    }
}

impl std::fmt::Display for PlaybackPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Identifier of one narrated attach/detach cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Request to start narrated playback
#[derive(Debug, Clone, PartialEq)]
pub struct NarratedRequest {
    pub source: AudioSource,
    pub title: String,
    pub voice_label: String,
}

impl NarratedRequest {
    pub fn new(
        source: AudioSource,
        title: impl Into<String>,
        voice_label: impl Into<String>,
    ) -> Self {
        Self {
            source,
            title: title.into(),
            voice_label: voice_label.into(),
        }
    }
}

/// Armed sleep timer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SleepTimerState {
    /// Requested delay in seconds
    pub duration_seconds: f64,

    /// When the timer was armed
    pub scheduled_at: Instant,
}

impl SleepTimerState {
    /// Seconds left before the timer fires
    pub fn remaining_seconds(&self) -> f64 {
        let elapsed = self.scheduled_at.elapsed().as_secs_f64();
        (self.duration_seconds - elapsed).max(0.0)
    }

    /// Instant at which the timer fires
    pub fn deadline(&self) -> Instant {
        self.scheduled_at + Duration::from_secs_f64(self.duration_seconds)
    }
}

/// Everything observers need to render narrated playback
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaybackSnapshot {
    pub phase: PlaybackPhase,
    pub state: PlaybackState,
    /// Attached narrated session, if any
    pub session: Option<SessionId>,
    pub title: Option<String>,
    pub voice_label: Option<String>,
    pub sleep_timer: Option<SleepTimerState>,
}

/// Elapsed jump (seconds) that forces a republish to OS surfaces
pub const MATERIAL_ELAPSED_JUMP: f64 = 1.0;

impl PlaybackSnapshot {
    /// Whether `other` differs enough from `self` to be worth pushing to an
    /// OS surface
    ///
    /// Any change of phase, play state, duration, rate, title or session is
    /// material; elapsed time only once it moved by `MATERIAL_ELAPSED_JUMP`.
    pub fn differs_materially(&self, other: &PlaybackSnapshot) -> bool {
        self.phase != other.phase
            || self.session != other.session
            || self.title != other.title
            || self.state.is_playing != other.state.is_playing
            || self.state.duration != other.state.duration
            || self.state.rate != other.state.rate
            || (self.state.current_time - other.state.current_time).abs() >= MATERIAL_ELAPSED_JUMP
    }

    /// Subtitle shown on OS surfaces
    pub fn subtitle(&self) -> String {
        match &self.voice_label {
            Some(voice) if !voice.is_empty() => format!("Narrated by {}", voice),
            _ => String::from("Lull"),
        }
    }
}

/// Published ambient loop status
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmbientStatus {
    pub selection: AmbientSelection,
    pub volume: f32,
}

/// Platform audio interruption (phone call, alarm, another app taking audio)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioInterruption {
    /// Another audio client took over the output
    Began,

    /// The interruption is over
    Ended {
        /// Platform hint that playback may resume
        should_resume: bool,
    },
}

/// Configuration for the playback coordinator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Interval between narrated time notifications (default: 100ms)
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Ambient volume while narration is not playing (default: 0.3)
    #[serde(default = "default_ambient_baseline_volume")]
    pub ambient_baseline_volume: f32,

    /// Ambient volume while narration is playing (default: 0.2)
    #[serde(default = "default_ambient_ducked_volume")]
    pub ambient_ducked_volume: f32,

    /// Default skip interval for transport commands (default: 15s)
    #[serde(default = "default_skip_interval_secs")]
    pub skip_interval_secs: f64,
}

impl CoordinatorConfig {
    /// Time notification interval
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

fn default_tick_interval_ms() -> u64 {
    100
}

fn default_ambient_baseline_volume() -> f32 {
    0.3
}

fn default_ambient_ducked_volume() -> f32 {
    0.2
}

fn default_skip_interval_secs() -> f64 {
    15.0
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            ambient_baseline_volume: default_ambient_baseline_volume(),
            ambient_ducked_volume: default_ambient_ducked_volume(),
            skip_interval_secs: default_skip_interval_secs(),
        }
    }
}
