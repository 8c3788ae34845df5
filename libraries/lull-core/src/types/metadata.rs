//! Projections of playback state for OS-level surfaces
use serde::{Deserialize, Serialize};

use super::PlaybackState;

/// Metadata published to the system now-playing surface
///
/// Pure projection of the narrated `PlaybackState`; never mutated on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NowPlayingMetadata {
    /// Story title
    pub title: String,
    /// Narrator line, e.g. "Narrated by Ava"
    pub subtitle: String,
    /// Elapsed seconds
    pub elapsed: f64,
    /// Total seconds
    pub duration: f64,
    /// Effective rate: the playback rate while playing, 0 while paused
    pub rate: f64,
}

impl NowPlayingMetadata {
    /// Project a playback state
    pub fn project(
        title: impl Into<String>,
        subtitle: impl Into<String>,
        state: &PlaybackState,
    ) -> Self {
        Self {
            title: title.into(),
            subtitle: subtitle.into(),
            elapsed: state.current_time,
            duration: state.duration,
            rate: if state.is_playing { state.rate } else { 0.0 },
        }
    }
}

/// Content of the glanceable live activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveActivityContent {
    /// Story title
    pub title: String,
    /// Narrator line
    pub subtitle: String,
    /// Whether narration is audibly playing
    pub is_playing: bool,
    /// Elapsed seconds
    pub elapsed: f64,
    /// Total seconds
    pub duration: f64,
}

impl LiveActivityContent {
    /// Project a playback state
    pub fn project(
        title: impl Into<String>,
        subtitle: impl Into<String>,
        state: &PlaybackState,
    ) -> Self {
        Self {
            title: title.into(),
            subtitle: subtitle.into(),
            is_playing: state.is_playing,
            elapsed: state.current_time,
            duration: state.duration,
        }
    }
}
