//! Narrated playback state shared with every observer
use serde::{Deserialize, Serialize};

/// Slowest supported playback rate
pub const MIN_RATE: f64 = 0.5;

/// Fastest supported playback rate
pub const MAX_RATE: f64 = 4.0;

/// Rate used when nothing valid has been persisted
pub const DEFAULT_RATE: f64 = 1.0;

/// Clamp a requested playback rate into `[MIN_RATE, MAX_RATE]`
///
/// NaN is not a rate anyone asked for, so it maps to `DEFAULT_RATE`.
#[must_use]
pub fn clamp_rate(rate: f64) -> f64 {
    if rate.is_nan() {
        DEFAULT_RATE
    } else {
        rate.clamp(MIN_RATE, MAX_RATE)
    }
}

/// State of the narrated stream
///
/// Invariants maintained by the coordinator:
/// - `0 <= current_time <= duration` whenever `duration` is known
/// - `MIN_RATE <= rate <= MAX_RATE`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    /// Whether narrated audio is audibly playing
    pub is_playing: bool,

    /// Current position in seconds
    pub current_time: f64,

    /// Total duration in seconds (0 until the source is ready)
    pub duration: f64,

    /// Playback rate multiplier
    pub rate: f64,
}

impl PlaybackState {
    /// Fresh state for a newly attached source
    #[must_use]
    pub fn with_rate(rate: f64) -> Self {
        Self {
            is_playing: false,
            current_time: 0.0,
            duration: 0.0,
            rate: clamp_rate(rate),
        }
    }

    /// Whether the duration is usable for clamping and display
    #[must_use]
    pub fn has_known_duration(&self) -> bool {
        self.duration.is_finite() && self.duration > 0.0
    }

    /// Clamp a position into `[0, duration]`
    ///
    /// NaN maps to 0. Without a known duration only the lower bound applies.
    #[must_use]
    pub fn clamp_time(&self, time: f64) -> f64 {
        if time.is_nan() {
            return 0.0;
        }
        if self.has_known_duration() {
            time.clamp(0.0, self.duration)
        } else {
            time.max(0.0)
        }
    }

    /// Fraction of the narration already heard, in `[0, 1]`
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.has_known_duration() {
            (self.current_time / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::with_rate(DEFAULT_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_is_clamped_into_bounds() {
        assert_eq!(clamp_rate(10.0), 4.0);
        assert_eq!(clamp_rate(0.1), 0.5);
        assert_eq!(clamp_rate(1.25), 1.25);
        assert_eq!(clamp_rate(f64::INFINITY), 4.0);
        assert_eq!(clamp_rate(f64::NEG_INFINITY), 0.5);
        assert_eq!(clamp_rate(f64::NAN), DEFAULT_RATE);
    }

    #[test]
    fn clamp_time_respects_duration() {
        let state = PlaybackState {
            duration: 120.0,
            ..PlaybackState::default()
        };

        assert_eq!(state.clamp_time(170.0), 120.0);
        assert_eq!(state.clamp_time(-3.0), 0.0);
        assert_eq!(state.clamp_time(42.5), 42.5);
        assert_eq!(state.clamp_time(f64::NAN), 0.0);
    }

    #[test]
    fn clamp_time_without_duration_only_floors() {
        let state = PlaybackState::default();
        assert!(!state.has_known_duration());
        assert_eq!(state.clamp_time(-1.0), 0.0);
        assert_eq!(state.clamp_time(30.0), 30.0);
    }

    #[test]
    fn progress_is_bounded() {
        let state = PlaybackState {
            current_time: 30.0,
            duration: 120.0,
            ..PlaybackState::default()
        };
        assert!((state.progress() - 0.25).abs() < 1e-9);
        assert_eq!(PlaybackState::default().progress(), 0.0);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let json = serde_json::to_value(PlaybackState::default()).unwrap();
        assert_eq!(json["isPlaying"], false);
        assert_eq!(json["currentTime"], 0.0);
        assert_eq!(json["rate"], 1.0);
    }
}
