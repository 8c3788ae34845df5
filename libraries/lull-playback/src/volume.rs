//! Ambient ducking
//!
//! The ambient loop sits under narration. Its volume is a pure function of
//! whether narration is audibly playing: ducked while it plays, baseline
//! otherwise.

use crate::types::CoordinatorConfig;

/// Ducking policy for the ambient loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ducking {
    /// Volume while narration is not playing
    baseline: f32,

    /// Volume while narration is playing
    ducked: f32,
}

impl Ducking {
    /// Create a ducking policy
    ///
    /// # Arguments
    /// * `baseline` - Volume without narration (clamped to 0.0 - 1.0)
    /// * `ducked` - Volume under narration (clamped to 0.0 - 1.0)
    pub fn new(baseline: f32, ducked: f32) -> Self {
        Self {
            baseline: clamp_volume(baseline),
            ducked: clamp_volume(ducked),
        }
    }

    pub fn from_config(config: &CoordinatorConfig) -> Self {
        Self::new(config.ambient_baseline_volume, config.ambient_ducked_volume)
    }

    /// Ambient volume for the given narrated playing state
    pub fn volume_for(&self, narrated_playing: bool) -> f32 {
        if narrated_playing {
            self.ducked
        } else {
            self.baseline
        }
    }

    pub fn baseline(&self) -> f32 {
        self.baseline
    }

    pub fn ducked(&self) -> f32 {
        self.ducked
    }
}

impl Default for Ducking {
    fn default() -> Self {
        Self::from_config(&CoordinatorConfig::default())
    }
}

/// Clamp a linear volume to 0.0 - 1.0 (NaN becomes silence)
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}
