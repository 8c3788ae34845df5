//! Persisted playback rate
//!
//! Speed operations cannot fail: out-of-range values are clamped and storage
//! errors are logged, never surfaced.

use lull_core::{clamp_rate, PreferenceStore, DEFAULT_RATE, MAX_RATE, MIN_RATE};
use serde_json::Value;
use std::sync::Arc;

/// Preference key holding the rate
pub const PLAYBACK_RATE_KEY: &str = "playback_rate";

/// Playback rate backed by a preference store
#[derive(Clone)]
pub struct SpeedPreference {
    store: Arc<dyn PreferenceStore>,
}

impl SpeedPreference {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    /// Read the persisted rate
    ///
    /// Returns `DEFAULT_RATE` when nothing is stored, the value is not a
    /// number, or it lies outside the supported range.
    pub fn load(&self) -> f64 {
        let value = match self.store.get(PLAYBACK_RATE_KEY) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to read playback rate: {}", e);
                return DEFAULT_RATE;
            }
        };

        match value.as_ref().and_then(Value::as_f64) {
            Some(rate) if rate.is_finite() && (MIN_RATE..=MAX_RATE).contains(&rate) => rate,
            Some(rate) => {
                tracing::warn!(rate, "Stored playback rate out of range, using default");
                DEFAULT_RATE
            }
            None => DEFAULT_RATE,
        }
    }

    /// Clamp and persist `rate`, returning the stored value
    pub fn save(&self, rate: f64) -> f64 {
        let rate = clamp_rate(rate);
        if let Err(e) = self.store.set(PLAYBACK_RATE_KEY, Value::from(rate)) {
            tracing::warn!(rate, "Failed to persist playback rate: {}", e);
        }
        rate
    }
}
