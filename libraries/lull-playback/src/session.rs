//! Audio session gateway
//!
//! Keeps the platform audio session in the output mode the active streams
//! need. Reconfigures only when the mode changes. Failures never stop
//! playback: they are logged and reported so the caller can degrade.

use lull_core::OutputMode;
use std::sync::Arc;

use crate::error::{PlaybackError, Result};
use crate::platform::AudioSessionApi;

/// Owner of the platform audio session
pub struct AudioSessionGateway {
    api: Arc<dyn AudioSessionApi>,
    mode: Option<OutputMode>,
    active: bool,
}

impl AudioSessionGateway {
    pub fn new(api: Arc<dyn AudioSessionApi>) -> Self {
        Self {
            api,
            mode: None,
            active: false,
        }
    }

    /// Configure `mode` (if it changed) and activate the session
    ///
    /// # Returns
    /// * `Ok(())` - Session is active in `mode`
    /// * `Err(SessionConfigurationFailed)` - Platform refused; output will be silent
    pub fn prepare(&mut self, mode: OutputMode) -> Result<()> {
        if self.mode != Some(mode) {
            if let Err(e) = self.api.configure(mode) {
                self.mode = None;
                tracing::warn!(%mode, "Audio session configuration failed: {}", e);
                return Err(PlaybackError::SessionConfigurationFailed(e.to_string()));
            }
            tracing::debug!(%mode, "Audio session configured");
            self.mode = Some(mode);
        }

        if !self.active {
            if let Err(e) = self.api.activate() {
                tracing::warn!(%mode, "Audio session activation failed: {}", e);
                return Err(PlaybackError::SessionConfigurationFailed(e.to_string()));
            }
            self.active = true;
        }

        Ok(())
    }

    /// Release the session once nothing is playing
    pub fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        if let Err(e) = self.api.deactivate() {
            tracing::warn!("Audio session deactivation failed: {}", e);
        }
        self.active = false;
    }

    pub fn mode(&self) -> Option<OutputMode> {
        self.mode
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}
