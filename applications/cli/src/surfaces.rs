//! Terminal stand-ins for the OS surfaces
//!
//! Each surface logs what a device would show. The now-playing surface keeps
//! the registered handler so the shell can press "media keys".

use lull_core::{LiveActivityContent, NowPlayingMetadata, OutputMode};
use lull_playback::{
    ActivityId, AudioSessionApi, CommandStatus, LiveActivitySurface, NowPlayingSurface, Result,
    TransportCommand, TransportHandler,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Audio session that only logs transitions
#[derive(Debug, Default)]
pub struct LoggingSession;

impl AudioSessionApi for LoggingSession {
    fn configure(&self, mode: OutputMode) -> Result<()> {
        tracing::info!(?mode, "Audio session configured");
        Ok(())
    }

    fn activate(&self) -> Result<()> {
        tracing::debug!("Audio session activated");
        Ok(())
    }

    fn deactivate(&self) -> Result<()> {
        tracing::debug!("Audio session deactivated");
        Ok(())
    }
}

/// Now-playing surface printed to the log
#[derive(Default)]
pub struct LoggingNowPlaying {
    handler: Mutex<Option<TransportHandler>>,
}

impl LoggingNowPlaying {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `command` the way a media key would
    ///
    /// Returns `None` while no handler is registered.
    pub fn press(&self, command: TransportCommand) -> Option<CommandStatus> {
        let handler = lock(&self.handler).clone()?;
        Some(handler(command))
    }
}

impl NowPlayingSurface for LoggingNowPlaying {
    fn register_commands(&self, handler: TransportHandler) -> Result<()> {
        *lock(&self.handler) = Some(handler);
        tracing::debug!("Media keys registered");
        Ok(())
    }

    fn unregister_commands(&self) {
        lock(&self.handler).take();
        tracing::debug!("Media keys unregistered");
    }

    fn publish(&self, metadata: &NowPlayingMetadata) -> Result<()> {
        tracing::info!(
            title = %metadata.title,
            subtitle = %metadata.subtitle,
            elapsed = format_args!("{:.1}", metadata.elapsed),
            duration = format_args!("{:.1}", metadata.duration),
            rate = metadata.rate,
            "Now playing"
        );
        Ok(())
    }

    fn clear(&self) {
        tracing::info!("Now playing cleared");
    }
}

/// Live activity surface printed to the log
#[derive(Debug, Default)]
pub struct LoggingLiveActivity {
    next_id: AtomicU64,
}

impl LoggingLiveActivity {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LiveActivitySurface for LoggingLiveActivity {
    fn start(&self, content: &LiveActivityContent) -> Result<ActivityId> {
        let id = ActivityId(format!(
            "live-{}",
            self.next_id.fetch_add(1, Ordering::Relaxed) + 1
        ));
        tracing::info!(activity = %id, title = %content.title, "Live activity started");
        Ok(id)
    }

    fn update(&self, id: &ActivityId, content: &LiveActivityContent) -> Result<()> {
        tracing::debug!(
            activity = %id,
            playing = content.is_playing,
            elapsed = format_args!("{:.1}", content.elapsed),
            "Live activity updated"
        );
        Ok(())
    }

    fn end(&self, id: &ActivityId) {
        tracing::info!(activity = %id, "Live activity ended");
    }
}
