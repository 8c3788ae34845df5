//! Ambient loop player
//!
//! Owns the single looping soundscape. End of stream is reported by the
//! engine through a callback tagged with the generation of the `start` that
//! installed it; the coordinator hands it back via `handle_end`, which
//! restarts from zero unless the loop was stopped or replaced in between.

use lull_core::AmbientSelection;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{PlaybackError, Result};
use crate::events::{Notification, NotificationSender};
use crate::registry::AmbientRegistry;
use crate::source::LoopEngine;
use crate::types::AmbientStatus;
use crate::volume::clamp_volume;

pub(crate) struct AmbientLoopPlayer {
    engine: Arc<dyn LoopEngine>,
    registry: AmbientRegistry,
    notifications: NotificationSender,
    selection: AmbientSelection,
    volume: f32,
    generation: u64,
}

impl AmbientLoopPlayer {
    pub(crate) fn new(
        engine: Arc<dyn LoopEngine>,
        registry: AmbientRegistry,
        notifications: NotificationSender,
        volume: f32,
    ) -> Self {
        Self {
            engine,
            registry,
            notifications,
            selection: AmbientSelection::None,
            volume: clamp_volume(volume),
            generation: 0,
        }
    }

    /// Start looping `selection` at `volume`
    ///
    /// Starting `None` stops the loop. Starting the selection that is already
    /// looping only adjusts the volume.
    pub(crate) fn start(&mut self, selection: AmbientSelection, volume: f32) -> Result<()> {
        if selection.is_none() {
            self.stop();
            return Ok(());
        }
        if selection == self.selection {
            self.set_volume(volume);
            return Ok(());
        }

        let asset = match self.registry.asset(selection) {
            Some(asset) => asset.to_path_buf(),
            None => {
                let path = AmbientRegistry::file_name(selection)
                    .map(|name| self.registry.root().join(name))
                    .unwrap_or_else(|| PathBuf::from(selection.as_str()));
                return Err(PlaybackError::AssetMissing { selection, path });
            }
        };

        self.stop();
        self.generation += 1;
        self.volume = clamp_volume(volume);

        let generation = self.generation;
        let tx = self.notifications.clone();
        let on_end = Box::new(move || {
            let _ = tx.send(Notification::AmbientEnded { generation });
        });

        self.engine.start(&asset, self.volume, on_end)?;
        self.selection = selection;

        tracing::info!(selection = ?selection, volume = self.volume, "Ambient loop started");
        Ok(())
    }

    /// Stop the loop; a no-op when nothing is playing
    pub(crate) fn stop(&mut self) {
        if self.selection.is_none() {
            return;
        }
        self.generation += 1;
        self.engine.stop();
        tracing::info!(selection = ?self.selection, "Ambient loop stopped");
        self.selection = AmbientSelection::None;
    }

    /// Change the loop volume
    ///
    /// Without an active selection the value is remembered for the next start.
    pub(crate) fn set_volume(&mut self, volume: f32) {
        let volume = clamp_volume(volume);
        if (self.volume - volume).abs() < f32::EPSILON {
            return;
        }
        self.volume = volume;
        if !self.selection.is_none() {
            self.engine.set_volume(volume);
            tracing::debug!(volume, "Ambient volume changed");
        }
    }

    /// Restart the loop after the engine reported end of stream
    ///
    /// Returns `false` when the report belongs to a stopped or replaced loop.
    pub(crate) fn handle_end(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.selection.is_none() {
            tracing::trace!(generation, "Ignoring end of stale ambient loop");
            return false;
        }
        if let Err(e) = self.engine.restart() {
            tracing::warn!(selection = ?self.selection, "Failed to restart ambient loop: {}", e);
        }
        true
    }

    pub(crate) fn selection(&self) -> AmbientSelection {
        self.selection
    }

    pub(crate) fn is_active(&self) -> bool {
        !self.selection.is_none()
    }

    pub(crate) fn status(&self) -> AmbientStatus {
        AmbientStatus {
            selection: self.selection,
            volume: self.volume,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{write_ambient_assets, FakeLoopEngine};
    use tokio::sync::mpsc;

    fn player(
        engine: Arc<FakeLoopEngine>,
    ) -> (
        AmbientLoopPlayer,
        mpsc::UnboundedReceiver<Notification>,
        tempfile::TempDir,
    ) {
        let dir = tempfile::tempdir().unwrap();
        write_ambient_assets(dir.path()).unwrap();
        let registry = AmbientRegistry::load(dir.path()).unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        (AmbientLoopPlayer::new(engine, registry, tx, 0.3), rx, dir)
    }

    fn ended_generation(rx: &mut mpsc::UnboundedReceiver<Notification>) -> u64 {
        match rx.try_recv() {
            Ok(Notification::AmbientEnded { generation }) => generation,
            other => panic!("expected ambient end, got {other:?}"),
        }
    }

    #[test]
    fn start_and_switch_selection() {
        let engine = Arc::new(FakeLoopEngine::new());
        let (mut player, _rx, _dir) = player(engine.clone());

        player.start(AmbientSelection::Rain, 0.3).unwrap();
        player.start(AmbientSelection::Ocean, 0.2).unwrap();

        let starts = engine.starts();
        assert_eq!(starts.len(), 2);
        assert!(starts[0].0.ends_with("rain.m4a"));
        assert!(starts[1].0.ends_with("ocean_waves.m4a"));
        assert_eq!(starts[1].1, 0.2);
        assert_eq!(engine.stops(), 1);
        assert_eq!(player.status().selection, AmbientSelection::Ocean);
    }

    #[test]
    fn end_of_stream_restarts_current_loop() {
        let engine = Arc::new(FakeLoopEngine::new());
        let (mut player, mut rx, _dir) = player(engine.clone());

        player.start(AmbientSelection::Nature, 0.3).unwrap();
        engine.trigger_end();
        let generation = ended_generation(&mut rx);

        assert!(player.handle_end(generation));
        assert_eq!(engine.restarts(), 1);
        assert_eq!(player.selection(), AmbientSelection::Nature);
    }

    #[test]
    fn end_after_stop_or_replace_is_ignored() {
        let engine = Arc::new(FakeLoopEngine::new());
        let (mut player, mut rx, _dir) = player(engine.clone());

        player.start(AmbientSelection::Rain, 0.3).unwrap();
        engine.trigger_end();
        let stale = ended_generation(&mut rx);

        player.start(AmbientSelection::Night, 0.3).unwrap();
        assert!(!player.handle_end(stale));

        engine.trigger_end();
        let current = ended_generation(&mut rx);
        player.stop();
        assert!(!player.handle_end(current));
        assert_eq!(engine.restarts(), 0);
    }

    #[test]
    fn volume_is_remembered_without_selection() {
        let engine = Arc::new(FakeLoopEngine::new());
        let (mut player, _rx, _dir) = player(engine.clone());

        player.set_volume(0.2);
        assert!(engine.volumes().is_empty());
        assert_eq!(player.status().volume, 0.2);

        player.start(AmbientSelection::Fireplace, 0.2).unwrap();
        player.set_volume(0.2);
        player.set_volume(0.3);
        assert_eq!(engine.volumes(), vec![0.3]);
    }

    #[test]
    fn none_stops_the_loop() {
        let engine = Arc::new(FakeLoopEngine::new());
        let (mut player, _rx, _dir) = player(engine.clone());

        player.start(AmbientSelection::WhiteNoise, 0.3).unwrap();
        player.start(AmbientSelection::None, 0.3).unwrap();
        assert!(!player.is_active());
        assert_eq!(engine.stops(), 1);

        player.stop();
        assert_eq!(engine.stops(), 1);
    }
}
