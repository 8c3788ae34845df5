//! System transport adapter
//!
//! Bridges the OS now-playing surface and the coordinator:
//! - installs a synchronous command handler that validates against the latest
//!   snapshot and enqueues the command
//! - republishes now-playing metadata on every material state change and
//!   clears it when no narration is attached

use lull_core::NowPlayingMetadata;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::handle::{submit_transport, CoordinatorHandle};
use crate::platform::{CommandStatus, NowPlayingSurface, TransportCommand, TransportHandler};
use crate::types::PlaybackSnapshot;

/// Keeps the now-playing surface in sync with the coordinator
pub struct SystemTransportAdapter {
    surface: Arc<dyn NowPlayingSurface>,
    coordinator: CoordinatorHandle,
}

impl SystemTransportAdapter {
    pub fn new(surface: Arc<dyn NowPlayingSurface>, coordinator: CoordinatorHandle) -> Self {
        Self {
            surface,
            coordinator,
        }
    }

    /// Synchronous handler for the platform's remote command center
    ///
    /// Holds only a weak reference to the command queue so a registered
    /// handler never keeps a stopped coordinator alive.
    pub fn handler(&self) -> TransportHandler {
        let commands = self.coordinator.downgrade();
        let state = self.coordinator.subscribe_state();

        Arc::new(move |command: TransportCommand| {
            let Some(commands) = commands.upgrade() else {
                return CommandStatus::Failed;
            };
            let status = submit_transport(&commands, &state, command);
            tracing::debug!(?command, ?status, "Transport command received");
            status
        })
    }

    /// Apply `command` and wait for the coordinator's outcome
    pub async fn handle(&self, command: TransportCommand) -> CommandStatus {
        match self.coordinator.transport(command).await {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(?command, "Transport command failed: {}", e);
                CommandStatus::Failed
            }
        }
    }

    /// Register the command handler and start following state
    ///
    /// The task ends when the coordinator stops; it then clears the surface
    /// and unregisters the handler. It holds no command sender of its own.
    pub fn spawn(self) -> JoinHandle<()> {
        if let Err(e) = self.surface.register_commands(self.handler()) {
            tracing::warn!("Failed to register transport commands: {}", e);
        }
        let state = self.coordinator.subscribe_state();
        tokio::spawn(follow_state(self.surface, state))
    }
}

async fn follow_state(
    surface: Arc<dyn NowPlayingSurface>,
    mut state: watch::Receiver<PlaybackSnapshot>,
) {
    let mut last: Option<PlaybackSnapshot> = None;

    loop {
        let snapshot = state.borrow_and_update().clone();
        sync_metadata(surface.as_ref(), &snapshot, &mut last);

        if state.changed().await.is_err() {
            break;
        }
    }

    surface.unregister_commands();
    if last.is_some() {
        surface.clear();
    }
    tracing::debug!("Transport adapter stopped");
}

/// Publish `snapshot` if it differs materially from the last published one
fn sync_metadata(
    surface: &dyn NowPlayingSurface,
    snapshot: &PlaybackSnapshot,
    last: &mut Option<PlaybackSnapshot>,
) {
    if snapshot.session.is_none() {
        if last.take().is_some() {
            surface.clear();
        }
        return;
    }

    let changed = last
        .as_ref()
        .map_or(true, |previous| previous.differs_materially(snapshot));
    if !changed {
        return;
    }

    let metadata = NowPlayingMetadata::project(
        snapshot.title.clone().unwrap_or_default(),
        snapshot.subtitle(),
        &snapshot.state,
    );
    if let Err(e) = surface.publish(&metadata) {
        tracing::warn!("Failed to publish now-playing metadata: {}", e);
    }
    *last = Some(snapshot.clone());
}
