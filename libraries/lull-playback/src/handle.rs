//! Coordinator handle
//!
//! Cheap, cloneable entry point to the coordination task. Every operation is
//! a message; the reply arrives once the coordinator has fully applied it.

use lull_core::AmbientSelection;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

use crate::coordinator::{Command, CommandSender};
use crate::error::{PlaybackError, Result};
use crate::events::PlaybackEvent;
use crate::platform::{CommandStatus, TransportCommand};
use crate::types::{
    AmbientStatus, AudioInterruption, NarratedRequest, PlaybackPhase, PlaybackSnapshot,
    SessionId, SleepTimerState,
};

/// Handle to a running playback coordinator
///
/// All methods fail with `CoordinatorClosed` once the coordinator stopped.
#[derive(Clone)]
pub struct CoordinatorHandle {
    commands: CommandSender,
    state: watch::Receiver<PlaybackSnapshot>,
    ambient: watch::Receiver<AmbientStatus>,
    events: broadcast::Sender<PlaybackEvent>,
}

impl CoordinatorHandle {
    pub(crate) fn new(
        commands: CommandSender,
        state: watch::Receiver<PlaybackSnapshot>,
        ambient: watch::Receiver<AmbientStatus>,
        events: broadcast::Sender<PlaybackEvent>,
    ) -> Self {
        Self {
            commands,
            state,
            ambient,
            events,
        }
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(command(tx))
            .map_err(|_| PlaybackError::CoordinatorClosed)?;
        rx.await.map_err(|_| PlaybackError::CoordinatorClosed)
    }

    /// Start narrated playback, replacing any current narration
    ///
    /// Returns as soon as the source is attached; readiness and playback
    /// follow asynchronously and show up in [`subscribe_state`](Self::subscribe_state).
    ///
    /// # Returns
    /// * `Ok(session)` - Source attached and loading
    /// * `Err(SourceUnavailable)` - Local file missing; current narration untouched
    pub async fn play_narrated(&self, request: NarratedRequest) -> Result<SessionId> {
        self.request(|reply| Command::PlayNarrated { request, reply })
            .await?
    }

    /// Pause narration (no-op when already paused)
    pub async fn pause(&self) -> Result<()> {
        self.request(|reply| Command::Pause { reply }).await?
    }

    /// Resume narration (no-op when already playing)
    pub async fn resume(&self) -> Result<()> {
        self.request(|reply| Command::Resume { reply }).await?
    }

    /// Pause if playing, resume if paused; returns whether narration now plays
    pub async fn toggle_play_pause(&self) -> Result<bool> {
        self.request(|reply| Command::TogglePlayPause { reply })
            .await?
    }

    /// Seek to `time` seconds, clamped to the narration; returns the applied time
    pub async fn seek(&self, time: f64) -> Result<f64> {
        self.request(|reply| Command::Seek { time, reply }).await?
    }

    /// Skip ahead by `interval` seconds (configured default when `None`)
    pub async fn skip_forward(&self, interval: Option<f64>) -> Result<f64> {
        self.request(|reply| Command::Skip {
            interval,
            forward: true,
            reply,
        })
        .await?
    }

    /// Skip back by `interval` seconds (configured default when `None`)
    pub async fn skip_backward(&self, interval: Option<f64>) -> Result<f64> {
        self.request(|reply| Command::Skip {
            interval,
            forward: false,
            reply,
        })
        .await?
    }

    /// Clamp, apply and persist the playback rate; returns the stored value
    pub async fn set_rate(&self, rate: f64) -> Result<f64> {
        self.request(|reply| Command::SetRate { rate, reply }).await
    }

    /// Switch the ambient loop (`None` stops it)
    pub async fn play_ambient(&self, selection: AmbientSelection) -> Result<()> {
        self.request(|reply| Command::PlayAmbient { selection, reply })
            .await?
    }

    pub async fn stop_ambient(&self) -> Result<()> {
        self.request(|reply| Command::StopAmbient { reply }).await
    }

    /// Pause narration after `seconds` (clamped to 0 - 24h), replacing any pending timer
    pub async fn set_sleep_timer(&self, seconds: f64) -> Result<SleepTimerState> {
        self.request(|reply| Command::SetSleepTimer { seconds, reply })
            .await
    }

    pub async fn cancel_sleep_timer(&self) -> Result<()> {
        self.request(|reply| Command::CancelSleepTimer { reply })
            .await
    }

    /// Stop narration but keep the ambient loop running at baseline volume
    pub async fn stop_story_audio_only(&self) -> Result<()> {
        self.request(|reply| Command::StopStoryAudioOnly { reply })
            .await
    }

    /// Forward a platform audio interruption
    pub async fn handle_interruption(&self, event: AudioInterruption) -> Result<()> {
        self.request(|reply| Command::HandleInterruption { event, reply })
            .await
    }

    /// Apply an external transport command and wait for its outcome
    pub async fn transport(&self, command: TransportCommand) -> Result<CommandStatus> {
        self.request(|reply| Command::Transport {
            command,
            reply: Some(reply),
        })
        .await
    }

    /// Enqueue a transport command without waiting
    ///
    /// Validates against the latest published snapshot only.
    pub fn submit(&self, command: TransportCommand) -> CommandStatus {
        submit_transport(&self.commands, &self.state, command)
    }

    /// Stop everything and end the coordination task
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| Command::Shutdown { reply }).await
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.state.borrow().clone()
    }

    /// Latest published ambient status
    pub fn ambient_status(&self) -> AmbientStatus {
        *self.ambient.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.state.clone()
    }

    pub fn subscribe_ambient(&self) -> watch::Receiver<AmbientStatus> {
        self.ambient.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    /// Whether the coordination task is still accepting commands
    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    pub(crate) fn downgrade(&self) -> mpsc::WeakUnboundedSender<Command> {
        self.commands.downgrade()
    }
}

/// Validate `command` against `state` and enqueue it without a reply
pub(crate) fn submit_transport(
    commands: &CommandSender,
    state: &watch::Receiver<PlaybackSnapshot>,
    command: TransportCommand,
) -> CommandStatus {
    let phase = {
        let snapshot = state.borrow();
        if snapshot.session.is_none() {
            return CommandStatus::NoActiveSession;
        }
        snapshot.phase
    };
    if !accepts(phase, command) {
        tracing::debug!(?command, %phase, "Transport command rejected before enqueue");
        return CommandStatus::Failed;
    }
    match commands.send(Command::Transport {
        command,
        reply: None,
    }) {
        Ok(()) => CommandStatus::Success,
        Err(_) => CommandStatus::Failed,
    }
}

/// Whether the coordinator would act on `command` in `phase`
fn accepts(phase: PlaybackPhase, command: TransportCommand) -> bool {
    match command {
        TransportCommand::Play | TransportCommand::Pause | TransportCommand::TogglePlayPause => {
            phase.is_active()
        }
        TransportCommand::Seek(_)
        | TransportCommand::SkipForward(_)
        | TransportCommand::SkipBackward(_) => phase.is_seekable(),
        TransportCommand::ChangeRate(_) => true,
    }
}
