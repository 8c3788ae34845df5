//! Playback coordinator
//!
//! Single owner of both players, the sleep timer and the published state.
//! Everything runs on one task that drains two queues:
//! - commands from [`CoordinatorHandle`]s (with oneshot replies)
//! - notifications from the players, the loop engine callback and the timer
//!
//! Commands are applied one at a time, so no operation can observe another
//! half-applied. State leaves the task only through the watch and broadcast
//! channels.

use lull_core::{
    AmbientSelection, LullError, MemoryStore, OutputMode, PlaybackState, PreferenceStore,
};
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::ambient::AmbientLoopPlayer;
use crate::error::{PlaybackError, Result};
use crate::events::{
    NarratedEvent, Notification, NotificationReceiver, NotificationSender, PlaybackEvent,
};
use crate::handle::CoordinatorHandle;
use crate::live_status::LiveStatusAdapter;
use crate::narrated::NarratedPlayer;
use crate::platform::{
    AudioSessionApi, CommandStatus, LiveActivitySurface, NowPlayingSurface, TransportCommand,
};
use crate::registry::AmbientRegistry;
use crate::session::AudioSessionGateway;
use crate::sleep_timer::SleepTimer;
use crate::source::{LoopEngine, NarratedEngine};
use crate::speed::SpeedPreference;
use crate::transport::SystemTransportAdapter;
use crate::types::{
    AmbientStatus, AudioInterruption, CoordinatorConfig, NarratedRequest, PlaybackPhase,
    PlaybackSnapshot, SessionId, SleepTimerState,
};
use crate::volume::Ducking;

/// Capacity of the one-shot event channel
const EVENT_CAPACITY: usize = 64;

type Reply<T> = oneshot::Sender<Result<T>>;

/// Requests accepted by the coordination task
pub(crate) enum Command {
    PlayNarrated {
        request: NarratedRequest,
        reply: Reply<SessionId>,
    },
    Pause {
        reply: Reply<()>,
    },
    Resume {
        reply: Reply<()>,
    },
    TogglePlayPause {
        reply: Reply<bool>,
    },
    Seek {
        time: f64,
        reply: Reply<f64>,
    },
    Skip {
        interval: Option<f64>,
        forward: bool,
        reply: Reply<f64>,
    },
    SetRate {
        rate: f64,
        reply: oneshot::Sender<f64>,
    },
    PlayAmbient {
        selection: AmbientSelection,
        reply: Reply<()>,
    },
    StopAmbient {
        reply: oneshot::Sender<()>,
    },
    SetSleepTimer {
        seconds: f64,
        reply: oneshot::Sender<SleepTimerState>,
    },
    CancelSleepTimer {
        reply: oneshot::Sender<()>,
    },
    StopStoryAudioOnly {
        reply: oneshot::Sender<()>,
    },
    HandleInterruption {
        event: AudioInterruption,
        reply: oneshot::Sender<()>,
    },
    /// External transport command; `reply` is `None` when fired and forgotten
    Transport {
        command: TransportCommand,
        reply: Option<oneshot::Sender<CommandStatus>>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

pub(crate) type CommandSender = mpsc::UnboundedSender<Command>;

/// Assembles a coordinator from its platform collaborators
///
/// # Example
///
/// ```rust,no_run
/// # async fn run() -> lull_playback::Result<()> {
/// use lull_playback::testing::{FakeLoopEngine, FakeNarratedEngine, FakeSession};
/// use lull_playback::{AmbientRegistry, CoordinatorBuilder};
/// use std::sync::Arc;
///
/// let runtime = CoordinatorBuilder::new()
///     .with_session_api(Arc::new(FakeSession::new()))
///     .with_narrated_engine(Arc::new(FakeNarratedEngine::new()))
///     .with_loop_engine(Arc::new(FakeLoopEngine::new()))
///     .with_registry(AmbientRegistry::load("assets")?)
///     .spawn()?;
///
/// let handle = runtime.handle();
/// handle.set_rate(1.25).await?;
/// runtime.shutdown().await;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct CoordinatorBuilder {
    config: CoordinatorConfig,
    session_api: Option<Arc<dyn AudioSessionApi>>,
    narrated_engine: Option<Arc<dyn NarratedEngine>>,
    loop_engine: Option<Arc<dyn LoopEngine>>,
    registry: Option<AmbientRegistry>,
    preferences: Option<Arc<dyn PreferenceStore>>,
    now_playing: Option<Arc<dyn NowPlayingSurface>>,
    live_activity: Option<Arc<dyn LiveActivitySurface>>,
}

impl CoordinatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_session_api(mut self, api: Arc<dyn AudioSessionApi>) -> Self {
        self.session_api = Some(api);
        self
    }

    pub fn with_narrated_engine(mut self, engine: Arc<dyn NarratedEngine>) -> Self {
        self.narrated_engine = Some(engine);
        self
    }

    pub fn with_loop_engine(mut self, engine: Arc<dyn LoopEngine>) -> Self {
        self.loop_engine = Some(engine);
        self
    }

    pub fn with_registry(mut self, registry: AmbientRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Preference store for the playback rate (in-memory when omitted)
    pub fn with_preferences(mut self, store: Arc<dyn PreferenceStore>) -> Self {
        self.preferences = Some(store);
        self
    }

    /// Now-playing surface; enables the transport adapter
    pub fn with_now_playing(mut self, surface: Arc<dyn NowPlayingSurface>) -> Self {
        self.now_playing = Some(surface);
        self
    }

    /// Live activity surface; enables the live status adapter
    pub fn with_live_activity(mut self, surface: Arc<dyn LiveActivitySurface>) -> Self {
        self.live_activity = Some(surface);
        self
    }

    /// Start the coordination task and the configured adapters
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Returns
    /// * `Ok(runtime)` - Coordinator is running
    /// * `Err(Core(InvalidInput))` - A required collaborator is missing
    pub fn spawn(self) -> Result<PlaybackRuntime> {
        let session_api = self.session_api.ok_or_else(|| missing("audio session api"))?;
        let narrated_engine = self.narrated_engine.ok_or_else(|| missing("narrated engine"))?;
        let loop_engine = self.loop_engine.ok_or_else(|| missing("loop engine"))?;
        let registry = self.registry.ok_or_else(|| missing("ambient registry"))?;
        let preferences = self
            .preferences
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn PreferenceStore>);

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (notification_tx, notification_rx) = mpsc::unbounded_channel();

        let speed = SpeedPreference::new(preferences);
        let rate = speed.load();
        let ducking = Ducking::from_config(&self.config);

        let initial = PlaybackSnapshot {
            state: PlaybackState::with_rate(rate),
            ..Default::default()
        };
        let (state_tx, state_rx) = watch::channel(initial.clone());
        let (ambient_tx, ambient_rx) = watch::channel(AmbientStatus {
            selection: AmbientSelection::None,
            volume: ducking.baseline(),
        });
        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);

        let coordinator = PlaybackCoordinator {
            narrated: NarratedPlayer::new(
                narrated_engine,
                notification_tx.clone(),
                self.config.tick_interval(),
            ),
            ambient: AmbientLoopPlayer::new(
                loop_engine,
                registry,
                notification_tx.clone(),
                ducking.baseline(),
            ),
            session: AudioSessionGateway::new(session_api),
            sleep_timer: SleepTimer::new(),
            config: self.config,
            ducking,
            speed,
            rate,
            snapshot: initial,
            interrupted: false,
            notifications: notification_tx,
            state_tx,
            ambient_tx,
            events_tx: events_tx.clone(),
        };

        tracing::info!(rate, "Starting playback coordinator");
        let task = tokio::spawn(coordinator.run(command_rx, notification_rx));

        let handle = CoordinatorHandle::new(command_tx, state_rx, ambient_rx, events_tx);
        let mut adapters = Vec::new();

        if let Some(surface) = self.now_playing {
            adapters.push(SystemTransportAdapter::new(surface, handle.clone()).spawn());
        }
        if let Some(surface) = self.live_activity {
            adapters.push(LiveStatusAdapter::new(surface, handle.subscribe_state()).spawn());
        }

        Ok(PlaybackRuntime {
            handle,
            task,
            adapters,
        })
    }
}

fn missing(what: &str) -> PlaybackError {
    PlaybackError::Core(LullError::invalid_input(format!(
        "coordinator requires a {}",
        what
    )))
}

/// Running coordinator and its adapter tasks
pub struct PlaybackRuntime {
    handle: CoordinatorHandle,
    task: JoinHandle<()>,
    adapters: Vec<JoinHandle<()>>,
}

impl PlaybackRuntime {
    /// Handle for issuing commands and subscribing to state
    pub fn handle(&self) -> CoordinatorHandle {
        self.handle.clone()
    }

    /// Stop playback and wait for every task to finish
    pub async fn shutdown(self) {
        if let Err(e) = self.handle.shutdown().await {
            tracing::debug!("Coordinator already stopped: {}", e);
        }
        if let Err(e) = self.task.await {
            tracing::error!("Coordinator task failed: {}", e);
        }
        for adapter in self.adapters {
            if let Err(e) = adapter.await {
                tracing::error!("Adapter task failed: {}", e);
            }
        }
    }
}

struct PlaybackCoordinator {
    config: CoordinatorConfig,
    ducking: Ducking,
    session: AudioSessionGateway,
    narrated: NarratedPlayer,
    ambient: AmbientLoopPlayer,
    sleep_timer: SleepTimer,
    speed: SpeedPreference,
    /// Current playback rate preference
    rate: f64,
    /// Working copy of the published snapshot
    snapshot: PlaybackSnapshot,
    /// Narration was paused by an audio interruption
    interrupted: bool,
    notifications: NotificationSender,
    state_tx: watch::Sender<PlaybackSnapshot>,
    ambient_tx: watch::Sender<AmbientStatus>,
    events_tx: broadcast::Sender<PlaybackEvent>,
}

impl PlaybackCoordinator {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut notifications: NotificationReceiver,
    ) {
        loop {
            tokio::select! {
                biased;

                Some(notification) = notifications.recv() => {
                    self.handle_notification(notification);
                }

                command = commands.recv() => {
                    let Some(command) = command else {
                        tracing::debug!("All coordinator handles dropped");
                        self.shutdown();
                        break;
                    };
                    if self.handle_command(command).is_break() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Playback coordinator stopped");
    }

    fn handle_command(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::PlayNarrated { request, reply } => {
                let _ = reply.send(self.play_narrated(request));
            }
            Command::Pause { reply } => {
                let _ = reply.send(self.pause());
            }
            Command::Resume { reply } => {
                let _ = reply.send(self.resume());
            }
            Command::TogglePlayPause { reply } => {
                let _ = reply.send(self.toggle_play_pause());
            }
            Command::Seek { time, reply } => {
                let _ = reply.send(self.seek("seek", time));
            }
            Command::Skip {
                interval,
                forward,
                reply,
            } => {
                let _ = reply.send(self.skip(interval, forward));
            }
            Command::SetRate { rate, reply } => {
                let _ = reply.send(self.set_rate(rate));
            }
            Command::PlayAmbient { selection, reply } => {
                let _ = reply.send(self.play_ambient(selection));
            }
            Command::StopAmbient { reply } => {
                self.stop_ambient();
                let _ = reply.send(());
            }
            Command::SetSleepTimer { seconds, reply } => {
                let _ = reply.send(self.set_sleep_timer(seconds));
            }
            Command::CancelSleepTimer { reply } => {
                self.cancel_sleep_timer();
                let _ = reply.send(());
            }
            Command::StopStoryAudioOnly { reply } => {
                self.stop_story_audio_only();
                let _ = reply.send(());
            }
            Command::HandleInterruption { event, reply } => {
                self.handle_interruption(event);
                let _ = reply.send(());
            }
            Command::Transport { command, reply } => {
                let status = self.handle_transport(command);
                if let Some(reply) = reply {
                    let _ = reply.send(status);
                }
            }
            Command::Shutdown { reply } => {
                self.shutdown();
                let _ = reply.send(());
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn handle_notification(&mut self, notification: Notification) {
        match notification {
            Notification::Narrated { session, event } => {
                if self.narrated.session() != Some(session) {
                    tracing::trace!(
                        session = %session,
                        "Dropping notification for detached session"
                    );
                    return;
                }
                match event {
                    NarratedEvent::Ready { duration } => self.on_ready(duration),
                    NarratedEvent::Failed(error) => self.fail(error),
                    NarratedEvent::Time { position } => self.on_time(position),
                    NarratedEvent::Finished => self.on_finished(),
                }
            }
            Notification::AmbientEnded { generation } => {
                if self.ambient.handle_end(generation) {
                    tracing::debug!(
                        selection = ?self.ambient.selection(),
                        "Ambient loop restarted"
                    );
                }
            }
            Notification::SleepTimerFired { generation } => {
                if self.sleep_timer.take_fired(generation) {
                    self.on_sleep_timer_fired();
                }
            }
        }
    }

    // ===== Narrated lifecycle =====

    fn play_narrated(&mut self, request: NarratedRequest) -> Result<SessionId> {
        if !request.source.is_available() {
            tracing::warn!(source = %request.source, "Narrated source unavailable");
            return Err(PlaybackError::source_unavailable(request.source.to_string()));
        }

        self.narrated.detach();
        self.prepare_session(true);

        let session = self.narrated.attach(request.source);
        self.interrupted = false;
        self.snapshot = PlaybackSnapshot {
            phase: PlaybackPhase::Loading,
            state: PlaybackState::with_rate(self.rate),
            session: Some(session),
            title: Some(request.title),
            voice_label: Some(request.voice_label),
            sleep_timer: self.sleep_timer.state(),
        };

        tracing::info!(session = %session, title = ?self.snapshot.title, "Loading narration");
        self.sync_ambient_volume();
        self.publish();
        Ok(session)
    }

    fn on_ready(&mut self, duration: f64) {
        if self.snapshot.phase != PlaybackPhase::Loading {
            return;
        }
        if !(duration.is_finite() && duration > 0.0) {
            self.fail(PlaybackError::InvalidDuration(duration));
            return;
        }

        self.snapshot.state.duration = duration;
        self.snapshot.phase = PlaybackPhase::Ready;
        self.publish();

        if let Err(e) = self.narrated.set_rate(self.rate) {
            tracing::warn!(rate = self.rate, "Failed to apply playback rate: {}", e);
        }
        if let Err(e) = self.narrated.play() {
            self.fail(e);
            return;
        }

        self.snapshot.phase = PlaybackPhase::Playing;
        self.snapshot.state.is_playing = true;
        self.narrated.start_time_updates();

        tracing::info!(session = ?self.snapshot.session, duration, "Narration playing");
        self.sync_ambient_volume();
        self.publish();
    }

    fn on_time(&mut self, position: f64) {
        if !self.snapshot.phase.is_active() {
            return;
        }
        self.snapshot.state.current_time = self.snapshot.state.clamp_time(position);
        self.publish();
    }

    fn on_finished(&mut self) {
        let session = self.snapshot.session;
        tracing::info!(session = ?session, "Narration finished");

        self.snapshot.state.current_time = self.snapshot.state.duration;
        self.snapshot.state.is_playing = false;
        self.snapshot.phase = PlaybackPhase::Paused;
        self.publish();

        self.detach_narrated();

        if let Some(session) = session {
            let _ = self.events_tx.send(PlaybackEvent::NarratedFinished { session });
        }
    }

    /// Terminal failure of the current narrated session
    fn fail(&mut self, error: PlaybackError) {
        tracing::error!(session = ?self.snapshot.session, "Narrated playback failed: {}", error);

        self.narrated.detach();
        self.interrupted = false;
        self.snapshot.phase = PlaybackPhase::Failed;
        self.snapshot.session = None;
        self.snapshot.state = PlaybackState::with_rate(self.rate);

        self.sync_ambient_volume();
        self.sync_session();
        self.publish();

        let _ = self.events_tx.send(PlaybackEvent::from_error(&error));
    }

    /// Detach narration and return to `Idle`, keeping ambient and the timer
    fn detach_narrated(&mut self) {
        self.narrated.detach();
        self.interrupted = false;
        self.snapshot = PlaybackSnapshot {
            state: PlaybackState::with_rate(self.rate),
            sleep_timer: self.sleep_timer.state(),
            ..Default::default()
        };

        self.sync_ambient_volume();
        self.sync_session();
        self.publish();
    }

    fn stop_story_audio_only(&mut self) {
        if self.narrated.session().is_none() && self.snapshot.phase == PlaybackPhase::Idle {
            return;
        }
        tracing::info!(session = ?self.snapshot.session, "Stopping narration");
        self.detach_narrated();
    }

    // ===== Transport =====

    fn pause(&mut self) -> Result<()> {
        match self.snapshot.phase {
            PlaybackPhase::Playing => {
                if let Err(e) = self.narrated.pause() {
                    tracing::warn!("Engine failed to pause: {}", e);
                }
                self.snapshot.phase = PlaybackPhase::Paused;
                self.snapshot.state.is_playing = false;
                tracing::debug!(session = ?self.snapshot.session, "Narration paused");

                self.sync_ambient_volume();
                self.publish();
                Ok(())
            }
            PlaybackPhase::Paused => Ok(()),
            phase => Err(PlaybackError::InvalidState {
                operation: "pause",
                phase,
            }),
        }
    }

    fn resume(&mut self) -> Result<()> {
        match self.snapshot.phase {
            PlaybackPhase::Paused => {
                self.prepare_session(true);
                if let Err(e) = self.narrated.play() {
                    tracing::warn!("Engine failed to resume: {}", e);
                }
                self.interrupted = false;
                self.snapshot.phase = PlaybackPhase::Playing;
                self.snapshot.state.is_playing = true;
                tracing::debug!(session = ?self.snapshot.session, "Narration resumed");

                self.sync_ambient_volume();
                self.publish();
                Ok(())
            }
            PlaybackPhase::Playing => Ok(()),
            phase => Err(PlaybackError::InvalidState {
                operation: "resume",
                phase,
            }),
        }
    }

    fn toggle_play_pause(&mut self) -> Result<bool> {
        match self.snapshot.phase {
            PlaybackPhase::Playing => self.pause().map(|()| false),
            PlaybackPhase::Paused => self.resume().map(|()| true),
            phase => Err(PlaybackError::InvalidState {
                operation: "toggle playback",
                phase,
            }),
        }
    }

    fn seek(&mut self, operation: &'static str, time: f64) -> Result<f64> {
        let phase = self.snapshot.phase;
        if !phase.is_seekable() {
            return Err(PlaybackError::InvalidState { operation, phase });
        }

        let applied = self.snapshot.state.clamp_time(time);
        self.snapshot.state.current_time = applied;
        if let Err(e) = self.narrated.seek(applied) {
            tracing::warn!(position = applied, "Engine failed to seek: {}", e);
        }

        self.publish();
        Ok(applied)
    }

    fn skip(&mut self, interval: Option<f64>, forward: bool) -> Result<f64> {
        let interval = interval.unwrap_or(self.config.skip_interval_secs);
        let interval = if interval.is_nan() { 0.0 } else { interval.max(0.0) };

        let current = self.snapshot.state.current_time;
        let target = if forward {
            current + interval
        } else {
            current - interval
        };
        self.seek("skip", target)
    }

    fn set_rate(&mut self, rate: f64) -> f64 {
        let rate = self.speed.save(rate);
        self.rate = rate;
        self.snapshot.state.rate = rate;

        if self.snapshot.phase.is_active() {
            if let Err(e) = self.narrated.set_rate(rate) {
                tracing::warn!(rate, "Failed to apply playback rate: {}", e);
            }
        }

        tracing::debug!(rate, "Playback rate changed");
        self.publish();
        rate
    }

    fn handle_transport(&mut self, command: TransportCommand) -> CommandStatus {
        if self.narrated.session().is_none() {
            return CommandStatus::NoActiveSession;
        }

        let result = match command {
            TransportCommand::Play => self.resume(),
            TransportCommand::Pause => self.pause(),
            TransportCommand::TogglePlayPause => self.toggle_play_pause().map(|_| ()),
            TransportCommand::Seek(time) => self.seek("seek", time).map(|_| ()),
            TransportCommand::SkipForward(interval) => self.skip(interval, true).map(|_| ()),
            TransportCommand::SkipBackward(interval) => self.skip(interval, false).map(|_| ()),
            TransportCommand::ChangeRate(rate) => {
                self.set_rate(rate);
                Ok(())
            }
        };

        match result {
            Ok(()) => CommandStatus::Success,
            Err(e) => {
                tracing::warn!(?command, "Transport command rejected: {}", e);
                CommandStatus::Failed
            }
        }
    }

    fn handle_interruption(&mut self, event: AudioInterruption) {
        match event {
            AudioInterruption::Began => {
                if self.snapshot.phase == PlaybackPhase::Playing && self.pause().is_ok() {
                    tracing::info!("Narration paused by audio interruption");
                    self.interrupted = true;
                }
            }
            AudioInterruption::Ended { should_resume } => {
                let resume = std::mem::take(&mut self.interrupted) && should_resume;
                if resume && self.snapshot.phase == PlaybackPhase::Paused {
                    tracing::info!("Resuming narration after audio interruption");
                    if let Err(e) = self.resume() {
                        tracing::warn!("Failed to resume after interruption: {}", e);
                    }
                }
            }
        }
    }

    // ===== Ambient =====

    fn play_ambient(&mut self, selection: AmbientSelection) -> Result<()> {
        if selection.is_none() {
            self.stop_ambient();
            return Ok(());
        }

        let volume = self.ducking.volume_for(self.snapshot.state.is_playing);
        if let Err(e) = self.ambient.start(selection, volume) {
            tracing::error!(selection = ?selection, "Failed to start ambient loop: {}", e);
            let _ = self.events_tx.send(PlaybackEvent::from_error(&e));
            self.sync_session();
            self.publish_ambient();
            return Err(e);
        }

        self.sync_session();
        self.publish_ambient();
        Ok(())
    }

    fn stop_ambient(&mut self) {
        self.ambient.stop();
        self.sync_session();
        self.publish_ambient();
    }

    /// Ambient volume is a function of narrated `is_playing` only
    fn sync_ambient_volume(&mut self) {
        let volume = self.ducking.volume_for(self.snapshot.state.is_playing);
        self.ambient.set_volume(volume);
        self.publish_ambient();
    }

    // ===== Sleep timer =====

    fn set_sleep_timer(&mut self, seconds: f64) -> SleepTimerState {
        let state = self.sleep_timer.arm(seconds, &self.notifications);
        tracing::info!(seconds = state.duration_seconds, "Sleep timer set");
        self.snapshot.sleep_timer = Some(state);
        self.publish();
        state
    }

    fn cancel_sleep_timer(&mut self) {
        self.sleep_timer.cancel();
        if self.snapshot.sleep_timer.take().is_some() {
            self.publish();
        }
    }

    fn on_sleep_timer_fired(&mut self) {
        tracing::info!("Sleep timer fired");
        self.snapshot.sleep_timer = None;

        if let Err(e) = self.pause() {
            tracing::debug!("Sleep timer found nothing to pause: {}", e);
        }

        self.publish();
        let _ = self.events_tx.send(PlaybackEvent::SleepTimerFired);
    }

    // ===== Audio session =====

    /// Bring the audio session up for the streams about to play
    fn prepare_session(&mut self, narrated_active: bool) {
        if !narrated_active && !self.ambient.is_active() {
            self.session.deactivate();
            return;
        }

        let mode = OutputMode::for_streams(self.ambient.is_active());
        if let Err(e) = self.session.prepare(mode) {
            let _ = self.events_tx.send(PlaybackEvent::SessionDegraded {
                message: e.to_string(),
            });
        }
    }

    fn sync_session(&mut self) {
        let narrated_active = self.narrated.session().is_some();
        self.prepare_session(narrated_active);
    }

    // ===== Publishing =====

    fn publish(&self) {
        let snapshot = &self.snapshot;
        self.state_tx.send_if_modified(|published| {
            if published == snapshot {
                false
            } else {
                *published = snapshot.clone();
                true
            }
        });
    }

    fn publish_ambient(&self) {
        let status = self.ambient.status();
        self.ambient_tx.send_if_modified(|published| {
            if *published == status {
                false
            } else {
                *published = status;
                true
            }
        });
    }

    fn shutdown(&mut self) {
        tracing::info!("Shutting down playback coordinator");
        self.sleep_timer.cancel();
        self.narrated.detach();
        self.ambient.stop();
        self.session.deactivate();

        self.snapshot = PlaybackSnapshot {
            state: PlaybackState::with_rate(self.rate),
            ..Default::default()
        };
        self.publish();
        self.publish_ambient();
    }
}
