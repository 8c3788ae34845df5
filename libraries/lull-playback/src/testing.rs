//! In-memory platform doubles
//!
//! Deterministic stand-ins for the platform seams, used by the unit and
//! integration tests and handy for headless tools. Every double records the
//! calls it receives so tests can assert on them.

use async_trait::async_trait;
use lull_core::{AudioSource, LiveActivityContent, NowPlayingMetadata, OutputMode};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

use crate::error::{PlaybackError, Result};
use crate::platform::{
    ActivityId, AudioSessionApi, CommandStatus, LiveActivitySurface, NowPlayingSurface,
    TransportCommand, TransportHandler,
};
use crate::registry::AmbientRegistry;
use crate::source::{EndOfStream, LoopEngine, MediaInfo, NarratedEngine};

/// Duration reported for sources without an explicit one
pub const DEFAULT_FAKE_DURATION: f64 = 60.0;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Write a small placeholder file for every ambient asset into `dir`
pub fn write_ambient_assets(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    for name in AmbientRegistry::file_names() {
        std::fs::write(dir.join(name), b"ambient")?;
    }
    Ok(())
}

// ===== Narrated engine =====

/// Call received by [`FakeNarratedEngine`]
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Load(String),
    Play,
    Pause,
    Seek(f64),
    SetRate(f64),
    Stop,
}

#[derive(Default)]
struct NarratedState {
    durations: HashMap<String, f64>,
    failing: HashSet<String>,
    held: HashSet<String>,
    position: f64,
    finished: bool,
    playing: bool,
    rate: f64,
    calls: Vec<EngineCall>,
}

/// Scripted narrated engine
///
/// Sources are keyed by their display form (path or URL). Loading resolves
/// immediately with the scripted duration unless the source is held or set
/// to fail. Position only moves when a test sets it.
#[derive(Default)]
pub struct FakeNarratedEngine {
    state: Mutex<NarratedState>,
    released: Notify,
}

impl FakeNarratedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Duration reported when `source` loads
    pub fn set_duration(&self, source: &str, duration: f64) {
        lock(&self.state).durations.insert(source.to_string(), duration);
    }

    /// Make loading `source` fail with a decode error
    pub fn fail_loading(&self, source: &str) {
        lock(&self.state).failing.insert(source.to_string());
    }

    /// Keep loading `source` pending until [`release_loading`](Self::release_loading)
    pub fn hold_loading(&self, source: &str) {
        lock(&self.state).held.insert(source.to_string());
    }

    /// Let every held load complete
    pub fn release_loading(&self) {
        lock(&self.state).held.clear();
        self.released.notify_waiters();
    }

    pub fn set_position(&self, position: f64) {
        lock(&self.state).position = position;
    }

    /// Report end of stream from now on
    pub fn finish(&self) {
        lock(&self.state).finished = true;
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        lock(&self.state).calls.clone()
    }

    /// Number of `pause` calls received
    pub fn pauses(&self) -> usize {
        self.count(|call| matches!(call, EngineCall::Pause))
    }

    /// Number of `stop` calls received
    pub fn stops(&self) -> usize {
        self.count(|call| matches!(call, EngineCall::Stop))
    }

    pub fn is_playing(&self) -> bool {
        lock(&self.state).playing
    }

    /// Last rate applied through `set_rate`
    pub fn rate(&self) -> f64 {
        lock(&self.state).rate
    }

    fn count(&self, predicate: impl Fn(&EngineCall) -> bool) -> usize {
        lock(&self.state).calls.iter().filter(|c| predicate(c)).count()
    }

    fn is_held(&self, key: &str) -> bool {
        lock(&self.state).held.contains(key)
    }

    fn record(&self, call: EngineCall) {
        lock(&self.state).calls.push(call);
    }
}

#[async_trait]
impl NarratedEngine for FakeNarratedEngine {
    async fn load(&self, source: &AudioSource) -> Result<MediaInfo> {
        let key = source.to_string();
        self.record(EngineCall::Load(key.clone()));

        loop {
            let released = self.released.notified();
            if !self.is_held(&key) {
                break;
            }
            released.await;
        }

        let mut state = lock(&self.state);
        if state.failing.contains(&key) {
            return Err(PlaybackError::decode_failed(format!("cannot decode {}", key)));
        }
        state.position = 0.0;
        state.finished = false;
        let duration = state
            .durations
            .get(&key)
            .copied()
            .unwrap_or(DEFAULT_FAKE_DURATION);
        Ok(MediaInfo { duration })
    }

    fn play(&self) -> Result<()> {
        let mut state = lock(&self.state);
        state.playing = true;
        state.calls.push(EngineCall::Play);
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        let mut state = lock(&self.state);
        state.playing = false;
        state.calls.push(EngineCall::Pause);
        Ok(())
    }

    fn seek(&self, position: f64) -> Result<()> {
        let mut state = lock(&self.state);
        state.position = position;
        state.calls.push(EngineCall::Seek(position));
        Ok(())
    }

    fn set_rate(&self, rate: f64) -> Result<()> {
        let mut state = lock(&self.state);
        state.rate = rate;
        state.calls.push(EngineCall::SetRate(rate));
        Ok(())
    }

    fn position(&self) -> f64 {
        lock(&self.state).position
    }

    fn is_finished(&self) -> bool {
        lock(&self.state).finished
    }

    fn stop(&self) {
        let mut state = lock(&self.state);
        state.playing = false;
        state.calls.push(EngineCall::Stop);
    }
}

// ===== Loop engine =====

#[derive(Default)]
struct LoopState {
    starts: Vec<(PathBuf, f32)>,
    volumes: Vec<f32>,
    volume: f32,
    restarts: usize,
    stops: usize,
    on_end: Option<Arc<dyn Fn() + Send + Sync>>,
}

/// Loop engine that records starts, stops and volume changes
#[derive(Default)]
pub struct FakeLoopEngine {
    state: Mutex<LoopState>,
}

impl FakeLoopEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the stream reaching its end
    pub fn trigger_end(&self) {
        let on_end = lock(&self.state).on_end.clone();
        if let Some(on_end) = on_end {
            on_end();
        }
    }

    /// Every `start` call: asset and initial volume
    pub fn starts(&self) -> Vec<(PathBuf, f32)> {
        lock(&self.state).starts.clone()
    }

    /// Every `set_volume` call, in order
    pub fn volumes(&self) -> Vec<f32> {
        lock(&self.state).volumes.clone()
    }

    /// Current output volume
    pub fn volume(&self) -> f32 {
        lock(&self.state).volume
    }

    pub fn restarts(&self) -> usize {
        lock(&self.state).restarts
    }

    pub fn stops(&self) -> usize {
        lock(&self.state).stops
    }

    /// Whether a loop is currently playing
    pub fn is_looping(&self) -> bool {
        lock(&self.state).on_end.is_some()
    }
}

impl LoopEngine for FakeLoopEngine {
    fn start(&self, asset: &Path, volume: f32, on_end: EndOfStream) -> Result<()> {
        let mut state = lock(&self.state);
        state.starts.push((asset.to_path_buf(), volume));
        state.volume = volume;
        state.on_end = Some(Arc::from(on_end));
        Ok(())
    }

    fn restart(&self) -> Result<()> {
        lock(&self.state).restarts += 1;
        Ok(())
    }

    fn set_volume(&self, volume: f32) {
        let mut state = lock(&self.state);
        state.volumes.push(volume);
        state.volume = volume;
    }

    fn stop(&self) {
        let mut state = lock(&self.state);
        state.stops += 1;
        state.on_end = None;
    }
}

// ===== Audio session =====

/// Audio session that records configuration and can be told to refuse it
#[derive(Default)]
pub struct FakeSession {
    modes: Mutex<Vec<OutputMode>>,
    activations: AtomicUsize,
    deactivations: AtomicUsize,
    fail_configure: AtomicBool,
}

impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse (or accept again) configuration requests
    pub fn fail_configure(&self, fail: bool) {
        self.fail_configure.store(fail, Ordering::SeqCst);
    }

    /// Successfully configured modes, in order
    pub fn configured_modes(&self) -> Vec<OutputMode> {
        lock(&self.modes).clone()
    }

    pub fn activations(&self) -> usize {
        self.activations.load(Ordering::SeqCst)
    }

    pub fn deactivations(&self) -> usize {
        self.deactivations.load(Ordering::SeqCst)
    }
}

impl AudioSessionApi for FakeSession {
    fn configure(&self, mode: OutputMode) -> Result<()> {
        if self.fail_configure.load(Ordering::SeqCst) {
            return Err(PlaybackError::engine("audio session refused configuration"));
        }
        lock(&self.modes).push(mode);
        Ok(())
    }

    fn activate(&self) -> Result<()> {
        self.activations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn deactivate(&self) -> Result<()> {
        self.deactivations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ===== Now playing =====

/// Now-playing surface that keeps every published entry
#[derive(Default)]
pub struct RecordingNowPlaying {
    handler: Mutex<Option<TransportHandler>>,
    published: Mutex<Vec<NowPlayingMetadata>>,
    clears: AtomicUsize,
}

impl RecordingNowPlaying {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `command` the way the platform would
    ///
    /// Returns `None` when no handler is registered.
    pub fn send(&self, command: TransportCommand) -> Option<CommandStatus> {
        let handler = lock(&self.handler).clone();
        handler.map(|handler| handler(command))
    }

    pub fn is_registered(&self) -> bool {
        lock(&self.handler).is_some()
    }

    pub fn published(&self) -> Vec<NowPlayingMetadata> {
        lock(&self.published).clone()
    }

    pub fn last(&self) -> Option<NowPlayingMetadata> {
        lock(&self.published).last().cloned()
    }

    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl NowPlayingSurface for RecordingNowPlaying {
    fn register_commands(&self, handler: TransportHandler) -> Result<()> {
        *lock(&self.handler) = Some(handler);
        Ok(())
    }

    fn unregister_commands(&self) {
        *lock(&self.handler) = None;
    }

    fn publish(&self, metadata: &NowPlayingMetadata) -> Result<()> {
        lock(&self.published).push(metadata.clone());
        Ok(())
    }

    fn clear(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }
}

// ===== Live activity =====

/// Call received by [`RecordingLiveActivity`]
#[derive(Debug, Clone, PartialEq)]
pub enum LiveActivityCall {
    Start(ActivityId, LiveActivityContent),
    Update(ActivityId, LiveActivityContent),
    End(ActivityId),
}

/// Live activity surface that records its lifecycle
#[derive(Default)]
pub struct RecordingLiveActivity {
    calls: Mutex<Vec<LiveActivityCall>>,
    next_id: AtomicUsize,
    attempts: AtomicUsize,
    refuse: AtomicBool,
}

impl RecordingLiveActivity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse (or allow again) new activities
    pub fn refuse_starts(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<LiveActivityCall> {
        lock(&self.calls).clone()
    }

    /// Successfully started activities
    pub fn starts(&self) -> usize {
        self.count(|call| matches!(call, LiveActivityCall::Start(..)))
    }

    pub fn updates(&self) -> usize {
        self.count(|call| matches!(call, LiveActivityCall::Update(..)))
    }

    pub fn ends(&self) -> usize {
        self.count(|call| matches!(call, LiveActivityCall::End(..)))
    }

    /// Every `start` call, refused or not
    pub fn start_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Content of the most recent start or update
    pub fn last_content(&self) -> Option<LiveActivityContent> {
        lock(&self.calls).iter().rev().find_map(|call| match call {
            LiveActivityCall::Start(_, content) | LiveActivityCall::Update(_, content) => {
                Some(content.clone())
            }
            LiveActivityCall::End(_) => None,
        })
    }

    fn count(&self, predicate: impl Fn(&LiveActivityCall) -> bool) -> usize {
        lock(&self.calls).iter().filter(|c| predicate(c)).count()
    }
}

impl LiveActivitySurface for RecordingLiveActivity {
    fn start(&self, content: &LiveActivityContent) -> Result<ActivityId> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.refuse.load(Ordering::SeqCst) {
            return Err(PlaybackError::engine("live activities disabled"));
        }
        let id = ActivityId(format!(
            "activity-{}",
            self.next_id.fetch_add(1, Ordering::SeqCst) + 1
        ));
        lock(&self.calls).push(LiveActivityCall::Start(id.clone(), content.clone()));
        Ok(id)
    }

    fn update(&self, id: &ActivityId, content: &LiveActivityContent) -> Result<()> {
        lock(&self.calls).push(LiveActivityCall::Update(id.clone(), content.clone()));
        Ok(())
    }

    fn end(&self, id: &ActivityId) {
        lock(&self.calls).push(LiveActivityCall::End(id.clone()));
    }
}
