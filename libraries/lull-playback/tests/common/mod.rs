//! Shared harness for coordinator integration tests

#![allow(dead_code)]

use lull_core::{AudioSource, MemoryStore, PreferenceStore};
use lull_playback::testing::{
    write_ambient_assets, FakeLoopEngine, FakeNarratedEngine, FakeSession, RecordingLiveActivity,
    RecordingNowPlaying,
};
use lull_playback::{
    AmbientRegistry, CoordinatorBuilder, CoordinatorConfig, CoordinatorHandle, NarratedRequest,
    PlaybackPhase, PlaybackRuntime, PlaybackSnapshot, SessionId,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Coordinator wired to in-memory doubles
pub struct Rig {
    pub handle: CoordinatorHandle,
    pub narrated: Arc<FakeNarratedEngine>,
    pub looper: Arc<FakeLoopEngine>,
    pub session: Arc<FakeSession>,
    pub now_playing: Arc<RecordingNowPlaying>,
    pub live: Arc<RecordingLiveActivity>,
    pub preferences: Arc<MemoryStore>,
    runtime: PlaybackRuntime,
    stories: TempDir,
    _assets: TempDir,
}

impl Rig {
    pub fn start() -> Self {
        Self::with_preferences(MemoryStore::new())
    }

    pub fn with_preferences(preferences: MemoryStore) -> Self {
        Self::build(preferences, Arc::new(FakeSession::new()))
    }

    pub fn with_session(session: Arc<FakeSession>) -> Self {
        Self::build(MemoryStore::new(), session)
    }

    fn build(preferences: MemoryStore, session: Arc<FakeSession>) -> Self {
        let assets = tempfile::tempdir().unwrap();
        write_ambient_assets(assets.path()).unwrap();
        let stories = tempfile::tempdir().unwrap();

        let narrated = Arc::new(FakeNarratedEngine::new());
        let looper = Arc::new(FakeLoopEngine::new());
        let now_playing = Arc::new(RecordingNowPlaying::new());
        let live = Arc::new(RecordingLiveActivity::new());
        let preferences = Arc::new(preferences);

        let runtime = CoordinatorBuilder::new()
            .config(CoordinatorConfig::default())
            .with_session_api(session.clone())
            .with_narrated_engine(narrated.clone())
            .with_loop_engine(looper.clone())
            .with_registry(AmbientRegistry::load(assets.path()).unwrap())
            .with_preferences(preferences.clone() as Arc<dyn PreferenceStore>)
            .with_now_playing(now_playing.clone())
            .with_live_activity(live.clone())
            .spawn()
            .unwrap();

        Self {
            handle: runtime.handle(),
            narrated,
            looper,
            session,
            now_playing,
            live,
            preferences,
            runtime,
            stories,
            _assets: assets,
        }
    }

    /// Downloaded story file with a scripted duration
    pub fn story(&self, name: &str, duration: f64) -> AudioSource {
        let path = self.stories.path().join(name);
        std::fs::write(&path, b"narration").unwrap();
        self.narrated
            .set_duration(&path.display().to_string(), duration);
        AudioSource::local(path)
    }

    pub fn request(&self, source: AudioSource) -> NarratedRequest {
        NarratedRequest::new(source, "The Lighthouse", "Ava")
    }

    /// Start `source` and wait until it plays
    pub async fn play(&self, source: AudioSource) -> SessionId {
        let session = self
            .handle
            .play_narrated(self.request(source))
            .await
            .unwrap();
        self.wait_until(|s| s.session == Some(session) && s.phase == PlaybackPhase::Playing)
            .await;
        session
    }

    /// Wait until the published snapshot satisfies `predicate`
    pub async fn wait_until(
        &self,
        predicate: impl FnMut(&PlaybackSnapshot) -> bool,
    ) -> PlaybackSnapshot {
        let mut state = self.handle.subscribe_state();
        let snapshot = tokio::time::timeout(Duration::from_secs(3600), state.wait_for(predicate))
            .await
            .expect("state never reached")
            .expect("coordinator stopped");
        snapshot.clone()
    }

    /// Let queued commands, notifications and adapters run
    pub async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    pub fn ambient_volume(&self) -> f32 {
        self.handle.ambient_status().volume
    }

    pub async fn shutdown(self) {
        self.runtime.shutdown().await;
    }
}
