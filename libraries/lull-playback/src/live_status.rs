//! Live status adapter
//!
//! Mirrors narrated playback into the OS glanceable activity. One live
//! activity per narrated session: it starts once the session is ready, is
//! updated on material changes and ends when the session detaches or fails.

use lull_core::LiveActivityContent;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::platform::{ActivityId, LiveActivitySurface};
use crate::types::{PlaybackSnapshot, SessionId};

struct LiveSession {
    session: SessionId,
    activity: ActivityId,
    last: PlaybackSnapshot,
}

/// Drives a [`LiveActivitySurface`] from published snapshots
pub struct LiveStatusAdapter {
    surface: Arc<dyn LiveActivitySurface>,
    state: watch::Receiver<PlaybackSnapshot>,
    live: Option<LiveSession>,
    /// Session whose activity could not be started; not retried
    refused: Option<SessionId>,
}

impl LiveStatusAdapter {
    pub fn new(
        surface: Arc<dyn LiveActivitySurface>,
        state: watch::Receiver<PlaybackSnapshot>,
    ) -> Self {
        Self {
            surface,
            state,
            live: None,
            refused: None,
        }
    }

    /// Follow state until the coordinator stops, then end any live activity
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        loop {
            let snapshot = self.state.borrow_and_update().clone();
            self.apply(&snapshot);

            if self.state.changed().await.is_err() {
                break;
            }
        }

        self.end();
        tracing::debug!("Live status adapter stopped");
    }

    fn apply(&mut self, snapshot: &PlaybackSnapshot) {
        // A different (or no) session means the live one is over
        if self
            .live
            .as_ref()
            .is_some_and(|live| Some(live.session) != snapshot.session)
        {
            self.end();
        }

        let Some(session) = snapshot.session else {
            return;
        };
        if !snapshot.phase.is_seekable() {
            return;
        }

        let content = LiveActivityContent::project(
            snapshot.title.clone().unwrap_or_default(),
            snapshot.subtitle(),
            &snapshot.state,
        );

        match self.live.as_mut() {
            Some(live) => {
                if !live.last.differs_materially(snapshot) {
                    return;
                }
                if let Err(e) = self.surface.update(&live.activity, &content) {
                    tracing::warn!(
                        activity = %live.activity,
                        "Failed to update live activity: {}",
                        e
                    );
                }
                live.last = snapshot.clone();
            }
            None => {
                if self.refused == Some(session) {
                    return;
                }
                match self.surface.start(&content) {
                    Ok(activity) => {
                        tracing::debug!(
                            session = %session,
                            activity = %activity,
                            "Live activity started"
                        );
                        self.live = Some(LiveSession {
                            session,
                            activity,
                            last: snapshot.clone(),
                        });
                    }
                    Err(e) => {
                        tracing::warn!(session = %session, "Failed to start live activity: {}", e);
                        self.refused = Some(session);
                    }
                }
            }
        }
    }

    fn end(&mut self) {
        if let Some(live) = self.live.take() {
            self.surface.end(&live.activity);
            tracing::debug!(
                session = %live.session,
                activity = %live.activity,
                "Live activity ended"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{LiveActivityCall, RecordingLiveActivity};
    use crate::types::PlaybackPhase;
    use lull_core::PlaybackState;

    fn snapshot(session: u64, phase: PlaybackPhase, current_time: f64) -> PlaybackSnapshot {
        PlaybackSnapshot {
            phase,
            session: Some(SessionId(session)),
            title: Some(format!("Story {session}")),
            state: PlaybackState {
                is_playing: phase == PlaybackPhase::Playing,
                current_time,
                duration: 120.0,
                rate: 1.0,
            },
            ..Default::default()
        }
    }

    fn adapter(surface: Arc<RecordingLiveActivity>) -> LiveStatusAdapter {
        let (_tx, rx) = watch::channel(PlaybackSnapshot::default());
        LiveStatusAdapter::new(surface, rx)
    }

    #[test]
    fn starts_only_once_ready() {
        let surface = Arc::new(RecordingLiveActivity::new());
        let mut adapter = adapter(surface.clone());

        adapter.apply(&snapshot(1, PlaybackPhase::Loading, 0.0));
        assert!(surface.calls().is_empty());

        adapter.apply(&snapshot(1, PlaybackPhase::Playing, 0.0));
        assert_eq!(surface.starts(), 1);
    }

    #[test]
    fn updates_are_throttled_to_material_changes() {
        let surface = Arc::new(RecordingLiveActivity::new());
        let mut adapter = adapter(surface.clone());

        adapter.apply(&snapshot(1, PlaybackPhase::Playing, 0.0));
        adapter.apply(&snapshot(1, PlaybackPhase::Playing, 0.3));
        adapter.apply(&snapshot(1, PlaybackPhase::Playing, 0.6));
        assert_eq!(surface.updates(), 0);

        adapter.apply(&snapshot(1, PlaybackPhase::Playing, 1.2));
        adapter.apply(&snapshot(1, PlaybackPhase::Paused, 1.3));
        assert_eq!(surface.updates(), 2);
    }

    #[test]
    fn new_session_ends_previous_activity_first() {
        let surface = Arc::new(RecordingLiveActivity::new());
        let mut adapter = adapter(surface.clone());

        adapter.apply(&snapshot(1, PlaybackPhase::Playing, 10.0));
        adapter.apply(&snapshot(2, PlaybackPhase::Loading, 0.0));
        adapter.apply(&snapshot(2, PlaybackPhase::Playing, 0.0));

        let calls = surface.calls();
        assert!(matches!(calls[0], LiveActivityCall::Start(..)));
        assert!(matches!(calls[1], LiveActivityCall::End(..)));
        assert!(matches!(calls[2], LiveActivityCall::Start(..)));
        assert_eq!(calls.len(), 3);
    }

    #[test]
    fn detach_or_failure_ends_activity() {
        let surface = Arc::new(RecordingLiveActivity::new());
        let mut adapter = adapter(surface.clone());

        adapter.apply(&snapshot(1, PlaybackPhase::Playing, 10.0));
        adapter.apply(&PlaybackSnapshot {
            phase: PlaybackPhase::Failed,
            ..Default::default()
        });
        assert_eq!(surface.ends(), 1);

        adapter.end();
        assert_eq!(surface.ends(), 1);
    }

    #[test]
    fn refused_start_is_not_retried_for_same_session() {
        let surface = Arc::new(RecordingLiveActivity::new());
        surface.refuse_starts(true);
        let mut adapter = adapter(surface.clone());

        adapter.apply(&snapshot(1, PlaybackPhase::Playing, 0.0));
        adapter.apply(&snapshot(1, PlaybackPhase::Paused, 0.0));
        assert_eq!(surface.starts(), 0);
        assert_eq!(surface.start_attempts(), 1);

        surface.refuse_starts(false);
        adapter.apply(&snapshot(2, PlaybackPhase::Playing, 0.0));
        assert_eq!(surface.starts(), 1);
    }
}
