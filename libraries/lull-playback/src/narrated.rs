//! Narrated player
//!
//! Wraps one narrated source on top of a [`NarratedEngine`]. Loading and
//! time observation run as background tasks that only send
//! session-tagged notifications; they never touch coordinator state.
//! `detach` aborts both tasks before it returns.

use lull_core::AudioSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use crate::error::Result;
use crate::events::{NarratedEvent, Notification, NotificationSender};
use crate::source::NarratedEngine;
use crate::subscription::Subscription;
use crate::types::SessionId;

struct AttachedSource {
    session: SessionId,
    _status: Subscription,
    time: Option<Subscription>,
}

pub(crate) struct NarratedPlayer {
    engine: Arc<dyn NarratedEngine>,
    notifications: NotificationSender,
    tick_interval: Duration,
    next_session: u64,
    current: Option<AttachedSource>,
}

impl NarratedPlayer {
    pub(crate) fn new(
        engine: Arc<dyn NarratedEngine>,
        notifications: NotificationSender,
        tick_interval: Duration,
    ) -> Self {
        Self {
            engine,
            notifications,
            tick_interval,
            next_session: 0,
            current: None,
        }
    }

    /// Attach `source` and start loading it
    ///
    /// Any previous source is detached first. The outcome arrives as a
    /// `Ready` or `Failed` notification for the returned session.
    pub(crate) fn attach(&mut self, source: AudioSource) -> SessionId {
        self.detach();

        self.next_session += 1;
        let session = SessionId(self.next_session);

        let engine = self.engine.clone();
        let tx = self.notifications.clone();
        tracing::debug!(session = %session, source = %source, "Attaching narrated source");
        let handle = tokio::spawn(async move {
            let event = match engine.load(&source).await {
                Ok(info) => NarratedEvent::Ready {
                    duration: info.duration,
                },
                Err(e) => NarratedEvent::Failed(e),
            };
            let _ = tx.send(Notification::Narrated { session, event });
        });

        self.current = Some(AttachedSource {
            session,
            _status: Subscription::new(handle),
            time: None,
        });
        session
    }

    /// Begin periodic time notifications for the attached source
    ///
    /// Sends `Time` every tick and a single `Finished` once the engine
    /// reports the end, after which the task stops.
    pub(crate) fn start_time_updates(&mut self) {
        let Some(current) = self.current.as_mut() else {
            return;
        };
        if current.time.is_some() {
            return;
        }

        let session = current.session;
        let engine = self.engine.clone();
        let tx = self.notifications.clone();
        let period = self.tick_interval;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                let event = if engine.is_finished() {
                    NarratedEvent::Finished
                } else {
                    NarratedEvent::Time {
                        position: engine.position(),
                    }
                };
                let finished = matches!(event, NarratedEvent::Finished);

                if tx.send(Notification::Narrated { session, event }).is_err() || finished {
                    break;
                }
            }
        });

        current.time = Some(Subscription::new(handle));
    }

    /// Detach the current source
    ///
    /// Notification tasks are aborted before the engine is stopped.
    pub(crate) fn detach(&mut self) {
        if let Some(current) = self.current.take() {
            let session = current.session;
            drop(current);
            self.engine.stop();
            tracing::debug!(session = %session, "Narrated source detached");
        }
    }

    pub(crate) fn play(&self) -> Result<()> {
        self.engine.play()
    }

    pub(crate) fn pause(&self) -> Result<()> {
        self.engine.pause()
    }

    pub(crate) fn seek(&self, position: f64) -> Result<()> {
        self.engine.seek(position)
    }

    pub(crate) fn set_rate(&self, rate: f64) -> Result<()> {
        self.engine.set_rate(rate)
    }

    pub(crate) fn session(&self) -> Option<SessionId> {
        self.current.as_ref().map(|c| c.session)
    }

    /// Whether the time observation task has ended on its own
    #[cfg(test)]
    pub(crate) fn time_updates_stopped(&self) -> bool {
        self.current
            .as_ref()
            .and_then(|c| c.time.as_ref())
            .map_or(true, Subscription::is_finished)
    }
}

impl Drop for NarratedPlayer {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeNarratedEngine;
    use tokio::sync::mpsc;

    type Rx = mpsc::UnboundedReceiver<Notification>;

    fn player(engine: Arc<FakeNarratedEngine>) -> (NarratedPlayer, Rx) {
        let (tx, rx) = mpsc::unbounded_channel();
        (NarratedPlayer::new(engine, tx, Duration::from_millis(100)), rx)
    }

    async fn next(rx: &mut Rx) -> (SessionId, NarratedEvent) {
        match rx.recv().await {
            Some(Notification::Narrated { session, event }) => (session, event),
            other => panic!("unexpected notification: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn attach_reports_readiness() {
        let engine = Arc::new(FakeNarratedEngine::new());
        engine.set_duration("story.mp3", 120.0);
        let (mut player, mut rx) = player(engine.clone());

        let session = player.attach(AudioSource::remote("story.mp3"));
        assert_eq!(player.session(), Some(session));

        let (tagged, event) = next(&mut rx).await;
        assert_eq!(tagged, session);
        assert!(matches!(event, NarratedEvent::Ready { duration } if duration == 120.0));
    }

    #[tokio::test(start_paused = true)]
    async fn sessions_are_monotonic() {
        let engine = Arc::new(FakeNarratedEngine::new());
        let (mut player, _rx) = player(engine);

        let first = player.attach(AudioSource::remote("a.mp3"));
        let second = player.attach(AudioSource::remote("b.mp3"));
        assert!(second > first);
    }

    #[tokio::test(start_paused = true)]
    async fn time_updates_until_finished() {
        let engine = Arc::new(FakeNarratedEngine::new());
        engine.set_duration("story.mp3", 60.0);
        let (mut player, mut rx) = player(engine.clone());

        let session = player.attach(AudioSource::remote("story.mp3"));
        next(&mut rx).await;

        engine.set_position(12.5);
        player.start_time_updates();
        let (tagged, event) = next(&mut rx).await;
        assert_eq!(tagged, session);
        assert!(matches!(event, NarratedEvent::Time { position } if position == 12.5));

        engine.finish();
        loop {
            if let (_, NarratedEvent::Finished) = next(&mut rx).await {
                break;
            }
        }
        tokio::task::yield_now().await;
        assert!(player.time_updates_stopped());
    }

    #[tokio::test(start_paused = true)]
    async fn detach_silences_pending_load() {
        let engine = Arc::new(FakeNarratedEngine::new());
        engine.hold_loading("slow.mp3");
        let (mut player, mut rx) = player(engine.clone());

        player.attach(AudioSource::remote("slow.mp3"));
        player.detach();
        engine.release_loading();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(player.session(), None);
        assert_eq!(engine.stops(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn attaching_stops_time_updates_of_the_previous_source() {
        let engine = Arc::new(FakeNarratedEngine::new());
        engine.set_duration("first.mp3", 600.0);
        engine.set_duration("second.mp3", 90.0);
        let (mut player, mut rx) = player(engine.clone());

        let first = player.attach(AudioSource::remote("first.mp3"));
        next(&mut rx).await;
        player.start_time_updates();
        for _ in 0..3 {
            let (tagged, event) = next(&mut rx).await;
            assert_eq!(tagged, first);
            assert!(matches!(event, NarratedEvent::Time { .. }));
        }

        let second = player.attach(AudioSource::remote("second.mp3"));
        tokio::time::sleep(Duration::from_secs(1)).await;

        let mut delivered = Vec::new();
        while let Ok(Notification::Narrated { session, .. }) = rx.try_recv() {
            delivered.push(session);
        }
        assert_eq!(delivered, vec![second]);
    }

    #[tokio::test(start_paused = true)]
    async fn load_failure_is_reported() {
        let engine = Arc::new(FakeNarratedEngine::new());
        engine.fail_loading("broken.mp3");
        let (mut player, mut rx) = player(engine);

        player.attach(AudioSource::remote("broken.mp3"));
        let (_, event) = next(&mut rx).await;
        assert!(matches!(event, NarratedEvent::Failed(_)));
    }
}
