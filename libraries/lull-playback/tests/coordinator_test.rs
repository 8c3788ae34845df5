//! End-to-end coordinator behaviour against in-memory platform doubles
//!
//! Every test runs on a paused clock, so timers and time updates advance
//! deterministically.

mod common;

use common::Rig;
use lull_core::{AmbientSelection, AudioSource, MemoryStore, OutputMode};
use lull_playback::testing::{EngineCall, FakeSession};
use lull_playback::{
    AudioInterruption, FailureKind, PlaybackError, PlaybackEvent, PlaybackPhase,
    PLAYBACK_RATE_KEY,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

mod scenarios {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ambient_ducks_under_narration_and_recovers_after_finish() {
        let rig = Rig::start();
        let mut events = rig.handle.subscribe_events();

        rig.handle.play_ambient(AmbientSelection::Nature).await.unwrap();
        assert_eq!(rig.ambient_volume(), 0.3);
        assert_eq!(rig.looper.starts()[0].1, 0.3);

        let session = rig.play(rig.story("story.mp3", 30.0)).await;
        assert_eq!(rig.ambient_volume(), 0.2);

        rig.narrated.finish();
        let snapshot = rig.wait_until(|s| s.session.is_none()).await;
        assert_eq!(snapshot.phase, PlaybackPhase::Idle);
        assert!(!snapshot.state.is_playing);

        assert_eq!(rig.ambient_volume(), 0.3);
        assert_eq!(rig.looper.volumes(), vec![0.2, 0.3]);
        assert!(rig.looper.is_looping());
        assert_eq!(rig.handle.ambient_status().selection, AmbientSelection::Nature);

        assert_eq!(
            events.recv().await.unwrap(),
            PlaybackEvent::NarratedFinished { session }
        );

        rig.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_timer_pauses_after_delay() {
        let rig = Rig::start();
        rig.play(rig.story("story.mp3", 3600.0)).await;

        let timer = rig.handle.set_sleep_timer(300.0).await.unwrap();
        assert_eq!(timer.duration_seconds, 300.0);
        assert!(rig.handle.snapshot().sleep_timer.is_some());

        tokio::time::sleep(Duration::from_secs(299)).await;
        assert!(rig.handle.snapshot().state.is_playing);

        let snapshot = rig.wait_until(|s| !s.state.is_playing).await;
        assert_eq!(snapshot.phase, PlaybackPhase::Paused);
        assert!(snapshot.sleep_timer.is_none());
        assert_eq!(rig.narrated.pauses(), 1);

        rig.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn rate_is_clamped_before_storing() {
        let rig = Rig::start();

        assert_eq!(rig.handle.set_rate(10.0).await.unwrap(), 4.0);
        assert_eq!(rig.handle.snapshot().state.rate, 4.0);
        assert_eq!(rig.preferences.writes(), 1);
        assert_eq!(
            lull_core::PreferenceStore::get(rig.preferences.as_ref(), PLAYBACK_RATE_KEY).unwrap(),
            Some(json!(4.0))
        );

        rig.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn seek_past_end_lands_on_duration() {
        let rig = Rig::start();
        rig.play(rig.story("story.mp3", 120.0)).await;

        assert_eq!(rig.handle.seek(170.0).await.unwrap(), 120.0);
        assert_eq!(rig.handle.snapshot().state.current_time, 120.0);

        rig.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn second_story_silences_the_first() {
        let rig = Rig::start();
        let first_source = rig.story("first.mp3", 600.0);
        rig.narrated.hold_loading(&first_source.to_string());

        let first = rig
            .handle
            .play_narrated(rig.request(first_source))
            .await
            .unwrap();
        let second = rig.play(rig.story("second.mp3", 90.0)).await;
        assert_ne!(first, second);

        // The first load completing now must not touch the second session
        rig.narrated.release_loading();
        rig.settle().await;
        let snapshot = rig.handle.snapshot();
        assert_eq!(snapshot.session, Some(second));
        assert_eq!(snapshot.state.duration, 90.0);

        rig.narrated.set_position(33.0);
        let snapshot = rig.wait_until(|s| s.state.current_time == 33.0).await;
        assert_eq!(snapshot.session, Some(second));

        rig.shutdown().await;
    }
}

mod transport {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn pause_and_resume_toggle_ducking() {
        let rig = Rig::start();
        rig.handle.play_ambient(AmbientSelection::Rain).await.unwrap();
        rig.play(rig.story("story.mp3", 60.0)).await;
        assert_eq!(rig.ambient_volume(), 0.2);

        rig.handle.pause().await.unwrap();
        assert_eq!(rig.handle.snapshot().phase, PlaybackPhase::Paused);
        assert_eq!(rig.ambient_volume(), 0.3);

        rig.handle.resume().await.unwrap();
        assert_eq!(rig.handle.snapshot().phase, PlaybackPhase::Playing);
        assert_eq!(rig.ambient_volume(), 0.2);

        assert!(!rig.handle.toggle_play_pause().await.unwrap());
        assert_eq!(rig.ambient_volume(), 0.3);
        assert!(rig.handle.toggle_play_pause().await.unwrap());
        assert_eq!(rig.ambient_volume(), 0.2);

        rig.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_pause_and_resume_are_noops() {
        let rig = Rig::start();
        rig.play(rig.story("story.mp3", 60.0)).await;

        rig.handle.resume().await.unwrap();
        rig.handle.pause().await.unwrap();
        rig.handle.pause().await.unwrap();
        assert_eq!(rig.narrated.pauses(), 1);

        rig.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn transport_without_narration_is_invalid() {
        let rig = Rig::start();

        let err = rig.handle.pause().await.unwrap_err();
        assert!(matches!(
            err,
            PlaybackError::InvalidState {
                operation: "pause",
                phase: PlaybackPhase::Idle
            }
        ));
        assert!(matches!(
            rig.handle.seek(10.0).await,
            Err(PlaybackError::InvalidState { .. })
        ));
        assert!(matches!(
            rig.handle.toggle_play_pause().await,
            Err(PlaybackError::InvalidState { .. })
        ));

        rig.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn skips_stay_within_narration() {
        let rig = Rig::start();
        rig.play(rig.story("story.mp3", 40.0)).await;

        assert_eq!(rig.handle.skip_forward(None).await.unwrap(), 15.0);
        assert_eq!(rig.handle.skip_forward(Some(30.0)).await.unwrap(), 40.0);
        assert_eq!(rig.handle.skip_backward(Some(5.0)).await.unwrap(), 35.0);
        assert_eq!(rig.handle.skip_backward(Some(f64::NAN)).await.unwrap(), 35.0);
        assert_eq!(rig.handle.skip_forward(Some(-20.0)).await.unwrap(), 35.0);
        assert_eq!(rig.handle.skip_backward(Some(100.0)).await.unwrap(), 0.0);
        assert_eq!(rig.handle.seek(f64::NAN).await.unwrap(), 0.0);

        rig.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn rate_applies_to_live_player() {
        let rig = Rig::start();
        rig.play(rig.story("story.mp3", 60.0)).await;

        assert_eq!(rig.handle.set_rate(1.5).await.unwrap(), 1.5);
        assert_eq!(rig.narrated.rate(), 1.5);
        assert_eq!(rig.handle.set_rate(f64::NAN).await.unwrap(), 1.0);
        assert_eq!(rig.preferences.writes(), 2);

        rig.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn persisted_rate_is_applied_on_ready() {
        let rig = Rig::with_preferences(MemoryStore::with_value(PLAYBACK_RATE_KEY, json!(2.0)));
        assert_eq!(rig.handle.snapshot().state.rate, 2.0);

        rig.play(rig.story("story.mp3", 60.0)).await;
        assert_eq!(rig.narrated.rate(), 2.0);
        assert_eq!(rig.handle.snapshot().state.rate, 2.0);
        assert_eq!(rig.preferences.writes(), 0);

        rig.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn time_updates_track_engine_position() {
        let rig = Rig::start();
        rig.play(rig.story("story.mp3", 60.0)).await;

        rig.narrated.set_position(12.0);
        rig.wait_until(|s| s.state.current_time == 12.0).await;

        // Positions beyond the end are clamped
        rig.narrated.set_position(75.0);
        rig.wait_until(|s| s.state.current_time == 60.0).await;

        rig.shutdown().await;
    }
}

mod failures {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn missing_file_leaves_current_story_untouched() {
        let rig = Rig::start();
        let session = rig.play(rig.story("story.mp3", 60.0)).await;

        let err = rig
            .handle
            .play_narrated(rig.request(AudioSource::local("/not/downloaded/yet.mp3")))
            .await
            .unwrap_err();
        assert!(matches!(err, PlaybackError::SourceUnavailable(_)));

        let snapshot = rig.handle.snapshot();
        assert_eq!(snapshot.session, Some(session));
        assert_eq!(snapshot.phase, PlaybackPhase::Playing);
        assert_eq!(rig.narrated.stops(), 0);

        rig.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn decode_failure_is_terminal_and_reported_once() {
        let rig = Rig::start();
        let mut events = rig.handle.subscribe_events();
        let source = rig.story("broken.mp3", 60.0);
        rig.narrated.fail_loading(&source.to_string());

        rig.handle.play_narrated(rig.request(source)).await.unwrap();
        let snapshot = rig.wait_until(|s| s.phase == PlaybackPhase::Failed).await;
        assert_eq!(snapshot.session, None);
        assert!(!snapshot.state.is_playing);

        match events.recv().await.unwrap() {
            PlaybackEvent::Error { kind, .. } => assert_eq!(kind, FailureKind::DecodeFailed),
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(events.try_recv().is_err());

        // No retry
        rig.settle().await;
        let loads = rig
            .narrated
            .calls()
            .into_iter()
            .filter(|c| matches!(c, EngineCall::Load(_)))
            .count();
        assert_eq!(loads, 1);

        rig.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_duration_never_starts_playback() {
        for duration in [0.0, f64::NAN, f64::INFINITY] {
            let rig = Rig::start();
            let mut events = rig.handle.subscribe_events();

            rig.handle
                .play_narrated(rig.request(rig.story("empty.mp3", duration)))
                .await
                .unwrap();
            rig.wait_until(|s| s.phase == PlaybackPhase::Failed).await;

            assert!(!rig.narrated.is_playing());
            match events.recv().await.unwrap() {
                PlaybackEvent::Error { kind, .. } => {
                    assert_eq!(kind, FailureKind::InvalidDuration)
                }
                other => panic!("unexpected event: {other:?}"),
            }

            rig.shutdown().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn session_configuration_failure_degrades_silently() {
        let session = Arc::new(FakeSession::new());
        session.fail_configure(true);
        let rig = Rig::with_session(session);
        let mut events = rig.handle.subscribe_events();

        rig.play(rig.story("story.mp3", 60.0)).await;

        match events.recv().await.unwrap() {
            PlaybackEvent::SessionDegraded { .. } => {}
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(rig.narrated.is_playing());

        rig.shutdown().await;
    }
}

mod ambient {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn switching_selection_starts_at_current_ducking_level() {
        let rig = Rig::start();
        rig.handle.play_ambient(AmbientSelection::Rain).await.unwrap();
        rig.play(rig.story("story.mp3", 60.0)).await;

        rig.handle.play_ambient(AmbientSelection::Ocean).await.unwrap();
        let starts = rig.looper.starts();
        assert_eq!(starts.len(), 2);
        assert!(starts[1].0.ends_with("ocean_waves.m4a"));
        assert_eq!(starts[1].1, 0.2);
        assert_eq!(rig.looper.stops(), 1);

        rig.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn end_of_stream_loops_forever() {
        let rig = Rig::start();
        rig.handle.play_ambient(AmbientSelection::Fireplace).await.unwrap();

        for _ in 0..3 {
            rig.looper.trigger_end();
            rig.settle().await;
        }
        assert_eq!(rig.looper.restarts(), 3);

        rig.handle.stop_ambient().await.unwrap();
        rig.looper.trigger_end();
        rig.settle().await;
        assert_eq!(rig.looper.restarts(), 3);

        rig.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn none_selection_stops_the_loop() {
        let rig = Rig::start();
        rig.handle.play_ambient(AmbientSelection::Night).await.unwrap();
        rig.handle.play_ambient(AmbientSelection::None).await.unwrap();

        assert_eq!(rig.handle.ambient_status().selection, AmbientSelection::None);
        assert!(!rig.looper.is_looping());

        rig.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stopping_the_story_keeps_ambient_running() {
        let rig = Rig::start();
        rig.handle.play_ambient(AmbientSelection::WhiteNoise).await.unwrap();
        rig.play(rig.story("story.mp3", 60.0)).await;

        rig.handle.stop_story_audio_only().await.unwrap();

        let snapshot = rig.handle.snapshot();
        assert_eq!(snapshot.phase, PlaybackPhase::Idle);
        assert_eq!(snapshot.session, None);
        assert_eq!(rig.ambient_volume(), 0.3);
        assert_eq!(rig.looper.starts().len(), 1);
        assert_eq!(rig.looper.stops(), 0);
        assert!(rig.looper.is_looping());

        rig.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn audio_session_follows_active_streams() {
        let rig = Rig::start();

        rig.play(rig.story("story.mp3", 60.0)).await;
        rig.handle.play_ambient(AmbientSelection::Rain).await.unwrap();
        assert_eq!(
            rig.session.configured_modes(),
            vec![OutputMode::Exclusive, OutputMode::Mixed]
        );

        rig.handle.stop_story_audio_only().await.unwrap();
        assert_eq!(rig.session.deactivations(), 0);

        rig.handle.stop_ambient().await.unwrap();
        assert_eq!(rig.session.deactivations(), 1);

        rig.shutdown().await;
    }
}

mod sleep_timer {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_pauses() {
        let rig = Rig::start();
        rig.play(rig.story("story.mp3", 3600.0)).await;

        rig.handle.set_sleep_timer(60.0).await.unwrap();
        rig.handle.cancel_sleep_timer().await.unwrap();
        rig.handle.cancel_sleep_timer().await.unwrap();
        assert!(rig.handle.snapshot().sleep_timer.is_none());

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(rig.narrated.pauses(), 0);
        assert!(rig.handle.snapshot().state.is_playing);

        rig.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_replaces_the_pending_timer() {
        let rig = Rig::start();
        rig.play(rig.story("story.mp3", 3600.0)).await;

        rig.handle.set_sleep_timer(30.0).await.unwrap();
        rig.handle.set_sleep_timer(90.0).await.unwrap();

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(rig.handle.snapshot().state.is_playing);

        rig.wait_until(|s| !s.state.is_playing).await;
        assert_eq!(rig.narrated.pauses(), 1);

        rig.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_range_seconds_are_clamped() {
        let rig = Rig::start();

        assert_eq!(rig.handle.set_sleep_timer(-5.0).await.unwrap().duration_seconds, 0.0);
        assert_eq!(
            rig.handle
                .set_sleep_timer(1_000_000.0)
                .await
                .unwrap()
                .duration_seconds,
            86_400.0
        );
        assert_eq!(rig.handle.set_sleep_timer(f64::NAN).await.unwrap().duration_seconds, 0.0);

        rig.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn firing_without_narration_only_clears_the_timer() {
        let rig = Rig::start();
        let mut events = rig.handle.subscribe_events();

        rig.handle.set_sleep_timer(5.0).await.unwrap();
        rig.wait_until(|s| s.sleep_timer.is_none()).await;

        assert_eq!(events.recv().await.unwrap(), PlaybackEvent::SleepTimerFired);
        assert_eq!(rig.narrated.pauses(), 0);

        rig.shutdown().await;
    }
}

mod interruptions {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn interruption_pauses_and_resumes() {
        let rig = Rig::start();
        rig.play(rig.story("story.mp3", 600.0)).await;

        rig.handle.handle_interruption(AudioInterruption::Began).await.unwrap();
        assert_eq!(rig.handle.snapshot().phase, PlaybackPhase::Paused);

        rig.handle
            .handle_interruption(AudioInterruption::Ended { should_resume: true })
            .await
            .unwrap();
        assert_eq!(rig.handle.snapshot().phase, PlaybackPhase::Playing);

        rig.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn user_pause_is_not_undone_by_interruption_end() {
        let rig = Rig::start();
        rig.play(rig.story("story.mp3", 600.0)).await;

        rig.handle.pause().await.unwrap();
        rig.handle.handle_interruption(AudioInterruption::Began).await.unwrap();
        rig.handle
            .handle_interruption(AudioInterruption::Ended { should_resume: true })
            .await
            .unwrap();
        assert_eq!(rig.handle.snapshot().phase, PlaybackPhase::Paused);

        rig.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn platform_may_veto_resume() {
        let rig = Rig::start();
        rig.play(rig.story("story.mp3", 600.0)).await;

        rig.handle.handle_interruption(AudioInterruption::Began).await.unwrap();
        rig.handle
            .handle_interruption(AudioInterruption::Ended {
                should_resume: false,
            })
            .await
            .unwrap();
        assert_eq!(rig.handle.snapshot().phase, PlaybackPhase::Paused);

        rig.shutdown().await;
    }
}

mod lifecycle {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_everything() {
        let rig = Rig::start();
        rig.handle.play_ambient(AmbientSelection::Ocean).await.unwrap();
        rig.play(rig.story("story.mp3", 60.0)).await;
        rig.handle.set_sleep_timer(30.0).await.unwrap();

        let handle = rig.handle.clone();
        let looper = rig.looper.clone();
        let session = rig.session.clone();
        rig.shutdown().await;

        assert!(!looper.is_looping());
        assert_eq!(session.deactivations(), 1);
        assert!(!handle.is_running());
        assert!(matches!(
            handle.pause().await,
            Err(PlaybackError::CoordinatorClosed)
        ));
    }
}
