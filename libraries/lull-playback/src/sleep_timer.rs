//! Sleep timer
//!
//! One-shot, cancellable delay that pauses narration. Firing is delivered as
//! a generation-tagged notification; a notification from a cancelled or
//! replaced schedule carries an old generation and is ignored.

use std::time::Duration;
use tokio::time::Instant;

use crate::events::{Notification, NotificationSender};
use crate::subscription::Subscription;
use crate::types::SleepTimerState;

/// Longest accepted delay (24 hours)
pub const MAX_SLEEP_SECONDS: f64 = 86_400.0;

/// Clamp a requested delay into `[0, MAX_SLEEP_SECONDS]` (NaN becomes 0)
pub fn clamp_sleep_seconds(seconds: f64) -> f64 {
    if seconds.is_nan() {
        0.0
    } else {
        seconds.clamp(0.0, MAX_SLEEP_SECONDS)
    }
}

/// At most one armed schedule
#[derive(Debug, Default)]
pub(crate) struct SleepTimer {
    generation: u64,
    armed: Option<(SleepTimerState, Subscription)>,
}

impl SleepTimer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Arm the timer, replacing any pending schedule
    pub(crate) fn arm(
        &mut self,
        seconds: f64,
        notifications: &NotificationSender,
    ) -> SleepTimerState {
        self.cancel();

        let seconds = clamp_sleep_seconds(seconds);
        let generation = self.generation;
        let state = SleepTimerState {
            duration_seconds: seconds,
            scheduled_at: Instant::now(),
        };

        let tx = notifications.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs_f64(seconds)).await;
            let _ = tx.send(Notification::SleepTimerFired { generation });
        });

        tracing::debug!(seconds, generation, "Sleep timer armed");
        self.armed = Some((state, Subscription::new(handle)));
        state
    }

    /// Invalidate the pending schedule, if any
    pub(crate) fn cancel(&mut self) {
        self.generation += 1;
        if self.armed.take().is_some() {
            tracing::debug!("Sleep timer cancelled");
        }
    }

    /// Consume a fire notification
    ///
    /// Returns `true` only for the current schedule; the timer is cleared.
    pub(crate) fn take_fired(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.armed.is_none() {
            return false;
        }
        self.armed = None;
        self.generation += 1;
        true
    }

    pub(crate) fn state(&self) -> Option<SleepTimerState> {
        self.armed.as_ref().map(|(state, _)| *state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn clamps_seconds() {
        assert_eq!(clamp_sleep_seconds(-5.0), 0.0);
        assert_eq!(clamp_sleep_seconds(f64::NAN), 0.0);
        assert_eq!(clamp_sleep_seconds(100_000.0), MAX_SLEEP_SECONDS);
        assert_eq!(clamp_sleep_seconds(300.0), 300.0);
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = SleepTimer::new();

        let state = timer.arm(300.0, &tx);
        assert_eq!(state.duration_seconds, 300.0);
        assert_eq!(timer.state(), Some(state));

        tokio::time::sleep(Duration::from_secs(299)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_secs(2)).await;
        let generation = match rx.recv().await {
            Some(Notification::SleepTimerFired { generation }) => generation,
            other => panic!("unexpected notification: {other:?}"),
        };

        assert!(timer.take_fired(generation));
        assert_eq!(timer.state(), None);
        assert!(!timer.take_fired(generation));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_firing() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = SleepTimer::new();

        timer.arm(10.0, &tx);
        timer.cancel();
        timer.cancel();
        assert_eq!(timer.state(), None);

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_replaces_previous_schedule() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = SleepTimer::new();

        timer.arm(10.0, &tx);
        timer.arm(30.0, &tx);

        tokio::time::sleep(Duration::from_secs(15)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_secs(20)).await;
        match rx.recv().await {
            Some(Notification::SleepTimerFired { generation }) => {
                assert!(timer.take_fired(generation));
            }
            other => panic!("unexpected notification: {other:?}"),
        }
    }

    #[test]
    fn stale_generation_is_ignored() {
        let mut timer = SleepTimer::new();
        assert!(!timer.take_fired(0));
    }
}
