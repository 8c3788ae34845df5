//! Playback Events
//!
//! Two kinds of messages flow around the coordinator:
//! - [`PlaybackEvent`]: one-shot signals broadcast to the UI layer (errors,
//!   narration finished, sleep timer fired)
//! - [`Notification`]: internal messages from players and timers, marshalled
//!   onto the coordination task before they may touch state

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::PlaybackError;
use crate::types::SessionId;

/// Events broadcast by the coordinator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// An operation failed; the subsystem will not retry
    Error {
        /// Failure category
        kind: FailureKind,
        /// Human readable description
        message: String,
    },

    /// Narration reached its end naturally
    NarratedFinished {
        /// Session that finished
        session: SessionId,
    },

    /// Sleep timer elapsed and paused narration
    SleepTimerFired,

    /// Audio session could not be configured; playback continues silently
    SessionDegraded {
        /// Platform error description
        message: String,
    },
}

impl PlaybackEvent {
    /// Build an error event from a playback error
    pub fn from_error(error: &PlaybackError) -> Self {
        Self::Error {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Failure categories surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    SourceUnavailable,
    DecodeFailed,
    InvalidDuration,
    SessionConfigurationFailed,
    InvalidState,
    AssetMissing,
    Internal,
}

/// Status and time notifications from the narrated player
#[derive(Debug)]
pub(crate) enum NarratedEvent {
    /// Source loaded with the reported duration in seconds
    Ready { duration: f64 },

    /// Source could not be loaded
    Failed(PlaybackError),

    /// Periodic position update in seconds
    Time { position: f64 },

    /// Playback reached the end of the source
    Finished,
}

/// Messages delivered to the coordination task by players and timers
#[derive(Debug)]
pub(crate) enum Notification {
    /// Narrated player notification, tagged with the session it belongs to
    Narrated {
        session: SessionId,
        event: NarratedEvent,
    },

    /// Ambient loop reached end of stream
    AmbientEnded { generation: u64 },

    /// Sleep timer deadline elapsed
    SleepTimerFired { generation: u64 },
}

pub(crate) type NotificationSender = mpsc::UnboundedSender<Notification>;
pub(crate) type NotificationReceiver = mpsc::UnboundedReceiver<Notification>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_event_carries_kind_and_message() {
        let event = PlaybackEvent::from_error(&PlaybackError::InvalidDuration(0.0));
        assert_eq!(
            event,
            PlaybackEvent::Error {
                kind: FailureKind::InvalidDuration,
                message: "Invalid duration: 0".to_string(),
            }
        );
    }

    #[test]
    fn failure_kind_serializes_snake_case() {
        let json = serde_json::to_string(&FailureKind::SourceUnavailable).unwrap();
        assert_eq!(json, "\"source_unavailable\"");
    }
}
