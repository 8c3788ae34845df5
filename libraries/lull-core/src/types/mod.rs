//! Domain types shared by the coordinator and its hosts

mod ambient;
mod metadata;
mod playback_state;
mod session;
mod source;

pub use ambient::AmbientSelection;
pub use metadata::{LiveActivityContent, NowPlayingMetadata};
pub use playback_state::{clamp_rate, PlaybackState, DEFAULT_RATE, MAX_RATE, MIN_RATE};
pub use session::OutputMode;
pub use source::AudioSource;
