//! Lull Core
//!
//! Platform-agnostic core types, error handling and preference storage for Lull.
//!
//! This crate provides the building blocks shared by the playback coordinator
//! and the applications that host it.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `AudioSource`, `AmbientSelection`, `PlaybackState`,
//!   `NowPlayingMetadata`, `LiveActivityContent`, `OutputMode`
//! - **Preferences**: the `PreferenceStore` trait with a JSON file backend and
//!   an in-memory backend
//! - **Error Handling**: Unified `LullError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use lull_core::types::{clamp_rate, AmbientSelection, AudioSource, PlaybackState};
//!
//! let source = AudioSource::remote("https://cdn.example.com/story-42.mp3");
//! assert!(source.is_available());
//!
//! let state = PlaybackState::with_rate(clamp_rate(10.0));
//! assert_eq!(state.rate, 4.0);
//!
//! assert_eq!(AmbientSelection::parse("nature"), Some(AmbientSelection::Nature));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod preferences;
pub mod types;

// Re-export commonly used types
pub use error::{LullError, Result};
pub use preferences::{JsonFileStore, MemoryStore, PreferenceStore};

pub use types::{
    clamp_rate, AmbientSelection, AudioSource, LiveActivityContent, NowPlayingMetadata,
    OutputMode, PlaybackState, DEFAULT_RATE, MAX_RATE, MIN_RATE,
};
