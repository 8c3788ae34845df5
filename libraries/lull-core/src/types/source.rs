//! Resolved narrated audio sources
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Handle to narrated audio that has already been generated
///
/// Speech generation happens upstream; by the time a source reaches the
/// coordinator it is either downloaded bytes on disk or a remote location the
/// platform player can stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AudioSource {
    /// Downloaded audio file
    Local {
        /// File on disk
        path: PathBuf,
    },

    /// Remote audio location
    Remote {
        /// Location the platform player streams from
        url: String,
    },
}

impl AudioSource {
    /// Create a local file source
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self::Local { path: path.into() }
    }

    /// Create a remote source
    pub fn remote(url: impl Into<String>) -> Self {
        Self::Remote { url: url.into() }
    }

    /// Local path, if this is a downloaded file
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Local { path } => Some(path),
            Self::Remote { .. } => None,
        }
    }

    /// Whether the referenced bytes can be handed to a player right now
    ///
    /// Remote sources are resolved by the platform player, so only local
    /// files are checked.
    #[must_use]
    pub fn is_available(&self) -> bool {
        match self {
            Self::Local { path } => path.is_file(),
            Self::Remote { url } => !url.trim().is_empty(),
        }
    }
}

impl std::fmt::Display for AudioSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local { path } => write!(f, "{}", path.display()),
            Self::Remote { url } => write!(f, "{}", url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_local_file_is_unavailable() {
        let source = AudioSource::local("/definitely/not/here/story.mp3");
        assert!(!source.is_available());
        assert!(source.path().is_some());
    }

    #[test]
    fn existing_local_file_is_available() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let source = AudioSource::local(file.path());
        assert!(source.is_available());
    }

    #[test]
    fn remote_source_requires_a_location() {
        assert!(AudioSource::remote("https://cdn.example.com/a.mp3").is_available());
        assert!(!AudioSource::remote("   ").is_available());
        assert!(AudioSource::remote("x").path().is_none());
    }
}
