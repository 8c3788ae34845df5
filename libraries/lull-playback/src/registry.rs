//! Ambient asset registry
//!
//! Static table from soundscape to asset file. Validated once at startup so a
//! missing asset fails fast instead of on the first tap.

use lull_core::AmbientSelection;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{PlaybackError, Result};

/// Asset file for every playable selection
const AMBIENT_ASSETS: [(AmbientSelection, &str); 6] = [
    (AmbientSelection::Rain, "rain.m4a"),
    (AmbientSelection::Ocean, "ocean_waves.m4a"),
    (AmbientSelection::Nature, "forest_birds.m4a"),
    (AmbientSelection::Fireplace, "fireplace.m4a"),
    (AmbientSelection::WhiteNoise, "white_noise.m4a"),
    (AmbientSelection::Night, "night_crickets.m4a"),
];

/// Validated mapping from selection to asset path
#[derive(Debug, Clone)]
pub struct AmbientRegistry {
    root: PathBuf,
    assets: HashMap<AmbientSelection, PathBuf>,
}

impl AmbientRegistry {
    /// Build the registry for assets under `root`
    ///
    /// # Returns
    /// * `Ok(registry)` - Every playable selection has its asset on disk
    /// * `Err(AssetMissing)` - First selection whose file is absent
    pub fn load(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let mut assets = HashMap::with_capacity(AMBIENT_ASSETS.len());

        for (selection, file_name) in AMBIENT_ASSETS {
            let path = root.join(file_name);
            if !path.is_file() {
                return Err(PlaybackError::AssetMissing { selection, path });
            }
            assets.insert(selection, path);
        }

        tracing::debug!(root = %root.display(), count = assets.len(), "Ambient assets validated");
        Ok(Self { root, assets })
    }

    /// Asset path for `selection`, `None` for the "none" sentinel
    pub fn asset(&self, selection: AmbientSelection) -> Option<&Path> {
        self.assets.get(&selection).map(PathBuf::as_path)
    }

    /// File name expected for `selection`
    pub fn file_name(selection: AmbientSelection) -> Option<&'static str> {
        AMBIENT_ASSETS
            .iter()
            .find(|(s, _)| *s == selection)
            .map(|(_, name)| *name)
    }

    /// Every expected file name
    pub fn file_names() -> impl Iterator<Item = &'static str> {
        AMBIENT_ASSETS.iter().map(|(_, name)| *name)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
