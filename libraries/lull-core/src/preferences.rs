//! Preference storage
//!
//! Small key-value store for user preferences. Values are JSON so callers can
//! persist scalars and structs alike. Two backends are provided:
//! - [`JsonFileStore`]: a single pretty-printed JSON file, written atomically
//! - [`MemoryStore`]: process-local map, used by tests and headless runs

use crate::error::{LullError, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Persistent key-value store for preferences
pub trait PreferenceStore: Send + Sync {
    /// Read a value, `None` if the key was never written
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Write a value and persist it
    fn set(&self, key: &str, value: Value) -> Result<()>;
}

/// Preferences kept in one JSON file
///
/// The whole map is cached in memory and flushed on every `set` through a
/// temporary file and a rename, so a crash never leaves a half-written file.
pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl JsonFileStore {
    /// File name used inside a data directory
    pub const FILE_NAME: &'static str = "preferences.json";

    /// Open the store in `dir`, creating the directory if needed
    pub fn open_in(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Self::open(dir.join(Self::FILE_NAME))
    }

    /// Open a store backed by `path`
    ///
    /// A missing file is an empty store. A corrupt file is logged and treated
    /// as empty; it is overwritten on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let values = if path.exists() {
            let content = fs::read_to_string(&path)?;
            match serde_json::from_str::<Map<String, Value>>(&content) {
                Ok(values) => {
                    tracing::debug!(
                        path = %path.display(),
                        keys = values.len(),
                        "Loaded preferences"
                    );
                    values
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        "Failed to parse preferences: {}. Using defaults.",
                        e
                    );
                    Map::new()
                }
            }
        } else {
            tracing::info!(path = %path.display(), "No preferences file found, using defaults");
            Map::new()
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, values: &Map<String, Value>) -> Result<()> {
        let content = serde_json::to_string_pretty(values)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl PreferenceStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let values = self
            .values
            .lock()
            .map_err(|_| LullError::storage("preference cache poisoned"))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| LullError::storage("preference cache poisoned"))?;
        values.insert(key.to_string(), value);
        self.flush(&values)
    }
}

/// In-memory preference store
///
/// Counts writes so callers can verify persistence behaviour.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<Map<String, Value>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with one key
    pub fn with_value(key: &str, value: Value) -> Self {
        let store = Self::new();
        if let Ok(mut values) = store.values.lock() {
            values.insert(key.to_string(), value);
        }
        store
    }

    /// Number of successful `set` calls
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let values = self
            .values
            .lock()
            .map_err(|_| LullError::storage("preference cache poisoned"))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| LullError::storage("preference cache poisoned"))?;
        values.insert(key.to_string(), value);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
