/// Player configuration
use lull_playback::CoordinatorConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "lull.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CliConfig {
    /// Directory holding the preferences file
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory holding the bundled ambient loops
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,

    /// Log filter used when `RUST_LOG` is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    #[serde(default)]
    pub playback: CoordinatorConfig,
}

impl CliConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; the default `lull.toml` is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        Self::load_with_env(path, environment())
    }

    fn load_with_env(
        path: Option<&Path>,
        env: config::Environment,
    ) -> Result<Self, config::ConfigError> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path).required(true));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings.add_source(env).build()?.try_deserialize()
    }
}

/// `LULL_DATA_DIR`, `LULL_PLAYBACK__SKIP_INTERVAL_SECS`, ...
fn environment() -> config::Environment {
    config::Environment::with_prefix("LULL")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

// Default values
fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("./assets")
}

fn default_log_filter() -> String {
    "lull=info,lull_playback=info".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            assets_dir: default_assets_dir(),
            log_filter: default_log_filter(),
            playback: CoordinatorConfig::default(),
        }
    }
}
