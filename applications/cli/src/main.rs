/// Lull - headless narrated playback with an ambient soundscape
use anyhow::Context;
use clap::Parser;
use lull_core::JsonFileStore;
use lull_playback::{AmbientRegistry, CoordinatorBuilder};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod engine;
mod shell;
mod surfaces;

use crate::config::CliConfig;
use crate::engine::{SilentLoopEngine, SilentNarratedEngine};
use crate::shell::Shell;
use crate::surfaces::{LoggingLiveActivity, LoggingNowPlaying, LoggingSession};

#[derive(Parser)]
#[command(name = "lull")]
#[command(about = "Play narrated stories over an ambient soundscape", long_about = None)]
struct Cli {
    /// Configuration file path (default: ./lull.toml if present)
    #[arg(short, long, env = "LULL_CONFIG")]
    config: Option<PathBuf>,

    /// Directory for the preferences file
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Directory holding the ambient loops
    #[arg(long)]
    assets_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config =
        CliConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(assets_dir) = cli.assets_dir {
        config.assets_dir = assets_dir;
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Lull");
    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!("Assets directory: {}", config.assets_dir.display());

    let preferences = JsonFileStore::open_in(&config.data_dir).with_context(|| {
        format!(
            "Failed to open preferences in {}",
            config.data_dir.display()
        )
    })?;

    let registry = AmbientRegistry::load(&config.assets_dir).with_context(|| {
        format!(
            "Ambient assets incomplete in {} (expected {})",
            config.assets_dir.display(),
            AmbientRegistry::file_names().collect::<Vec<_>>().join(", ")
        )
    })?;

    let now_playing = Arc::new(LoggingNowPlaying::new());
    let runtime = CoordinatorBuilder::new()
        .config(config.playback.clone())
        .with_session_api(Arc::new(LoggingSession))
        .with_narrated_engine(Arc::new(SilentNarratedEngine::new()))
        .with_loop_engine(Arc::new(SilentLoopEngine::new()))
        .with_registry(registry)
        .with_preferences(Arc::new(preferences))
        .with_now_playing(now_playing.clone())
        .with_live_activity(Arc::new(LoggingLiveActivity::new()))
        .spawn()?;

    let handle = runtime.handle();
    let printer = tokio::spawn(shell::print_events(handle.subscribe_events()));

    println!("{}", shell::help());
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let result = Shell::new(handle, now_playing).run(stdin).await;

    runtime.shutdown().await;
    printer.abort();
    tracing::info!("Lull stopped");

    result.context("Failed to read commands")
}
