//! Line-oriented control shell
//!
//! Each input line is split with shell quoting rules and parsed as one clap
//! subcommand, which maps to one coordinator operation. Results are printed
//! to stdout; coordinator errors are reported and the shell keeps going.

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use lull_core::{AmbientSelection, AudioSource};
use lull_playback::{
    AmbientStatus, CoordinatorHandle, NarratedRequest, PlaybackEvent, PlaybackSnapshot,
    TransportCommand,
};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::broadcast;

use crate::surfaces::LoggingNowPlaying;

#[derive(Parser)]
#[command(
    name = "lull",
    disable_version_flag = true,
    help_template = "commands:\n{subcommands}"
)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

/// One parsed shell line
#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum ShellCommand {
    /// Start narration from a file (quote arguments with spaces)
    Play {
        path: PathBuf,
        /// Defaults to the file name
        title: Option<String>,
        voice: Option<String>,
    },
    /// Pause narration
    Pause,
    /// Resume narration
    Resume,
    /// Pause or resume
    Toggle,
    /// Jump to a position in seconds
    Seek {
        #[arg(allow_negative_numbers = true)]
        seconds: f64,
    },
    /// Skip ahead (default 15 s)
    #[command(visible_alias = "fwd")]
    Forward {
        #[arg(allow_negative_numbers = true)]
        seconds: Option<f64>,
    },
    /// Skip back (default 15 s)
    #[command(visible_alias = "backward")]
    Back {
        #[arg(allow_negative_numbers = true)]
        seconds: Option<f64>,
    },
    /// Set the playback rate (0.5 - 4.0)
    Rate {
        #[arg(allow_negative_numbers = true)]
        rate: f64,
    },
    /// Switch the soundscape: rain, ocean, nature, fireplace, white-noise, night or none
    Ambient {
        #[arg(value_parser = parse_selection)]
        selection: AmbientSelection,
    },
    /// Pause narration after a delay in seconds, or `cancel`
    Sleep {
        #[arg(value_parser = parse_sleep, allow_negative_numbers = true)]
        delay: SleepDelay,
    },
    /// Press a media key
    Key {
        #[arg(value_enum)]
        key: MediaKey,
    },
    /// Stop narration, keep the soundscape
    Stop,
    /// Show both streams
    Status,
    /// Leave the shell
    #[command(visible_alias = "exit")]
    Quit,
}

/// Argument of `sleep`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SleepDelay {
    Seconds(f64),
    Cancel,
}

/// Hardware media keys the shell can simulate
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MediaKey {
    Play,
    Pause,
    Toggle,
    Fwd,
    Back,
}

impl From<MediaKey> for TransportCommand {
    fn from(key: MediaKey) -> Self {
        match key {
            MediaKey::Play => TransportCommand::Play,
            MediaKey::Pause => TransportCommand::Pause,
            MediaKey::Toggle => TransportCommand::TogglePlayPause,
            MediaKey::Fwd => TransportCommand::SkipForward(None),
            MediaKey::Back => TransportCommand::SkipBackward(None),
        }
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("error: unterminated quote or escape")]
    Quoting,

    #[error(transparent)]
    Command(#[from] clap::Error),
}

fn parse_selection(arg: &str) -> Result<AmbientSelection, String> {
    AmbientSelection::parse(arg).ok_or_else(|| format!("unknown soundscape: {}", arg))
}

fn parse_sleep(arg: &str) -> Result<SleepDelay, String> {
    match arg {
        "cancel" | "off" => Ok(SleepDelay::Cancel),
        seconds => seconds
            .parse()
            .map(SleepDelay::Seconds)
            .map_err(|_| format!("expected seconds or cancel, got {}", seconds)),
    }
}

/// Parse one input line; blank lines yield `None`
pub fn parse(line: &str) -> Result<Option<ShellCommand>, ParseError> {
    let mut args = shlex::split(line).ok_or(ParseError::Quoting)?;
    if args.is_empty() {
        return Ok(None);
    }
    args.insert(0, "lull".to_string());
    let line = ShellLine::try_parse_from(args)?;
    Ok(Some(line.command))
}

/// Command overview printed at startup
pub fn help() -> String {
    ShellLine::command().render_help().to_string()
}

/// One-line summary of both streams
pub fn render_status(snapshot: &PlaybackSnapshot, ambient: &AmbientStatus) -> String {
    let mut line = match (&snapshot.session, &snapshot.title) {
        (Some(session), Some(title)) => format!(
            "{} {} \"{}\" ({}) {:.1}/{:.1}s at {:.2}x",
            snapshot.phase,
            session,
            title,
            snapshot.subtitle(),
            snapshot.state.current_time,
            snapshot.state.duration,
            snapshot.state.rate,
        ),
        _ => format!("{} at {:.2}x", snapshot.phase, snapshot.state.rate),
    };

    if ambient.selection.is_none() {
        line.push_str(" | ambient off");
    } else {
        line.push_str(&format!(
            " | ambient {} @ {:.2}",
            ambient.selection.as_str(),
            ambient.volume
        ));
    }

    if let Some(timer) = &snapshot.sleep_timer {
        line.push_str(&format!(" | sleep in {:.0}s", timer.remaining_seconds()));
    }

    line
}

/// Printable form of a coordinator event
pub fn describe(event: &PlaybackEvent) -> String {
    match event {
        PlaybackEvent::Error { kind, message } => format!("error ({:?}): {}", kind, message),
        PlaybackEvent::NarratedFinished { session } => format!("narration {} finished", session),
        PlaybackEvent::SleepTimerFired => "sleep timer fired, narration paused".to_string(),
        PlaybackEvent::SessionDegraded { message } => {
            format!("audio session degraded: {}", message)
        }
    }
}

/// Print coordinator events until the coordinator goes away
pub async fn print_events(mut events: broadcast::Receiver<PlaybackEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => println!("{}", describe(&event)),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event printer lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

pub struct Shell {
    handle: CoordinatorHandle,
    media_keys: Arc<LoggingNowPlaying>,
}

impl Shell {
    pub fn new(handle: CoordinatorHandle, media_keys: Arc<LoggingNowPlaying>) -> Self {
        Self { handle, media_keys }
    }

    /// Read commands until `quit` or end of input
    pub async fn run<R: AsyncBufRead + Unpin>(&self, input: R) -> std::io::Result<()> {
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            match parse(&line) {
                Ok(None) => {}
                Ok(Some(ShellCommand::Quit)) => break,
                Ok(Some(command)) => {
                    if let Err(e) = self.execute(command).await {
                        println!("error: {}", e);
                    }
                }
                Err(e) => println!("{}", e.to_string().trim_end()),
            }
        }
        Ok(())
    }

    async fn execute(&self, command: ShellCommand) -> lull_playback::Result<()> {
        match command {
            ShellCommand::Play { path, title, voice } => {
                let title = title.unwrap_or_else(|| {
                    path.file_stem()
                        .map(|stem| stem.to_string_lossy().into_owned())
                        .unwrap_or_default()
                });
                let request = NarratedRequest::new(
                    AudioSource::local(path),
                    title,
                    voice.unwrap_or_default(),
                );
                let session = self.handle.play_narrated(request).await?;
                println!("loading {}", session);
            }
            ShellCommand::Pause => self.handle.pause().await?,
            ShellCommand::Resume => self.handle.resume().await?,
            ShellCommand::Toggle => {
                let playing = self.handle.toggle_play_pause().await?;
                println!("{}", if playing { "playing" } else { "paused" });
            }
            ShellCommand::Seek { seconds } => {
                println!("at {:.1}s", self.handle.seek(seconds).await?);
            }
            ShellCommand::Forward { seconds } => {
                println!("at {:.1}s", self.handle.skip_forward(seconds).await?);
            }
            ShellCommand::Back { seconds } => {
                println!("at {:.1}s", self.handle.skip_backward(seconds).await?);
            }
            ShellCommand::Rate { rate } => {
                println!("rate {:.2}x", self.handle.set_rate(rate).await?);
            }
            ShellCommand::Ambient {
                selection: AmbientSelection::None,
            } => self.handle.stop_ambient().await?,
            ShellCommand::Ambient { selection } => self.handle.play_ambient(selection).await?,
            ShellCommand::Sleep {
                delay: SleepDelay::Seconds(seconds),
            } => {
                let timer = self.handle.set_sleep_timer(seconds).await?;
                println!("sleeping in {:.0}s", timer.duration_seconds);
            }
            ShellCommand::Sleep {
                delay: SleepDelay::Cancel,
            } => self.handle.cancel_sleep_timer().await?,
            ShellCommand::Key { key } => match self.media_keys.press(key.into()) {
                Some(status) => println!("{:?}", status),
                None => println!("media keys are not registered"),
            },
            ShellCommand::Stop => self.handle.stop_story_audio_only().await?,
            ShellCommand::Status => println!(
                "{}",
                render_status(&self.handle.snapshot(), &self.handle.ambient_status())
            ),
            ShellCommand::Quit => {}
        }
        Ok(())
    }
}
