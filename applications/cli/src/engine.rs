//! Headless audio engines
//!
//! The terminal player produces no sound. Narration advances a virtual clock
//! at the current rate, so positions, skips and end-of-stream behave as they
//! would on a device. Durations come from probing the file with symphonia.

use async_trait::async_trait;
use lull_core::AudioSource;
use lull_playback::{
    EndOfStream, LoopEngine, MediaInfo, NarratedEngine, PlaybackError, Result,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tokio::task::JoinHandle;
use tokio::time::Instant;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Read the duration of an audio file from its container headers
///
/// Returns NaN when the container does not carry enough information; the
/// coordinator rejects that as an invalid duration.
pub fn probe_duration(path: &Path) -> Result<f64> {
    let file = std::fs::File::open(path)
        .map_err(|e| PlaybackError::source_unavailable(format!("{}: {}", path.display(), e)))?;
    let mss = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| PlaybackError::decode_failed(e.to_string()))?;

    let track = probed
        .format
        .default_track()
        .ok_or_else(|| PlaybackError::decode_failed("no playable track"))?;
    let params = &track.codec_params;

    let duration = match (params.n_frames, params.time_base, params.sample_rate) {
        (Some(frames), Some(time_base), _) => {
            let time = time_base.calc_time(frames);
            time.seconds as f64 + time.frac
        }
        (Some(frames), None, Some(rate)) if rate > 0 => frames as f64 / f64::from(rate),
        _ => f64::NAN,
    };

    Ok(duration)
}

// ===== Narrated =====

#[derive(Debug, Default)]
struct Clock {
    loaded: bool,
    duration: f64,
    /// Position at `started`, or the paused position
    anchor: f64,
    started: Option<Instant>,
    rate: f64,
}

impl Clock {
    fn position(&self) -> f64 {
        let running = self
            .started
            .map_or(0.0, |started| started.elapsed().as_secs_f64() * self.rate);
        (self.anchor + running).min(self.duration)
    }

    /// Fold elapsed time into the anchor so rate or position can change
    fn rebase(&mut self) {
        self.anchor = self.position();
        if self.started.is_some() {
            self.started = Some(Instant::now());
        }
    }
}

/// Narrated engine that keeps time without producing output
#[derive(Debug)]
pub struct SilentNarratedEngine {
    clock: Mutex<Clock>,
}

impl SilentNarratedEngine {
    pub fn new() -> Self {
        Self {
            clock: Mutex::new(Clock {
                rate: 1.0,
                ..Clock::default()
            }),
        }
    }
}

impl Default for SilentNarratedEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NarratedEngine for SilentNarratedEngine {
    async fn load(&self, source: &AudioSource) -> Result<MediaInfo> {
        let path = source
            .path()
            .map(Path::to_path_buf)
            .ok_or_else(|| PlaybackError::decode_failed("remote sources need a streaming engine"))?;

        let duration = tokio::task::spawn_blocking(move || probe_duration(&path))
            .await
            .map_err(|e| PlaybackError::engine(e.to_string()))??;

        let mut clock = lock(&self.clock);
        let rate = clock.rate;
        *clock = Clock {
            loaded: true,
            duration,
            rate,
            ..Clock::default()
        };
        tracing::debug!(source = %source, duration, "Probed narrated source");

        Ok(MediaInfo { duration })
    }

    fn play(&self) -> Result<()> {
        let mut clock = lock(&self.clock);
        if !clock.loaded {
            return Err(PlaybackError::engine("nothing loaded"));
        }
        if clock.started.is_none() {
            clock.started = Some(Instant::now());
        }
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        let mut clock = lock(&self.clock);
        clock.anchor = clock.position();
        clock.started = None;
        Ok(())
    }

    fn seek(&self, position: f64) -> Result<()> {
        let mut clock = lock(&self.clock);
        clock.rebase();
        clock.anchor = position.clamp(0.0, clock.duration.max(0.0));
        Ok(())
    }

    fn set_rate(&self, rate: f64) -> Result<()> {
        let mut clock = lock(&self.clock);
        clock.rebase();
        clock.rate = rate;
        Ok(())
    }

    fn position(&self) -> f64 {
        let clock = lock(&self.clock);
        if clock.loaded {
            clock.position()
        } else {
            0.0
        }
    }

    fn is_finished(&self) -> bool {
        let clock = lock(&self.clock);
        clock.loaded && clock.position() >= clock.duration
    }

    fn stop(&self) {
        let mut clock = lock(&self.clock);
        let rate = clock.rate;
        *clock = Clock {
            rate,
            ..Clock::default()
        };
    }
}

// ===== Ambient =====

#[derive(Default)]
struct Loop {
    asset: Option<PathBuf>,
    length: Option<Duration>,
    on_end: Option<Arc<EndOfStream>>,
    timer: Option<JoinHandle<()>>,
}

impl Loop {
    /// Schedule the next end-of-stream for assets with a known length
    fn arm(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        let (Some(length), Some(on_end)) = (self.length, self.on_end.clone()) else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        self.timer = Some(runtime.spawn(async move {
            tokio::time::sleep(length).await;
            (*on_end)();
        }));
    }
}

/// Loop engine that tracks the ambient asset and volume without output
///
/// Assets whose length can be probed report end-of-stream after that length,
/// so the looping path is exercised; placeholders simply never end.
#[derive(Default)]
pub struct SilentLoopEngine {
    state: Mutex<Loop>,
}

impl SilentLoopEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asset currently looping
    #[cfg(test)]
    pub fn asset(&self) -> Option<PathBuf> {
        lock(&self.state).asset.clone()
    }
}

impl LoopEngine for SilentLoopEngine {
    fn start(&self, asset: &Path, volume: f32, on_end: EndOfStream) -> Result<()> {
        let length = probe_duration(asset)
            .ok()
            .filter(|d| d.is_finite() && *d > 0.0)
            .map(Duration::from_secs_f64);
        tracing::info!(asset = %asset.display(), volume, ?length, "Ambient loop started");

        let mut state = lock(&self.state);
        state.asset = Some(asset.to_path_buf());
        state.length = length;
        state.on_end = Some(Arc::new(on_end));
        state.arm();
        Ok(())
    }

    fn restart(&self) -> Result<()> {
        let mut state = lock(&self.state);
        if state.asset.is_none() {
            return Err(PlaybackError::engine("no ambient asset to restart"));
        }
        tracing::debug!("Ambient loop restarted");
        state.arm();
        Ok(())
    }

    fn set_volume(&self, volume: f32) {
        tracing::debug!(volume, "Ambient volume");
    }

    fn stop(&self) {
        let mut state = lock(&self.state);
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        if state.asset.take().is_some() {
            tracing::info!("Ambient loop stopped");
        }
        state.length = None;
        state.on_end = None;
    }
}
