// SPDX-License-Identifier: MPL-2.0
//! FFmpeg-backed media engine.
//!
//! Preparation opens the container off-thread (FFmpeg contexts are not
//! `Send`, so the probe runs on a blocking task) and reports stream
//! properties back through a channel, which the owner drains on the
//! consumer thread via `poll_event`. Playback position is tracked with a
//! [`PlaybackClock`]; the decode/render pipeline proper is outside this
//! crate's scope.

use std::path::{Path, PathBuf};
use std::sync::Once;

use tokio::sync::mpsc;

use super::clock::PlaybackClock;
use super::{EngineEvent, MediaEngine};
use crate::error::{Error, Result};
use crate::surface::Surface;

/// Engine error code: the container could not be opened.
pub const ERROR_OPEN_FAILED: i32 = 1;
/// Engine error code: the container has no video stream.
pub const ERROR_NO_VIDEO_STREAM: i32 = 2;
/// Engine error code: the codec context could not be created.
pub const ERROR_DECODER_SETUP: i32 = 3;
/// Engine error code: the stream reported unusable dimensions.
pub const ERROR_BAD_DIMENSIONS: i32 = 4;

/// Static flag to ensure FFmpeg is initialized only once.
static FFMPEG_INIT: Once = Once::new();

/// Initialize FFmpeg with appropriate log level.
///
/// Safe to call multiple times — initialization happens once. The FFmpeg
/// log level is set to ERROR to suppress container warnings.
fn init_ffmpeg() -> Result<()> {
    let mut init_result: Result<()> = Ok(());

    FFMPEG_INIT.call_once(|| {
        if let Err(e) = ffmpeg_next::init() {
            init_result = Err(Error::Source(format!("FFmpeg initialization failed: {e}")));
            return;
        }

        // SAFETY: av_log_set_level is thread-safe and only affects logging
        unsafe {
            ffmpeg_next::ffi::av_log_set_level(ffmpeg_next::ffi::AV_LOG_ERROR);
        }
    });

    init_result
}

/// Stream properties discovered by the probe.
struct ProbeOutcome {
    width: u32,
    height: u32,
    duration_ms: u32,
}

/// Opens the container and extracts dimensions and duration without
/// decoding frames.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn probe(path: &Path) -> std::result::Result<ProbeOutcome, (i32, i32)> {
    if init_ffmpeg().is_err() {
        return Err((ERROR_OPEN_FAILED, 0));
    }

    let ictx = ffmpeg_next::format::input(&path).map_err(|e| match e {
        ffmpeg_next::Error::Other { errno } => (ERROR_OPEN_FAILED, errno),
        _ => (ERROR_OPEN_FAILED, 0),
    })?;

    let video_stream = ictx
        .streams()
        .best(ffmpeg_next::media::Type::Video)
        .ok_or((ERROR_NO_VIDEO_STREAM, 0))?;

    let context_decoder =
        ffmpeg_next::codec::context::Context::from_parameters(video_stream.parameters())
            .map_err(|_| (ERROR_DECODER_SETUP, 0))?;
    let decoder = context_decoder
        .decoder()
        .video()
        .map_err(|_| (ERROR_DECODER_SETUP, 1))?;

    let width = decoder.width();
    let height = decoder.height();
    if width == 0 || height == 0 {
        return Err((ERROR_BAD_DIMENSIONS, 0));
    }

    // Duration: prefer the stream's own time base, fall back to the
    // container duration.
    let duration_secs = if video_stream.duration() > 0 {
        let time_base = video_stream.time_base();
        video_stream.duration() as f64 * f64::from(time_base.numerator())
            / f64::from(time_base.denominator())
    } else if ictx.duration() > 0 {
        ictx.duration() as f64 / f64::from(ffmpeg_next::ffi::AV_TIME_BASE)
    } else {
        0.0
    };

    Ok(ProbeOutcome {
        width,
        height,
        duration_ms: (duration_secs * 1_000.0).max(0.0) as u32,
    })
}

/// FFmpeg-backed implementation of [`MediaEngine`].
///
/// Must live on a thread inside a Tokio runtime: `prepare_async` uses
/// `spawn_blocking` for the probe.
pub struct FfmpegEngine {
    source: Option<PathBuf>,
    clock: PlaybackClock,
    dimensions: (u32, u32),
    duration_ms: Option<u32>,
    /// Generation of the surface the engine currently renders into.
    display_target: Option<u64>,
    event_rx: Option<mpsc::UnboundedReceiver<EngineEvent>>,
    released: bool,
}

impl Default for FfmpegEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegEngine {
    /// Creates an engine with no source loaded.
    #[must_use]
    pub fn new() -> Self {
        Self {
            source: None,
            clock: PlaybackClock::new(),
            dimensions: (0, 0),
            duration_ms: None,
            display_target: None,
            event_rx: None,
            released: false,
        }
    }

    /// Generation of the surface currently attached, if any.
    #[must_use]
    pub fn display_target(&self) -> Option<u64> {
        self.display_target
    }
}

impl MediaEngine for FfmpegEngine {
    fn set_data_source(&mut self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(Error::Source(format!("Media file not found: {:?}", path)));
        }
        self.source = Some(path.to_path_buf());
        Ok(())
    }

    fn prepare_async(&mut self) {
        let Some(path) = self.source.clone() else {
            return;
        };

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        self.event_rx = Some(event_rx);

        // FFmpeg contexts are not Send, so probe on a blocking task.
        tokio::task::spawn_blocking(move || {
            let event = match probe(&path) {
                Ok(outcome) => EngineEvent::Prepared {
                    width: outcome.width,
                    height: outcome.height,
                    duration_ms: outcome.duration_ms,
                },
                Err((code, extra)) => EngineEvent::Error { code, extra },
            };
            let _ = event_tx.send(event);
        });
    }

    fn start(&mut self) {
        self.clock.play();
    }

    fn pause(&mut self) {
        self.clock.pause();
    }

    fn stop(&mut self) {
        self.clock.stop();
    }

    fn reset(&mut self) {
        self.clock.stop();
        self.source = None;
        self.dimensions = (0, 0);
        self.duration_ms = None;
        self.event_rx = None;
    }

    fn release(&mut self) {
        self.reset();
        self.display_target = None;
        self.released = true;
    }

    fn seek_to(&mut self, position_ms: u32) {
        let clamped = match self.duration_ms {
            Some(duration) => position_ms.min(duration),
            None => position_ms,
        };
        self.clock.seek_ms(clamped);
    }

    fn current_position(&self) -> u32 {
        self.clock.position_ms()
    }

    fn duration(&self) -> Option<u32> {
        self.duration_ms
    }

    fn video_width(&self) -> u32 {
        self.dimensions.0
    }

    fn video_height(&self) -> u32 {
        self.dimensions.1
    }

    fn set_display(&mut self, target: Option<&Surface>) {
        match target {
            Some(surface) if surface.is_valid() => {
                self.display_target = Some(surface.generation());
            }
            Some(_) => {
                // Invalid surfaces are ignored; validity is the caller's
                // point-of-use check, not a cached promise.
            }
            None => {
                self.display_target = None;
            }
        }
    }

    fn poll_event(&mut self) -> Option<EngineEvent> {
        if self.released {
            return None;
        }
        let event = self.event_rx.as_mut()?.try_recv().ok()?;
        if let EngineEvent::Prepared {
            width,
            height,
            duration_ms,
        } = event
        {
            self.dimensions = (width, height);
            self.duration_ms = Some(duration_ms);
        }
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_source() {
        let mut engine = FfmpegEngine::new();
        let result = engine.set_data_source(Path::new("/nonexistent/clip.mp4"));
        assert!(matches!(result, Err(Error::Source(_))));
    }

    #[test]
    fn accepts_existing_file_without_opening_it() {
        // Source validation is existence-only; the open happens in prepare.
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut engine = FfmpegEngine::new();
        assert!(engine.set_data_source(file.path()).is_ok());
    }

    #[tokio::test]
    async fn prepare_of_garbage_file_reports_engine_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"not a media container").unwrap();

        let mut engine = FfmpegEngine::new();
        engine.set_data_source(file.path()).unwrap();
        engine.prepare_async();

        let mut event = None;
        for _ in 0..100 {
            if let Some(e) = engine.poll_event() {
                event = Some(e);
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        assert!(matches!(
            event,
            Some(EngineEvent::Error {
                code: ERROR_OPEN_FAILED | ERROR_NO_VIDEO_STREAM,
                ..
            })
        ));
    }

    #[test]
    fn seek_is_clamped_to_duration() {
        let mut engine = FfmpegEngine::new();
        engine.duration_ms = Some(10_000);
        engine.seek_to(60_000);
        assert_eq!(engine.current_position(), 10_000);
    }

    #[test]
    fn display_attach_requires_valid_surface() {
        let mut engine = FfmpegEngine::new();
        let mut surface = Surface::new();

        engine.set_display(Some(&surface));
        assert_eq!(engine.display_target(), None);

        surface.mark_created();
        engine.set_display(Some(&surface));
        assert_eq!(engine.display_target(), Some(surface.generation()));

        engine.set_display(None);
        assert_eq!(engine.display_target(), None);
    }

    #[test]
    fn reset_clears_source_and_metadata() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut engine = FfmpegEngine::new();
        engine.set_data_source(file.path()).unwrap();
        engine.dimensions = (1920, 1080);
        engine.duration_ms = Some(5_000);

        engine.reset();
        assert_eq!(engine.video_width(), 0);
        assert_eq!(engine.duration(), None);
    }
}
