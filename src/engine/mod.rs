// SPDX-License-Identifier: MPL-2.0
//! Media decoding engine seam.
//!
//! The actual decode/render pipeline is an external capability; the crate
//! only depends on the contract below. Preparation is asynchronous: the
//! call returns immediately and completion arrives later as an
//! [`EngineEvent`] pulled by the owner via [`MediaEngine::poll_event`], so
//! all state transitions stay on the single consumer-facing thread.

pub mod clock;
pub mod ffmpeg;

use std::path::Path;

use crate::error::Result;
use crate::surface::Surface;

pub use clock::PlaybackClock;
pub use ffmpeg::FfmpegEngine;

/// Events emitted by the engine after asynchronous operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// Asynchronous preparation finished; the stream is ready to start.
    Prepared {
        width: u32,
        height: u32,
        duration_ms: u32,
    },

    /// The decode pipeline failed with an engine-defined pair.
    Error { code: i32, extra: i32 },
}

/// Contract of the media decoding engine.
///
/// The engine keeps its own internal lifecycle; the caller-visible state
/// machine lives in [`crate::player::Player`], which is responsible for
/// only invoking operations that are legal in its current state.
pub trait MediaEngine {
    /// Loads a data source. Fails if the engine rejects it.
    fn set_data_source(&mut self, path: &Path) -> Result<()>;

    /// Requests asynchronous preparation of the current source. Completion
    /// (or failure) is delivered later through [`MediaEngine::poll_event`].
    fn prepare_async(&mut self);

    /// Starts or resumes playback.
    fn start(&mut self);

    /// Pauses playback, keeping the current position.
    fn pause(&mut self);

    /// Stops playback.
    fn stop(&mut self);

    /// Returns the engine to its pristine state, dropping the source.
    fn reset(&mut self);

    /// Tears the engine down for good.
    fn release(&mut self);

    /// Jumps to the given position in milliseconds.
    fn seek_to(&mut self, position_ms: u32);

    /// Current playback position in milliseconds.
    fn current_position(&self) -> u32;

    /// Stream duration in milliseconds, once known.
    fn duration(&self) -> Option<u32>;

    /// Width of the prepared video stream (0 before preparation).
    fn video_width(&self) -> u32;

    /// Height of the prepared video stream (0 before preparation).
    fn video_height(&self) -> u32;

    /// Rebinds the rendering target. `None` detaches. A target that does
    /// not report itself valid is ignored.
    fn set_display(&mut self, target: Option<&Surface>);

    /// Pulls the next pending engine event, if any.
    fn poll_event(&mut self) -> Option<EngineEvent>;
}
