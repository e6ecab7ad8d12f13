// SPDX-License-Identifier: MPL-2.0
//! Test utilities: a scripted media engine.
//!
//! The scripted engine records every call it receives and emits exactly the
//! events a test pushes into it, so protocol sequences (prepare → prepared,
//! prepare → error → retry, handover mid-prepare) can be driven
//! deterministically without touching FFmpeg.
//!
//! The handle is cheaply cloneable; the clone passed into the player and
//! the clone kept by the test observe the same underlying engine.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::engine::{EngineEvent, MediaEngine};
use crate::error::{Error, Result};
use crate::surface::Surface;

#[derive(Debug, Default)]
struct ScriptedInner {
    source: Option<PathBuf>,
    reject_next_source: bool,
    events: VecDeque<EngineEvent>,
    position_ms: u32,
    duration_ms: Option<u32>,
    dimensions: (u32, u32),
    display_target: Option<u64>,
    set_source_calls: u32,
    prepare_calls: u32,
    start_calls: u32,
    pause_calls: u32,
    stop_calls: u32,
    reset_calls: u32,
    release_calls: u32,
    seek_calls: u32,
}

/// Deterministic engine double for protocol tests.
#[derive(Debug, Clone, Default)]
pub struct ScriptedEngine {
    inner: Arc<Mutex<ScriptedInner>>,
}

impl ScriptedEngine {
    /// Creates an engine with no scripted events.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptedInner> {
        self.inner.lock().expect("scripted engine lock poisoned")
    }

    /// Makes the next `set_data_source` call fail.
    pub fn reject_next_source(&self) {
        self.lock().reject_next_source = true;
    }

    /// Queues a prepared event for the next poll.
    pub fn push_prepared(&self, width: u32, height: u32, duration_ms: u32) {
        self.lock().events.push_back(EngineEvent::Prepared {
            width,
            height,
            duration_ms,
        });
    }

    /// Queues an error event for the next poll.
    pub fn push_error(&self, code: i32, extra: i32) {
        self.lock()
            .events
            .push_back(EngineEvent::Error { code, extra });
    }

    /// Forces the reported playback position.
    pub fn set_position(&self, position_ms: u32) {
        self.lock().position_ms = position_ms;
    }

    /// Generation of the attached surface, if any.
    #[must_use]
    pub fn display_target(&self) -> Option<u64> {
        self.lock().display_target
    }

    /// Number of `set_data_source` calls observed.
    #[must_use]
    pub fn set_source_calls(&self) -> u32 {
        self.lock().set_source_calls
    }

    /// Number of `prepare_async` calls observed.
    #[must_use]
    pub fn prepare_calls(&self) -> u32 {
        self.lock().prepare_calls
    }

    /// Number of `start` calls observed.
    #[must_use]
    pub fn start_calls(&self) -> u32 {
        self.lock().start_calls
    }

    /// Number of `pause` calls observed.
    #[must_use]
    pub fn pause_calls(&self) -> u32 {
        self.lock().pause_calls
    }

    /// Number of `stop` calls observed.
    #[must_use]
    pub fn stop_calls(&self) -> u32 {
        self.lock().stop_calls
    }

    /// Number of `reset` calls observed.
    #[must_use]
    pub fn reset_calls(&self) -> u32 {
        self.lock().reset_calls
    }

    /// Number of `release` calls observed.
    #[must_use]
    pub fn release_calls(&self) -> u32 {
        self.lock().release_calls
    }

    /// Number of `seek_to` calls observed.
    #[must_use]
    pub fn seek_calls(&self) -> u32 {
        self.lock().seek_calls
    }

    /// Position of the last `seek_to` call.
    #[must_use]
    pub fn last_seek(&self) -> Option<u32> {
        let inner = self.lock();
        (inner.seek_calls > 0).then_some(inner.position_ms)
    }
}

impl MediaEngine for ScriptedEngine {
    fn set_data_source(&mut self, path: &Path) -> Result<()> {
        let mut inner = self.lock();
        inner.set_source_calls += 1;
        if inner.reject_next_source {
            inner.reject_next_source = false;
            return Err(Error::Source(format!("scripted rejection: {:?}", path)));
        }
        inner.source = Some(path.to_path_buf());
        Ok(())
    }

    fn prepare_async(&mut self) {
        self.lock().prepare_calls += 1;
    }

    fn start(&mut self) {
        self.lock().start_calls += 1;
    }

    fn pause(&mut self) {
        self.lock().pause_calls += 1;
    }

    fn stop(&mut self) {
        self.lock().stop_calls += 1;
    }

    fn reset(&mut self) {
        let mut inner = self.lock();
        inner.reset_calls += 1;
        inner.source = None;
        inner.dimensions = (0, 0);
        inner.duration_ms = None;
        inner.position_ms = 0;
    }

    fn release(&mut self) {
        let mut inner = self.lock();
        inner.release_calls += 1;
        inner.source = None;
        inner.events.clear();
    }

    fn seek_to(&mut self, position_ms: u32) {
        let mut inner = self.lock();
        inner.seek_calls += 1;
        inner.position_ms = position_ms;
    }

    fn current_position(&self) -> u32 {
        self.lock().position_ms
    }

    fn duration(&self) -> Option<u32> {
        self.lock().duration_ms
    }

    fn video_width(&self) -> u32 {
        self.lock().dimensions.0
    }

    fn video_height(&self) -> u32 {
        self.lock().dimensions.1
    }

    fn set_display(&mut self, target: Option<&Surface>) {
        let mut inner = self.lock();
        match target {
            Some(surface) if surface.is_valid() => {
                inner.display_target = Some(surface.generation());
            }
            Some(_) => {}
            None => inner.display_target = None,
        }
    }

    fn poll_event(&mut self) -> Option<EngineEvent> {
        let mut inner = self.lock();
        let event = inner.events.pop_front()?;
        if let EngineEvent::Prepared {
            width,
            height,
            duration_ms,
        } = event
        {
            inner.dimensions = (width, height);
            inner.duration_ms = Some(duration_ms);
        }
        Some(event)
    }
}
