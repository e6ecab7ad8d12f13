// SPDX-License-Identifier: MPL-2.0
//! The shared playback controller.
//!
//! Exactly one [`Player`] exists per [`crate::stage::Stage`]; it wraps the
//! media decoding engine and owns the canonical playback state machine, the
//! current data source, and the listener registrations of whichever
//! container currently holds the binding.
//!
//! The state machine mirrors the engine's own lifecycle, re-exposed with
//! notification hooks:
//!
//! ```text
//! Idle → Initialized → Preparing → Prepared → Started ⇄ Paused
//!   ↑                                            │
//!   └──────────── reset ── Stopped ◀── stop ─────┘
//! ```
//!
//! `Error` is reachable from any state on an engine error event; `Released`
//! is terminal. Transitions are the only mutation path — there is no
//! external state assignment.
//!
//! Operations requested in a state that cannot honor them are **silent
//! no-ops**, never failures: UI input races freely against async engine
//! callbacks and must not crash the binding layer.
//!
//! The player never calls into containers directly. Every outward
//! notification is queued as a [`Notice`] and dispatched by the stage after
//! the current operation finishes, so containers can in turn borrow the
//! player mutably while reacting.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::controls::Controls;
use crate::diagnostics::{DiagnosticEvent, DiagnosticsHandle};
use crate::engine::{EngineEvent, MediaEngine};
use crate::error::Result;
use crate::ident::{ContainerId, ControlsId};
use crate::listeners::{ListenerId, ListenerSet};
use crate::surface::Surface;

/// Canonical playback state. Exactly one value at a time, process-wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// No data source. Initial state, and the result of `reset`.
    Idle,
    /// A data source is set but preparation has not been requested.
    Initialized,
    /// Asynchronous preparation is in flight.
    Preparing,
    /// The stream is ready; playback has not started yet.
    Prepared,
    /// Playing.
    Started,
    /// Paused at the current position.
    Paused,
    /// Explicitly stopped; re-preparation is required before starting.
    Stopped,
    /// The engine reported an error.
    Error,
    /// The engine was torn down. Terminal.
    Released,
}

impl PlayerState {
    /// Whether transport operations (start/pause/seek) are meaningful.
    #[must_use]
    pub fn can_transport(self) -> bool {
        matches!(self, Self::Prepared | Self::Started | Self::Paused)
    }
}

/// The (container, controls) pair currently attached to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub container: ContainerId,
    pub controls: ControlsId,
}

/// One-shot continuations that run on the next prepared event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreparedFollowUp {
    /// Push metadata/position between controls and engine, mark the
    /// container initialized, and start playback.
    SyncAndStart { container: ContainerId },
    /// Run the deferred body of a fullscreen transition.
    FinishFullscreen { container: ContainerId },
}

/// An entry in the prepared-listener set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreparedListener {
    /// Persistent housekeeping listener of the bound container
    /// (re-measure surface, show controls, hide error overlay).
    Container(ContainerId),
    /// A one-shot continuation, removed when it fires.
    FollowUp(PreparedFollowUp),
}

/// Outward notifications queued by the player and dispatched by the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// The state machine transitioned; delivered to the state observer.
    StateChanged {
        observer: ContainerId,
        previous: PlayerState,
        current: PlayerState,
    },
    /// Preparation finished; one notice per registered prepared listener,
    /// in insertion order.
    Prepared { listener: PreparedListener },
    /// The engine failed; one notice per registered error listener.
    EngineError {
        listener: ContainerId,
        code: i32,
        extra: i32,
    },
}

/// The shared playback controller.
pub struct Player {
    engine: Box<dyn MediaEngine>,
    state: PlayerState,
    data_source: Option<PathBuf>,
    binding: Option<Binding>,
    error_listeners: ListenerSet<ContainerId>,
    prepared_listeners: ListenerSet<PreparedListener>,
    state_observer: Option<ContainerId>,
    notices: VecDeque<Notice>,
    diagnostics: Option<DiagnosticsHandle>,
}

impl Player {
    /// Wraps the given engine. The player starts `Idle`.
    #[must_use]
    pub fn new(engine: Box<dyn MediaEngine>) -> Self {
        Self {
            engine,
            state: PlayerState::Idle,
            data_source: None,
            binding: None,
            error_listeners: ListenerSet::new(),
            prepared_listeners: ListenerSet::new(),
            state_observer: None,
            notices: VecDeque::new(),
            diagnostics: None,
        }
    }

    /// Attaches a diagnostics handle; lifecycle events are logged to it.
    pub fn set_diagnostics(&mut self, handle: DiagnosticsHandle) {
        self.diagnostics = Some(handle);
    }

    fn log(&self, event: DiagnosticEvent) {
        if let Some(handle) = &self.diagnostics {
            handle.log(event);
        }
    }

    fn violation(&self, operation: &'static str) {
        self.log(DiagnosticEvent::StateViolation {
            operation,
            state: self.state,
        });
    }

    /// Current playback state.
    #[must_use]
    pub fn state(&self) -> PlayerState {
        self.state
    }

    /// The data source currently loaded, if any.
    #[must_use]
    pub fn data_source(&self) -> Option<&Path> {
        self.data_source.as_deref()
    }

    /// The current binding, if any.
    #[must_use]
    pub fn binding(&self) -> Option<Binding> {
        self.binding
    }

    /// Identity of the currently bound controls, if any.
    #[must_use]
    pub fn bound_controls(&self) -> Option<ControlsId> {
        self.binding.map(|b| b.controls)
    }

    /// Whether playback is running.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.state == PlayerState::Started
    }

    /// Current engine position in milliseconds.
    #[must_use]
    pub fn current_position(&self) -> u32 {
        self.engine.current_position()
    }

    /// Prepared video dimensions, `(0, 0)` before preparation.
    #[must_use]
    pub fn video_size(&self) -> (u32, u32) {
        (self.engine.video_width(), self.engine.video_height())
    }

    /// Stream duration, once known.
    #[must_use]
    pub fn duration(&self) -> Option<u32> {
        self.engine.duration()
    }

    // ======================================================================
    // State machine operations
    // ======================================================================

    /// Loads a data source. Legal in `Idle` and `Initialized`; elsewhere a
    /// silent no-op. Fails only if the engine rejects the source.
    pub fn set_data_source(&mut self, path: &Path) -> Result<()> {
        if !matches!(self.state, PlayerState::Idle | PlayerState::Initialized) {
            self.violation("set_data_source");
            return Ok(());
        }

        if let Err(err) = self.engine.set_data_source(path) {
            self.log(DiagnosticEvent::SourceRejected {
                source: path.display().to_string(),
            });
            return Err(err);
        }

        self.data_source = Some(path.to_path_buf());
        self.transition(PlayerState::Initialized);
        Ok(())
    }

    /// Requests asynchronous preparation. Legal from `Initialized` and
    /// `Stopped`. Calling while already `Preparing` issues no second engine
    /// request; newly added prepared listeners still fire when the original
    /// request completes.
    pub fn prepare_async(&mut self) {
        match self.state {
            PlayerState::Initialized | PlayerState::Stopped => {
                self.log(DiagnosticEvent::PrepareRequested {
                    source: self
                        .data_source
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default(),
                });
                self.engine.prepare_async();
                self.transition(PlayerState::Preparing);
            }
            PlayerState::Preparing => {}
            _ => self.violation("prepare_async"),
        }
    }

    /// Starts or resumes playback. Meaningful in `Prepared` and `Paused`;
    /// already `Started` is a no-op.
    pub fn start(&mut self) {
        match self.state {
            PlayerState::Prepared | PlayerState::Paused => {
                self.engine.start();
                self.transition(PlayerState::Started);
            }
            PlayerState::Started => {}
            _ => self.violation("start"),
        }
    }

    /// Pauses playback. Meaningful in `Started`; already `Paused` is a
    /// no-op.
    pub fn pause(&mut self) {
        match self.state {
            PlayerState::Started => {
                self.engine.pause();
                self.transition(PlayerState::Paused);
            }
            PlayerState::Paused => {}
            _ => self.violation("pause"),
        }
    }

    /// Seeks to the given position. Meaningful in `Prepared`, `Started`
    /// and `Paused`; elsewhere a silent no-op.
    pub fn seek_to(&mut self, position_ms: u32) {
        if self.state.can_transport() {
            self.engine.seek_to(position_ms);
        } else {
            self.violation("seek_to");
        }
    }

    /// Stops playback. Legal from every state except `Released`.
    pub fn stop(&mut self) {
        if self.state == PlayerState::Released {
            self.violation("stop");
            return;
        }
        self.engine.stop();
        self.transition(PlayerState::Stopped);
    }

    /// Returns to `Idle` and clears the data source, so re-setting the same
    /// path still triggers re-preparation.
    pub fn reset(&mut self) {
        if self.state == PlayerState::Released {
            self.violation("reset");
            return;
        }
        self.engine.reset();
        self.data_source = None;
        self.transition(PlayerState::Idle);
    }

    /// Tears the engine down. Terminal: every later operation is a no-op.
    pub fn release(&mut self) {
        if self.state == PlayerState::Released {
            return;
        }
        self.engine.release();
        self.data_source = None;
        self.binding = None;
        self.error_listeners.clear();
        self.prepared_listeners.clear();
        self.transition(PlayerState::Released);
        self.state_observer = None;
    }

    /// Rebinds the rendering target. `None` detaches; a target that does
    /// not report itself valid is ignored.
    pub fn set_display(&mut self, target: Option<&Surface>) {
        self.engine.set_display(target);
    }

    /// Pushes live engine metadata into the given controls.
    pub fn sync_controls(&self, controls: &mut Controls) {
        if let Some(duration) = self.engine.duration() {
            controls.set_duration(duration);
        }
        controls.set_current(self.engine.current_position());
    }

    // ======================================================================
    // Binding and listeners
    // ======================================================================

    /// Records the new binding.
    pub fn bind(&mut self, container: ContainerId, controls: ControlsId) {
        self.binding = Some(Binding {
            container,
            controls,
        });
        self.log(DiagnosticEvent::BindingChanged {
            container: Some(container.value()),
        });
    }

    /// Clears the binding.
    pub fn unbind(&mut self) {
        if self.binding.take().is_some() {
            self.log(DiagnosticEvent::BindingChanged { container: None });
        }
    }

    /// Registers an error listener.
    pub fn add_error_listener(&mut self, container: ContainerId) -> ListenerId {
        self.error_listeners.add(container)
    }

    /// Removes every error listener.
    pub fn clear_error_listeners(&mut self) {
        self.error_listeners.clear();
    }

    /// Registers a prepared listener (persistent or one-shot).
    pub fn add_prepared_listener(&mut self, listener: PreparedListener) -> ListenerId {
        self.prepared_listeners.add(listener)
    }

    /// Removes a prepared listener. Removing an absent id is a no-op.
    pub fn remove_prepared_listener(&mut self, id: ListenerId) {
        self.prepared_listeners.remove(id);
    }

    /// Removes every prepared listener.
    pub fn clear_prepared_listeners(&mut self) {
        self.prepared_listeners.clear();
    }

    /// Sets (or clears) the single state-change observer.
    pub fn set_state_observer(&mut self, observer: Option<ContainerId>) {
        self.state_observer = observer;
    }

    /// Number of registered prepared listeners (for protocol assertions).
    #[must_use]
    pub fn prepared_listener_count(&self) -> usize {
        self.prepared_listeners.len()
    }

    // ======================================================================
    // Engine event intake
    // ======================================================================

    /// Drains pending engine events into state transitions and notices.
    pub fn pump_engine(&mut self) {
        while let Some(event) = self.engine.poll_event() {
            self.handle_engine_event(event);
        }
    }

    fn handle_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Prepared {
                width,
                height,
                duration_ms,
            } => {
                // A prepared event that arrives after the machine left
                // Preparing (reset, new source) is stale.
                if self.state != PlayerState::Preparing {
                    return;
                }
                self.log(DiagnosticEvent::PrepareFinished {
                    width,
                    height,
                    duration_ms,
                });
                self.transition(PlayerState::Prepared);

                // Dispatch over a snapshot: entries may remove themselves
                // or be superseded while notices are being handled.
                for (id, listener) in self.prepared_listeners.snapshot() {
                    if matches!(listener, PreparedListener::FollowUp(_)) {
                        self.prepared_listeners.remove(id);
                    }
                    self.notices.push_back(Notice::Prepared { listener });
                }
            }
            EngineEvent::Error { code, extra } => {
                self.log(DiagnosticEvent::EngineError { code, extra });
                self.transition(PlayerState::Error);
                for (_, listener) in self.error_listeners.snapshot() {
                    self.notices.push_back(Notice::EngineError {
                        listener,
                        code,
                        extra,
                    });
                }
            }
        }
    }

    /// Takes the queued notices for dispatch.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    fn transition(&mut self, new_state: PlayerState) {
        if self.state == new_state {
            return;
        }
        let previous = self.state;
        self.state = new_state;
        self.log(DiagnosticEvent::StateChanged {
            previous,
            current: new_state,
        });
        if let Some(observer) = self.state_observer {
            self.notices.push_back(Notice::StateChanged {
                observer,
                previous,
                current: new_state,
            });
        }
    }
}
