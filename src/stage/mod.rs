// SPDX-License-Identifier: MPL-2.0
//! The stage: owner of the one shared player and every container.
//!
//! All protocol logic that needs both a container and the player lives
//! here, as methods over the owned graph — the player is handed to
//! components as an explicitly passed handle, never as ambient global
//! state. The stage also drives event intake: engine events are pumped
//! into the player, which queues [`Notice`]s; the stage dispatches each
//! notice to its listener container, which may in turn operate on the
//! player again. Everything runs on the single consumer-facing thread.
//!
//! The key sequences:
//!
//! - **Binding protocol** ([`Stage::connect`]): detach the previous
//!   container completely (display target, listener sets, mutual
//!   controls references) before attaching the new one, so two
//!   containers can never race to control one engine.
//! - **Initialize-and-start** ([`Stage::initialize_and_start`]): bind,
//!   re-source if the item's path differs, then dispatch on the current
//!   state — registering a one-shot post-prepare continuation when
//!   preparation is (or becomes) pending.
//! - **Fullscreen** ([`Stage::toggle_fullscreen`]): a single sequenced
//!   re-parenting maneuver whose body defers behind a pending prepare and
//!   whose settling waits for the re-parented container to lay out.

use std::collections::BTreeMap;

use crate::config::{Config, MAX_PREPARE_RETRIES};
use crate::container::{Container, DeferredTask, LayoutTask};
use crate::container::fullscreen::{FullscreenTransition, TransitionPhase};
use crate::controls::Controls;
use crate::diagnostics::{DiagnosticEvent, DiagnosticsHandle};
use crate::engine::MediaEngine;
use crate::ident::{ContainerId, ControlsId, ParentId};
use crate::item::{Item, ItemAttribute, ItemState};
use crate::layout::{fit_dimensions, GeometrySnapshot, LayoutParams, Parent};
use crate::player::{Notice, Player, PlayerState, PreparedFollowUp, PreparedListener};
use crate::surface::SurfaceEvent;
use crate::tasks::{Submission, WaitEvent};
use image::DynamicImage;

/// User intents, already mapped from raw input by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Single tap on the container: toggle controls visibility.
    Tap,
    /// Double tap: toggle fullscreen.
    DoubleTap,
    /// Back key: leave fullscreen if active.
    Back,
    /// Play/pause affordance on the controls strip.
    PlayPause,
    /// Absolute seek from the seek bar.
    SeekTo(u32),
    /// Relative seek forward by the configured step.
    SeekForward,
    /// Relative seek backward by the configured step.
    SeekBackward,
}

/// The shared progress overlay that floats above whichever parent hosts
/// the active container. Hidden/re-parented around fullscreen transitions.
#[derive(Debug, Clone, Copy)]
pub struct OverlayChrome {
    visible: bool,
    parent: Option<Parent>,
}

impl OverlayChrome {
    /// Whether the overlay is currently shown.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Where the overlay is currently attached.
    #[must_use]
    pub fn parent(&self) -> Option<Parent> {
        self.parent
    }
}

/// Window-level chrome flags (immersive mode). Fire-and-forget.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowChrome {
    immersive: bool,
}

impl WindowChrome {
    /// Whether immersive mode is applied.
    #[must_use]
    pub fn is_immersive(&self) -> bool {
        self.immersive
    }
}

/// Owner of the shared player, the containers, and the shared chrome.
pub struct Stage {
    player: Player,
    containers: BTreeMap<ContainerId, Container>,
    chrome: OverlayChrome,
    window: WindowChrome,
    config: Config,
    next_id: u64,
    diagnostics: Option<DiagnosticsHandle>,
}

impl Stage {
    /// Creates a stage around the given engine with default preferences.
    #[must_use]
    pub fn new(engine: Box<dyn MediaEngine>) -> Self {
        Self::with_config(engine, Config::default())
    }

    /// Creates a stage around the given engine and preferences.
    #[must_use]
    pub fn with_config(engine: Box<dyn MediaEngine>, config: Config) -> Self {
        Self {
            player: Player::new(engine),
            containers: BTreeMap::new(),
            chrome: OverlayChrome {
                visible: false,
                parent: None,
            },
            window: WindowChrome::default(),
            config,
            next_id: 1,
            diagnostics: None,
        }
    }

    /// Attaches diagnostics to the stage and the player.
    pub fn set_diagnostics(&mut self, handle: DiagnosticsHandle) {
        self.player.set_diagnostics(handle.clone());
        self.diagnostics = Some(handle);
    }

    fn log(&self, event: DiagnosticEvent) {
        if let Some(handle) = &self.diagnostics {
            handle.log(event);
        }
    }

    /// The shared player (read-only; mutation goes through stage methods).
    #[must_use]
    pub fn player(&self) -> &Player {
        &self.player
    }

    /// The shared overlay chrome.
    #[must_use]
    pub fn chrome(&self) -> OverlayChrome {
        self.chrome
    }

    /// The window chrome flags.
    #[must_use]
    pub fn window(&self) -> WindowChrome {
        self.window
    }

    /// Looks up a container.
    #[must_use]
    pub fn container(&self, id: ContainerId) -> Option<&Container> {
        self.containers.get(&id)
    }

    // ======================================================================
    // Container lifecycle
    // ======================================================================

    /// Adds a container whose root will attach to `home_parent`. The
    /// container buffers operations until [`Stage::container_ready`].
    pub fn add_container(&mut self, home_parent: ParentId) -> ContainerId {
        let id = ContainerId(self.next_id);
        let controls_id = ControlsId(self.next_id);
        self.next_id += 1;

        let mut container = Container::new(id, Controls::new(controls_id), home_parent);
        if self.config.controls_visible() {
            container.controls.show();
        }
        self.containers.insert(id, container);
        id
    }

    /// Removes a container, fully detaching it from the player first if it
    /// holds the binding.
    pub fn remove_container(&mut self, id: ContainerId) {
        if self.player.binding().map(|b| b.container) == Some(id) {
            self.player.set_display(None);
            self.player.clear_error_listeners();
            self.player.clear_prepared_listeners();
            self.player.set_state_observer(None);
            self.player.unbind();
        }
        self.containers.remove(&id);
    }

    /// Marks the container's root view created: attaches it to its home
    /// slot and replays buffered operations FIFO, exactly once.
    pub fn container_ready(&mut self, id: ContainerId) {
        let tasks = {
            let Some(container) = self.containers.get_mut(&id) else {
                return;
            };
            if container.parent.is_none() {
                container.parent = Some(Parent::Slot(container.home_parent));
            }
            container.deferred.mark_ready()
        };
        for task in tasks {
            self.run_deferred(id, task);
        }
    }

    /// Routes a task through the container's deferred queue.
    fn submit_or_run(&mut self, id: ContainerId, task: DeferredTask) {
        let submission = {
            let Some(container) = self.containers.get_mut(&id) else {
                return;
            };
            container.deferred.submit(task)
        };
        if let Submission::RunNow(task) = submission {
            self.run_deferred(id, task);
        }
    }

    fn run_deferred(&mut self, id: ContainerId, task: DeferredTask) {
        match task {
            DeferredTask::InitializeAndStart => self.initialize_and_start_now(id),
            DeferredTask::ToggleFullscreen => self.toggle_fullscreen_now(id),
            DeferredTask::ShowControls => {
                if let Some(container) = self.containers.get_mut(&id) {
                    container.controls.show();
                }
            }
            DeferredTask::HideControls => {
                if let Some(container) = self.containers.get_mut(&id) {
                    container.controls.hide();
                }
            }
        }
    }

    // ======================================================================
    // Items and previews
    // ======================================================================

    /// Sets the item a container should play. Setting the same item again
    /// (identity, not path) changes nothing; a new item clears the
    /// initialized flag and resets the controls.
    pub fn set_item(&mut self, id: ContainerId, item: Item) {
        let autoplay = self.config.autoplay();
        let changed = {
            let Some(container) = self.containers.get_mut(&id) else {
                return;
            };
            let previous = container.item.replace(item.clone());
            let changed = previous.as_ref().map_or(true, |p| !p.same_item(&item));
            if changed {
                container.initialized = false;
                if previous.is_some() {
                    container.controls.reset();
                }
            }

            // Preview: subscribe once if not yet extracted, else install
            // it right away.
            if let (Some(old_listener), Some(previous_item)) =
                (container.preview_listener.take(), previous.as_ref())
            {
                previous_item.unregister_update_listener(old_listener);
            }
            if item.state() == ItemState::Pending {
                container.preview_listener = Some(item.register_update_listener(id));
            } else {
                container.preview_image = item.preview();
            }
            changed
        };

        if changed && autoplay {
            self.initialize_and_start(id);
        }
    }

    /// Installs a freshly loaded preview on the item and notifies every
    /// subscribed container, consuming their one-shot subscriptions.
    pub fn deliver_preview(&mut self, item: &Item, image: DynamicImage) {
        let (update, listeners) = item.set_preview(image);
        for (listener_id, container_id) in listeners {
            item.unregister_update_listener(listener_id);
            if let Some(container) = self.containers.get_mut(&container_id) {
                if container.preview_listener == Some(listener_id)
                    && update.attribute == ItemAttribute::Preview
                {
                    container.preview_listener = None;
                    container.preview_image = update.new.clone();
                }
            }
        }
    }

    // ======================================================================
    // Binding protocol
    // ======================================================================

    /// Binds the player to this container's controls and surface,
    /// severing any previous container first. Idempotent when the
    /// container already holds the binding.
    pub fn connect(&mut self, id: ContainerId) {
        let Some(container) = self.containers.get(&id) else {
            return;
        };
        let controls_id = container.controls.id();

        if self.player.bound_controls() != Some(controls_id) {
            // Detach the previous binding completely before touching the
            // new one: display target first, then listener sets, then the
            // mutual controls references.
            self.player.set_display(None);
            self.player.clear_error_listeners();
            self.player.clear_prepared_listeners();
            if let Some(previous) = self.player.binding() {
                if let Some(prev_container) = self.containers.get_mut(&previous.container) {
                    prev_container.controls.detach();
                }
                self.player.unbind();
            }

            self.player.add_error_listener(id);
            self.player
                .add_prepared_listener(PreparedListener::Container(id));
            self.player.set_state_observer(Some(id));
            if let Some(container) = self.containers.get_mut(&id) {
                container.controls.attach();
            }
            self.player.bind(id, controls_id);
        }

        // Attach the surface now if it is valid; otherwise the
        // surface-created event performs the deferred attachment.
        if let Some(container) = self.containers.get(&id) {
            if container.surface.is_valid() {
                self.player.set_display(Some(&container.surface));
            }
        }
    }

    /// Runs the full bind → source → prepare → start sequence, buffering
    /// it if the container's root view does not exist yet.
    pub fn initialize_and_start(&mut self, id: ContainerId) {
        self.submit_or_run(id, DeferredTask::InitializeAndStart);
    }

    fn initialize_and_start_now(&mut self, id: ContainerId) {
        let Some(item) = self.containers.get(&id).and_then(|c| c.item.clone()) else {
            return;
        };

        self.connect(id);

        // Re-source the engine if the item's path differs from what is
        // loaded. Same path means the current preparation state is reused —
        // except in Error, where the source must be driven through reset
        // and set again for the retry to re-prepare.
        let item_path = item.path();
        if self.player.data_source() != Some(item_path.as_path())
            || self.player.state() == PlayerState::Error
        {
            let state = self.player.state();
            if state != PlayerState::Idle {
                if state != PlayerState::Initialized && state != PlayerState::Error {
                    self.player.stop();
                }
                self.player.reset();
            }
            // A rejected source leaves the machine in Idle; the dispatch
            // below surfaces the error overlay for that case.
            let _ = self.player.set_data_source(&item_path);
        }

        match self.player.state() {
            PlayerState::Initialized | PlayerState::Stopped => {
                self.player.add_prepared_listener(PreparedListener::FollowUp(
                    PreparedFollowUp::SyncAndStart { container: id },
                ));
                self.player.prepare_async();
            }
            PlayerState::Preparing => {
                // A preparation is already in flight; ride on it.
                self.player.add_prepared_listener(PreparedListener::FollowUp(
                    PreparedFollowUp::SyncAndStart { container: id },
                ));
            }
            PlayerState::Error | PlayerState::Released | PlayerState::Idle => {
                if let Some(container) = self.containers.get_mut(&id) {
                    container.show_error_overlay();
                }
            }
            PlayerState::Started => {}
            PlayerState::Prepared | PlayerState::Paused => {
                self.run_sync_and_start(id);
            }
        }
    }

    /// The post-prepare continuation: freshly reset controls take the
    /// engine's metadata, remembered controls push their position into the
    /// engine. Then the container counts as initialized and playback
    /// starts.
    fn run_sync_and_start(&mut self, id: ContainerId) {
        {
            let Some(container) = self.containers.get_mut(&id) else {
                return;
            };
            if container.controls.is_reset() {
                self.player.sync_controls(&mut container.controls);
            } else {
                let remembered = container.controls.current();
                self.player.seek_to(remembered);
            }
            container.initialized = true;
        }
        self.player.start();
    }

    // ======================================================================
    // Event intake
    // ======================================================================

    /// Drains engine events and dispatches the resulting notices until the
    /// system is quiescent.
    pub fn pump(&mut self) {
        self.player.pump_engine();
        loop {
            let notices = self.player.take_notices();
            if notices.is_empty() {
                break;
            }
            for notice in notices {
                self.dispatch(notice);
            }
        }
    }

    fn dispatch(&mut self, notice: Notice) {
        match notice {
            Notice::StateChanged {
                observer,
                previous,
                current,
            } => {
                if let Some(container) = self.containers.get_mut(&observer) {
                    container.on_state_changed(previous, current);
                }
            }
            Notice::Prepared { listener } => match listener {
                PreparedListener::Container(id) => self.on_prepared_housekeeping(id),
                PreparedListener::FollowUp(PreparedFollowUp::SyncAndStart { container }) => {
                    self.run_sync_and_start(container);
                }
                PreparedListener::FollowUp(PreparedFollowUp::FinishFullscreen { container }) => {
                    self.run_fullscreen_body(container);
                }
            },
            Notice::EngineError {
                listener,
                code,
                extra,
            } => self.on_engine_error(listener, code, extra),
        }
    }

    /// Persistent prepared listener of the bound container: re-measure the
    /// surface, show the controls, drop any error overlay.
    fn on_prepared_housekeeping(&mut self, id: ContainerId) {
        self.invalidate_surface(id);
        if let Some(container) = self.containers.get_mut(&id) {
            container.controls.show();
            container.hide_error_overlay();
        }
    }

    fn on_engine_error(&mut self, id: ContainerId, _code: i32, _extra: i32) {
        let retry = {
            let Some(container) = self.containers.get_mut(&id) else {
                return;
            };
            if container.retries < MAX_PREPARE_RETRIES {
                container.retries += 1;
                Some(container.retries)
            } else {
                None
            }
        };

        match retry {
            Some(attempt) => {
                self.log(DiagnosticEvent::RetryScheduled {
                    container: id.value(),
                    attempt,
                });
                self.initialize_and_start(id);
            }
            None => {
                self.log(DiagnosticEvent::RetriesExhausted {
                    container: id.value(),
                });
                if let Some(container) = self.containers.get_mut(&id) {
                    container.show_error_overlay();
                }
            }
        }
    }

    // ======================================================================
    // Surface lifecycle & measurement
    // ======================================================================

    /// Feeds a surface lifecycle event into the container.
    pub fn surface_event(&mut self, id: ContainerId, event: SurfaceEvent) {
        match event {
            SurfaceEvent::Created => {
                let Some(container) = self.containers.get_mut(&id) else {
                    return;
                };
                container.surface.mark_created();
                self.attach_surface_if_bound(id);
            }
            SurfaceEvent::Changed { width, height } => {
                let Some(container) = self.containers.get_mut(&id) else {
                    return;
                };
                container.surface.set_frame_size(width, height);
                self.attach_surface_if_bound(id);
            }
            SurfaceEvent::Destroyed => {
                if let Some(container) = self.containers.get_mut(&id) {
                    // The engine's display target is deliberately left in
                    // place; validity is re-checked at the next use.
                    container.surface.mark_destroyed();
                }
            }
        }
    }

    fn attach_surface_if_bound(&mut self, id: ContainerId) {
        let attach = {
            let Some(container) = self.containers.get(&id) else {
                return;
            };
            container.controls.is_attached() && container.surface.is_valid()
        };
        if !attach {
            return;
        }
        if let Some(container) = self.containers.get(&id) {
            self.player.set_display(Some(&container.surface));
        }
        if self.player.state().can_transport() {
            self.invalidate_surface(id);
        }
    }

    /// Re-runs the aspect-fit measurement for the container's surface,
    /// deferring behind a one-shot layout waiter while the container is
    /// unmeasured or detached.
    pub fn invalidate_surface(&mut self, id: ContainerId) {
        let needs_defer = {
            let Some(container) = self.containers.get(&id) else {
                return;
            };
            container.measured.0 == 0 || container.measured.1 == 0 || container.parent.is_none()
        };

        if needs_defer {
            if let Some(container) = self.containers.get_mut(&id) {
                container
                    .layout_waiters
                    .add(WaitEvent::LayoutReady, LayoutTask::MeasureSurface);
            }
        } else {
            self.apply_surface_fit(id);
        }
    }

    fn apply_surface_fit(&mut self, id: ContainerId) {
        let video = self.player.video_size();
        if let Some(container) = self.containers.get_mut(&id) {
            let target = fit_dimensions(video, container.measured);
            container.surface.set_layout_size(target);
        }
    }

    /// Reports a completed layout pass of the container root. Runs any
    /// one-shot layout continuations (surface measurement, fullscreen
    /// settling) once the reported box is usable.
    pub fn container_laid_out(&mut self, id: ContainerId, width: u32, height: u32) {
        let tasks = {
            let Some(container) = self.containers.get_mut(&id) else {
                return;
            };
            container.measured = (width, height);
            if width == 0 || height == 0 || container.parent.is_none() {
                return;
            }
            container.layout_waiters.drain(WaitEvent::LayoutReady)
        };
        for task in tasks {
            match task {
                LayoutTask::MeasureSurface => self.apply_surface_fit(id),
                LayoutTask::SettleFullscreen => self.settle_fullscreen(id),
            }
        }
    }

    // ======================================================================
    // Fullscreen
    // ======================================================================

    /// Toggles fullscreen presentation for the container, buffering the
    /// request if the root view does not exist yet. A toggle while a
    /// transition is in flight is a no-op.
    pub fn toggle_fullscreen(&mut self, id: ContainerId) {
        self.submit_or_run(id, DeferredTask::ToggleFullscreen);
    }

    fn toggle_fullscreen_now(&mut self, id: ContainerId) {
        let entering = {
            let Some(container) = self.containers.get_mut(&id) else {
                return;
            };
            if container.transition.is_some() {
                return;
            }
            container.fullscreen = !container.fullscreen;
            container.fullscreen
        };

        self.log(DiagnosticEvent::FullscreenToggled {
            container: id.value(),
            entering,
        });

        // Shared chrome: shown and re-parented to follow the container.
        self.chrome.visible = true;
        self.chrome.parent = None;
        if entering {
            self.chrome.parent = Some(Parent::FullscreenRoot);
            self.window.immersive = true;
        } else {
            let home = self.containers.get(&id).map(|c| c.home_parent);
            self.chrome.parent = home.map(Parent::Slot);
            self.window.immersive = false;
        }

        // The body waits for a pending preparation; everything up to here
        // (flag, chrome) already happened and is not repeated.
        if self.player.state() == PlayerState::Preparing {
            if let Some(container) = self.containers.get_mut(&id) {
                container.transition = Some(FullscreenTransition::new(
                    entering,
                    TransitionPhase::AwaitingPrepared,
                ));
            }
            self.player.add_prepared_listener(PreparedListener::FollowUp(
                PreparedFollowUp::FinishFullscreen { container: id },
            ));
        } else {
            if let Some(container) = self.containers.get_mut(&id) {
                container.transition = Some(FullscreenTransition::new(
                    entering,
                    TransitionPhase::AwaitingLayout,
                ));
            }
            self.run_fullscreen_body(id);
        }
    }

    /// The sequenced body: hide surface and controls, pause if playing,
    /// snapshot or restore geometry, re-parent, re-measure, then wait for
    /// the container to lay out again.
    fn run_fullscreen_body(&mut self, id: ContainerId) {
        let player_started = self.player.state() == PlayerState::Started;

        let (transition, target_parent) = {
            let Some(container) = self.containers.get_mut(&id) else {
                return;
            };
            let Some(mut transition) = container.transition else {
                return;
            };

            // Hide the surface while re-parenting so no partially laid out
            // frame is drawn.
            container.surface.hide();
            transition.controls_were_visible = container.controls.is_visible();
            container.controls.hide();
            transition.was_playing = player_started;

            let target_parent = if transition.entering {
                let origin = match container.parent {
                    Some(Parent::Slot(slot)) => slot,
                    _ => container.home_parent,
                };
                container.geometry_snapshot = Some(GeometrySnapshot {
                    params: container.layout,
                    parent: origin,
                });
                container.parent = None;
                container.layout = LayoutParams::match_parent();
                Some(Parent::FullscreenRoot)
            } else if let Some(snapshot) = container.geometry_snapshot.take() {
                container.parent = None;
                container.layout = snapshot.params;
                Some(Parent::Slot(snapshot.parent))
            } else {
                None
            };

            transition.phase = TransitionPhase::AwaitingLayout;
            container.transition = Some(transition);
            (transition, target_parent)
        };

        if transition.was_playing {
            self.player.pause();
        }

        let Some(target_parent) = target_parent else {
            // Nothing to re-parent (leaving fullscreen without a snapshot):
            // settle immediately instead of waiting for a layout pass that
            // will never come.
            self.settle_fullscreen(id);
            return;
        };

        // Re-measure while detached; the waiter fires on the next layout.
        self.invalidate_surface(id);

        if let Some(container) = self.containers.get_mut(&id) {
            container.parent = Some(target_parent);
            container.measured = (0, 0);
            container
                .layout_waiters
                .add(WaitEvent::LayoutReady, LayoutTask::SettleFullscreen);
        }
    }

    /// The settling step, after the re-parented container laid out:
    /// reveal the surface, resume or refresh, restore controls and chrome.
    fn settle_fullscreen(&mut self, id: ContainerId) {
        let state = self.player.state();
        let source_matches = {
            let Some(container) = self.containers.get(&id) else {
                return;
            };
            match (&container.item, self.player.data_source()) {
                (Some(item), Some(source)) => item.path_matches(source),
                _ => false,
            }
        };

        let (resume, refresh) = {
            let Some(container) = self.containers.get_mut(&id) else {
                return;
            };
            let Some(transition) = container.transition.take() else {
                return;
            };

            container.surface.show();

            let mut resume = false;
            let mut refresh = false;
            if source_matches {
                if state.can_transport() {
                    if transition.was_playing {
                        resume = true;
                    } else {
                        refresh = true;
                    }
                }
            } else {
                container.set_preview_visible(true);
            }
            if transition.controls_were_visible {
                container.controls.show();
            }
            (resume, refresh)
        };

        if resume {
            self.player.start();
        } else if refresh {
            self.refresh_preview(id);
        }

        self.chrome.visible = false;
    }

    /// Refreshes the still frame shown behind the paused surface by
    /// seeking to the current position. Does nothing in `Error` state or
    /// outside the transport states.
    pub fn refresh_preview(&mut self, _id: ContainerId) {
        if self.player.state() == PlayerState::Error {
            return;
        }
        if self.player.state().can_transport() {
            let position = self.player.current_position();
            self.player.seek_to(position);
        }
    }

    // ======================================================================
    // Intents
    // ======================================================================

    /// Handles a mapped user intent. Returns whether it was consumed.
    pub fn handle_intent(&mut self, id: ContainerId, intent: Intent) -> bool {
        match intent {
            Intent::Tap => {
                let Some(container) = self.containers.get_mut(&id) else {
                    return false;
                };
                if !container.taps_enabled() {
                    return false;
                }
                if container.controls.is_visible() {
                    container.controls.hide();
                } else {
                    container.controls.show();
                }
                true
            }
            Intent::DoubleTap => {
                let Some(container) = self.containers.get(&id) else {
                    return false;
                };
                if !container.taps_enabled() {
                    return false;
                }
                self.toggle_fullscreen(id);
                true
            }
            Intent::Back => {
                let fullscreen = self
                    .containers
                    .get(&id)
                    .is_some_and(Container::is_fullscreen);
                if fullscreen {
                    self.toggle_fullscreen(id);
                    true
                } else {
                    false
                }
            }
            Intent::PlayPause => {
                let Some(container) = self.containers.get(&id) else {
                    return false;
                };
                if !container.initialized {
                    self.initialize_and_start(id);
                } else if self.player.is_playing() {
                    self.player.pause();
                } else {
                    self.player.start();
                }
                true
            }
            Intent::SeekTo(position_ms) => self.seek_bound(id, |_| position_ms),
            Intent::SeekForward => {
                let step = self.config.seek_step_ms();
                self.seek_bound(id, |current| current.saturating_add(step))
            }
            Intent::SeekBackward => {
                let step = self.config.seek_step_ms();
                self.seek_bound(id, |current| current.saturating_sub(step))
            }
        }
    }

    /// Seeks on behalf of a container, gated on it holding the binding and
    /// the player being in a transport state.
    fn seek_bound(&mut self, id: ContainerId, target: impl FnOnce(u32) -> u32) -> bool {
        let bound = {
            let Some(container) = self.containers.get(&id) else {
                return false;
            };
            self.player.bound_controls() == Some(container.controls.id())
        };
        if !bound || !self.player.state().can_transport() {
            return false;
        }

        let mut position = target(self.player.current_position());
        if let Some(duration) = self.player.duration() {
            position = position.min(duration);
        }
        self.player.seek_to(position);
        if let Some(container) = self.containers.get_mut(&id) {
            container.controls.set_current(position);
        }
        true
    }

    // ======================================================================
    // Save / restore
    // ======================================================================

    /// Captures the container's restorable slice. If the container holds
    /// the binding and the engine is playing, playback is paused and the
    /// saved state asks for a resume on restore.
    pub fn save_container(&mut self, id: ContainerId) -> crate::persist::SavedContainer {
        let Some(container) = self.containers.get(&id) else {
            return crate::persist::SavedContainer::default();
        };

        let connected = self.player.bound_controls() == Some(container.controls.id());
        let saved = crate::persist::SavedContainer {
            item_path: container.item.as_ref().map(Item::path),
            connected,
            fullscreen: container.fullscreen,
            controls_visible: container.controls.is_visible(),
            seek_position_ms: (!container.controls.is_reset())
                .then(|| container.controls.current()),
            duration_ms: container.controls.duration(),
            resume_playback: false,
        };

        let mut saved = saved;
        if connected && self.player.state() != PlayerState::Error && self.player.is_playing() {
            self.player.pause();
            saved.resume_playback = true;
        }
        saved
    }

    /// Replays a saved slice into a (possibly recreated) container. The
    /// rehydrated item may be supplied by the caller; otherwise a pending
    /// item is rebuilt from the saved path. Operations that need the root
    /// view are buffered until [`Stage::container_ready`].
    pub fn restore_container(
        &mut self,
        id: ContainerId,
        saved: &crate::persist::SavedContainer,
        item: Option<Item>,
    ) {
        if saved.connected {
            self.connect(id);
            self.invalidate_surface(id);
        }

        let restored_item = item.or_else(|| saved.item_path.clone().map(Item::new));
        if let Some(item) = restored_item {
            self.set_item(id, item);
        }

        if let Some(container) = self.containers.get_mut(&id) {
            if let Some(duration) = saved.duration_ms {
                container.controls.set_duration(duration);
            }
            if let Some(position) = saved.seek_position_ms {
                container.controls.set_current(position);
            }
        }

        if saved.resume_playback {
            self.submit_or_run(id, DeferredTask::InitializeAndStart);
        }
        let needs_fullscreen = saved.fullscreen
            && !self
                .containers
                .get(&id)
                .is_some_and(Container::is_fullscreen);
        if needs_fullscreen {
            self.submit_or_run(id, DeferredTask::ToggleFullscreen);
        }
        self.submit_or_run(
            id,
            if saved.controls_visible {
                DeferredTask::ShowControls
            } else {
                DeferredTask::HideControls
            },
        );
    }

    /// Tears the shared player down for process shutdown.
    pub fn release(&mut self) {
        self.player.release();
    }
}
