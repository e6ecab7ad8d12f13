// SPDX-License-Identifier: MPL-2.0
//! Container state.
//!
//! A container is a reusable presentation page that can request the shared
//! player be bound to its own controls and surface. This module holds the
//! per-container state — item, controls, surface, preview and error
//! overlays, retry counter, deferred tasks, geometry — while the protocol
//! logic that needs the player lives in [`crate::stage`].

pub mod fullscreen;

use std::sync::Arc;

use image::DynamicImage;

use crate::controls::Controls;
use crate::ident::{ContainerId, ParentId};
use crate::item::Item;
use crate::layout::{GeometrySnapshot, LayoutParams, Parent};
use crate::listeners::ListenerId;
use crate::player::PlayerState;
use crate::surface::Surface;
use crate::tasks::{DeferredQueue, Waiters};

use self::fullscreen::FullscreenTransition;

/// Operations buffered until the container's root view exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredTask {
    /// Run the full initialize-and-start sequence.
    InitializeAndStart,
    /// Toggle fullscreen.
    ToggleFullscreen,
    /// Show the controls strip.
    ShowControls,
    /// Hide the controls strip.
    HideControls,
}

/// One-shot continuations waiting for a completed layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutTask {
    /// Re-run the aspect-fit measurement of the surface.
    MeasureSurface,
    /// Finish a fullscreen transition (reveal, resume, restore chrome).
    SettleFullscreen,
}

/// Per-container binding state.
pub struct Container {
    id: ContainerId,
    pub(crate) controls: Controls,
    pub(crate) surface: Surface,
    pub(crate) item: Option<Item>,
    /// One-shot subscription to the item's preview-ready update.
    pub(crate) preview_listener: Option<ListenerId>,
    /// Preview bitmap currently shown as the poster image.
    pub(crate) preview_image: Option<Arc<DynamicImage>>,
    /// Logical preview visibility, driven by playback state.
    preview_visible: bool,
    /// Override that forces the preview shown without disturbing the
    /// logical flag.
    preview_temporary: bool,
    /// Whether the error overlay is up. While it is, tap intents are
    /// swallowed.
    error_overlay: bool,
    /// Player connected, source set, prepared. Cleared when a new item is
    /// set; set by the post-prepare continuation.
    pub(crate) initialized: bool,
    /// Consecutive failed preparation attempts since the last `Started`.
    pub(crate) retries: u32,
    /// Operations requested before the root view existed.
    pub(crate) deferred: DeferredQueue<DeferredTask>,
    /// One-shot layout continuations.
    pub(crate) layout_waiters: Waiters<LayoutTask>,

    // Geometry
    /// The inline slot this container's root normally hangs off.
    pub(crate) home_parent: ParentId,
    pub(crate) parent: Option<Parent>,
    pub(crate) layout: LayoutParams,
    /// Last measured size of the container root; `(0, 0)` until laid out.
    pub(crate) measured: (u32, u32),
    pub(crate) fullscreen: bool,
    pub(crate) geometry_snapshot: Option<GeometrySnapshot>,
    pub(crate) transition: Option<FullscreenTransition>,
}

impl Container {
    /// Creates a not-yet-ready container whose root will attach to
    /// `home_parent`.
    #[must_use]
    pub(crate) fn new(id: ContainerId, controls: Controls, home_parent: ParentId) -> Self {
        Self {
            id,
            controls,
            surface: Surface::new(),
            item: None,
            preview_listener: None,
            preview_image: None,
            preview_visible: true,
            preview_temporary: false,
            error_overlay: false,
            initialized: false,
            retries: 0,
            deferred: DeferredQueue::new(),
            layout_waiters: Waiters::new(),
            home_parent,
            parent: None,
            layout: LayoutParams::wrap_content(),
            measured: (0, 0),
            fullscreen: false,
            geometry_snapshot: None,
            transition: None,
        }
    }

    /// Identity of this container.
    #[must_use]
    pub fn id(&self) -> ContainerId {
        self.id
    }

    /// The container's controls.
    #[must_use]
    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    /// The container's display surface.
    #[must_use]
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// The item currently driving this container, if any.
    #[must_use]
    pub fn item(&self) -> Option<&Item> {
        self.item.as_ref()
    }

    /// The poster bitmap currently installed.
    #[must_use]
    pub fn preview_image(&self) -> Option<&Arc<DynamicImage>> {
        self.preview_image.as_ref()
    }

    /// Whether the container finished the initialize-and-start sequence
    /// for its current item.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether fullscreen presentation is active.
    #[must_use]
    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Whether a fullscreen transition is still in flight.
    #[must_use]
    pub fn transition_in_flight(&self) -> bool {
        self.transition.is_some()
    }

    /// Where the container root is currently attached.
    #[must_use]
    pub fn parent(&self) -> Option<Parent> {
        self.parent
    }

    /// Current layout parameters of the container root.
    #[must_use]
    pub fn layout(&self) -> LayoutParams {
        self.layout
    }

    /// Last measured size of the container root.
    #[must_use]
    pub fn measured(&self) -> (u32, u32) {
        self.measured
    }

    /// Whether the root view exists and buffered operations have been
    /// replayed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.deferred.is_ready()
    }

    // ======================================================================
    // Preview
    // ======================================================================

    /// Sets the logical preview visibility. The temporary override, while
    /// set, wins over this flag.
    pub(crate) fn set_preview_visible(&mut self, visible: bool) {
        self.preview_visible = visible;
    }

    /// Forces the preview shown (or releases the override).
    pub fn show_preview_temporarily(&mut self, show: bool) {
        self.preview_temporary = show;
    }

    /// Effective preview visibility.
    #[must_use]
    pub fn is_preview_visible(&self) -> bool {
        self.preview_temporary || self.preview_visible
    }

    /// Reacts to a player state change: the preview hides whenever frames
    /// (or the error overlay) should be on screen instead.
    pub(crate) fn on_state_changed(&mut self, _previous: PlayerState, current: PlayerState) {
        match current {
            PlayerState::Started => {
                self.retries = 0;
                self.set_preview_visible(false);
            }
            PlayerState::Error | PlayerState::Released | PlayerState::Paused => {
                self.set_preview_visible(false);
            }
            _ => self.set_preview_visible(true),
        }
    }

    // ======================================================================
    // Error overlay
    // ======================================================================

    /// Shows the error overlay and swallows tap intents.
    pub(crate) fn show_error_overlay(&mut self) {
        self.controls.hide();
        self.error_overlay = true;
    }

    /// Hides the error overlay and restores tap intents.
    pub(crate) fn hide_error_overlay(&mut self) {
        self.error_overlay = false;
    }

    /// Whether the error overlay is up.
    #[must_use]
    pub fn is_error_overlay_visible(&self) -> bool {
        self.error_overlay
    }

    /// Whether tap intents are currently accepted.
    #[must_use]
    pub fn taps_enabled(&self) -> bool {
        !self.error_overlay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::ControlsId;

    fn container() -> Container {
        Container::new(ContainerId(1), Controls::new(ControlsId(1)), ParentId(0))
    }

    #[test]
    fn new_container_shows_preview_and_accepts_taps() {
        let c = container();
        assert!(c.is_preview_visible());
        assert!(c.taps_enabled());
        assert!(!c.is_ready());
        assert!(!c.is_fullscreen());
    }

    #[test]
    fn temporary_preview_override_wins() {
        let mut c = container();
        c.set_preview_visible(false);
        assert!(!c.is_preview_visible());

        c.show_preview_temporarily(true);
        assert!(c.is_preview_visible());

        c.show_preview_temporarily(false);
        assert!(!c.is_preview_visible());
    }

    #[test]
    fn started_state_hides_preview_and_resets_retries() {
        let mut c = container();
        c.retries = 1;
        c.on_state_changed(PlayerState::Prepared, PlayerState::Started);

        assert_eq!(c.retries, 0);
        assert!(!c.is_preview_visible());
    }

    #[test]
    fn preparing_state_shows_preview() {
        let mut c = container();
        c.set_preview_visible(false);
        c.on_state_changed(PlayerState::Initialized, PlayerState::Preparing);
        assert!(c.is_preview_visible());
    }

    #[test]
    fn error_overlay_swallows_taps_and_hides_controls() {
        let mut c = container();
        c.controls.show();

        c.show_error_overlay();
        assert!(c.is_error_overlay_visible());
        assert!(!c.taps_enabled());
        assert!(!c.controls.is_visible());

        c.hide_error_overlay();
        assert!(c.taps_enabled());
    }
}
