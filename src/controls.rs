// SPDX-License-Identifier: MPL-2.0
//! Per-container playback controls state.
//!
//! Controls mirror the UI-visible slice of playback: position, duration,
//! visibility. They are bound to at most one player at a time; the player
//! side of that bond is tracked by [`crate::player::Player`]'s binding, the
//! controls side by the `attached` flag here. A freshly reset controls
//! strip remembers nothing — the post-prepare continuation uses that to
//! decide whether to push engine metadata into the controls or the
//! remembered position into the engine.

use crate::ident::ControlsId;

/// UI-visible playback controls for one container.
#[derive(Debug)]
pub struct Controls {
    id: ControlsId,
    attached: bool,
    visible: bool,
    duration_ms: Option<u32>,
    current_ms: u32,
    reset: bool,
}

impl Controls {
    /// Creates detached, hidden, reset controls.
    #[must_use]
    pub fn new(id: ControlsId) -> Self {
        Self {
            id,
            attached: false,
            visible: false,
            duration_ms: None,
            current_ms: 0,
            reset: true,
        }
    }

    /// Identity of this controls strip.
    #[must_use]
    pub fn id(&self) -> ControlsId {
        self.id
    }

    /// Marks the controls bound to the player.
    pub fn attach(&mut self) {
        self.attached = true;
    }

    /// Severs the controls from the player.
    pub fn detach(&mut self) {
        self.attached = false;
    }

    /// Whether the controls are bound to the player.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Shows the controls strip.
    pub fn show(&mut self) {
        self.visible = true;
    }

    /// Hides the controls strip.
    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// Whether the controls strip is visible.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Records the stream duration. Clears the reset flag.
    pub fn set_duration(&mut self, duration_ms: u32) {
        self.duration_ms = Some(duration_ms);
        self.reset = false;
    }

    /// Last known duration.
    #[must_use]
    pub fn duration(&self) -> Option<u32> {
        self.duration_ms
    }

    /// Records the playback position. Clears the reset flag.
    pub fn set_current(&mut self, position_ms: u32) {
        self.current_ms = position_ms;
        self.reset = false;
    }

    /// Remembered playback position.
    #[must_use]
    pub fn current(&self) -> u32 {
        self.current_ms
    }

    /// Forgets position and duration. Visibility is not touched.
    pub fn reset(&mut self) {
        self.duration_ms = None;
        self.current_ms = 0;
        self.reset = true;
    }

    /// Whether the controls remember nothing since the last reset.
    #[must_use]
    pub fn is_reset(&self) -> bool {
        self.reset
    }
}
