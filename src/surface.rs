// SPDX-License-Identifier: MPL-2.0
//! Display surface model.
//!
//! A surface is an onscreen drawing target with a lifecycle of its own: it
//! can be destroyed and recreated while the engine keeps running. Validity
//! is therefore checked at the point of use, never cached — a surface that
//! was valid when an operation was queued may be gone by the time the
//! operation runs on the next turn of the event loop.

/// Lifecycle notifications delivered by the windowing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// The backing surface was (re)created and is ready for rendering.
    Created,
    /// The backing surface changed size or format.
    Changed { width: u32, height: u32 },
    /// The backing surface was destroyed.
    Destroyed,
}

/// Per-container display surface state.
#[derive(Debug)]
pub struct Surface {
    valid: bool,
    visible: bool,
    /// Bumped on every (re)creation so the engine can tell a recreated
    /// surface from the one it was previously attached to.
    generation: u64,
    /// Size most recently requested for the surface view by aspect-fit.
    layout_size: Option<(u32, u32)>,
    /// Backing frame size reported by the windowing layer, if any.
    frame_size: Option<(u32, u32)>,
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface {
    /// Creates a surface that has not yet been backed by the windowing
    /// layer (invalid until the first [`SurfaceEvent::Created`]).
    #[must_use]
    pub fn new() -> Self {
        Self {
            valid: false,
            visible: true,
            generation: 0,
            layout_size: None,
            frame_size: None,
        }
    }

    /// Whether the backing surface currently exists.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Marks the surface created, bumping its generation.
    pub fn mark_created(&mut self) {
        self.valid = true;
        self.generation += 1;
    }

    /// Marks the surface destroyed. The requested layout size is kept; a
    /// recreated surface is re-measured from scratch anyway.
    pub fn mark_destroyed(&mut self) {
        self.valid = false;
        self.frame_size = None;
    }

    /// Records the backing frame size reported by the windowing layer.
    pub fn set_frame_size(&mut self, width: u32, height: u32) {
        self.frame_size = Some((width, height));
    }

    /// Backing frame size, if reported.
    #[must_use]
    pub fn frame_size(&self) -> Option<(u32, u32)> {
        self.frame_size
    }

    /// Identifies this incarnation of the surface.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Shows the surface view.
    pub fn show(&mut self) {
        self.visible = true;
    }

    /// Hides the surface view (used while re-parenting, so no partially
    /// laid out frame is ever drawn).
    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// Whether the surface view is visible.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Requests a re-layout of the surface view only, to the given size.
    pub fn set_layout_size(&mut self, size: (u32, u32)) {
        self.layout_size = Some(size);
    }

    /// Size last requested for the surface view.
    #[must_use]
    pub fn layout_size(&self) -> Option<(u32, u32)> {
        self.layout_size
    }
}
