// SPDX-License-Identifier: MPL-2.0
//! View-tree geometry as seen by the binding protocol.
//!
//! Layout construction itself is an external concern; this module models
//! just enough of it to sequence the fullscreen re-parenting maneuver:
//! which parent slot a container root hangs off, its layout parameters,
//! and the aspect-fit math for sizing the display surface inside the
//! container's measured box.

use crate::ident::ParentId;

/// A size request along one layout axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    /// Fixed pixel size.
    Px(u32),
    /// Fill the parent.
    MatchParent,
    /// Size to content.
    WrapContent,
}

/// Layout parameters of a container root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutParams {
    pub width: Dimension,
    pub height: Dimension,
}

impl LayoutParams {
    /// Parameters that fill the parent on both axes (fullscreen).
    #[must_use]
    pub fn match_parent() -> Self {
        Self {
            width: Dimension::MatchParent,
            height: Dimension::MatchParent,
        }
    }

    /// Parameters that size to content on both axes.
    #[must_use]
    pub fn wrap_content() -> Self {
        Self {
            width: Dimension::WrapContent,
            height: Dimension::WrapContent,
        }
    }
}

/// Where a container root is currently attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parent {
    /// A regular inline slot in some page layout.
    Slot(ParentId),
    /// The window-level root used for fullscreen presentation.
    FullscreenRoot,
}

/// Layout parameters + original parent, captured when a container enters
/// fullscreen and consumed (via `Option::take`) when it leaves. Holding it
/// outside a transition is a bug; the `Option` makes double-consumption
/// impossible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometrySnapshot {
    pub params: LayoutParams,
    pub parent: ParentId,
}

/// Computes the surface size that fits `video` inside `container` while
/// preserving aspect ratio: fit-width when the video is wider than tall,
/// fit-height otherwise.
///
/// A degenerate container box (zero on either axis) falls back to the raw
/// video dimensions.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn fit_dimensions(video: (u32, u32), container: (u32, u32)) -> (u32, u32) {
    let (iw, ih) = video;
    let (cw, ch) = container;

    if cw == 0 || ch == 0 {
        return (iw, ih);
    }

    if iw > ih {
        let modifier = f64::from(cw) / f64::from(iw);
        (cw, (f64::from(ih) * modifier) as u32)
    } else {
        let modifier = f64::from(ch) / f64::from(ih);
        ((f64::from(iw) * modifier) as u32, ch)
    }
}
