// SPDX-License-Identifier: MPL-2.0
//! Container items.
//!
//! An item is the content descriptor driving what a container should play:
//! the media path plus a preview bitmap. Items are produced and loaded by
//! an external pipeline; containers only read them. An item starts
//! `Pending` (preview not yet extracted) and becomes `Valid` when the
//! preview arrives, at which point subscribed containers are notified once
//! and expected to unsubscribe.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use image::DynamicImage;

use crate::ident::ContainerId;
use crate::listeners::{ListenerId, ListenerSet};

/// Lifecycle of an item's preview data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    /// The preview has not been extracted yet.
    Pending,
    /// The preview is available.
    Valid,
}

/// Attributes an update notification can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemAttribute {
    /// The preview bitmap.
    Preview,
}

/// A single update notification: which attribute changed, and the old and
/// new preview values.
#[derive(Debug, Clone)]
pub struct ItemUpdate {
    pub attribute: ItemAttribute,
    pub old: Option<Arc<DynamicImage>>,
    pub new: Option<Arc<DynamicImage>>,
}

#[derive(Debug)]
struct ItemInner {
    path: PathBuf,
    state: ItemState,
    preview: Option<Arc<DynamicImage>>,
    update_listeners: ListenerSet<ContainerId>,
}

/// Shared handle to an item. Clones refer to the same underlying item, so
/// identity comparison (not path comparison) decides whether a container
/// got a *new* item.
#[derive(Debug, Clone)]
pub struct Item {
    inner: Arc<Mutex<ItemInner>>,
}

impl Item {
    /// Creates a pending item for the given media path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ItemInner {
                path: path.into(),
                state: ItemState::Pending,
                preview: None,
                update_listeners: ListenerSet::new(),
            })),
        }
    }

    /// Creates an item whose preview is already available.
    #[must_use]
    pub fn with_preview(path: impl Into<PathBuf>, preview: DynamicImage) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ItemInner {
                path: path.into(),
                state: ItemState::Valid,
                preview: Some(Arc::new(preview)),
                update_listeners: ListenerSet::new(),
            })),
        }
    }

    /// The media path this item plays.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.inner.lock().expect("item lock poisoned").path.clone()
    }

    /// Whether the item's path equals the given path.
    #[must_use]
    pub fn path_matches(&self, other: &Path) -> bool {
        self.inner.lock().expect("item lock poisoned").path == other
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ItemState {
        self.inner.lock().expect("item lock poisoned").state
    }

    /// The preview bitmap, once available.
    #[must_use]
    pub fn preview(&self) -> Option<Arc<DynamicImage>> {
        self.inner
            .lock()
            .expect("item lock poisoned")
            .preview
            .clone()
    }

    /// Whether two handles refer to the same underlying item.
    #[must_use]
    pub fn same_item(&self, other: &Item) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Subscribes a container to update notifications.
    pub fn register_update_listener(&self, container: ContainerId) -> ListenerId {
        self.inner
            .lock()
            .expect("item lock poisoned")
            .update_listeners
            .add(container)
    }

    /// Removes a subscription. Removing an absent id is a no-op.
    pub fn unregister_update_listener(&self, id: ListenerId) {
        self.inner
            .lock()
            .expect("item lock poisoned")
            .update_listeners
            .remove(id);
    }

    /// Installs the preview, flips the item to `Valid`, and returns the
    /// update plus the listener snapshot to notify. Delivery is the
    /// caller's job so notification stays on the consumer thread.
    pub fn set_preview(
        &self,
        preview: DynamicImage,
    ) -> (ItemUpdate, Vec<(ListenerId, ContainerId)>) {
        let mut inner = self.inner.lock().expect("item lock poisoned");
        let old = inner.preview.take();
        let new = Arc::new(preview);
        inner.preview = Some(Arc::clone(&new));
        inner.state = ItemState::Valid;
        let listeners = inner.update_listeners.snapshot();
        (
            ItemUpdate {
                attribute: ItemAttribute::Preview,
                old,
                new: Some(new),
            },
            listeners,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::ContainerId;

    fn test_image() -> DynamicImage {
        DynamicImage::new_rgba8(2, 2)
    }

    #[test]
    fn new_item_is_pending_without_preview() {
        let item = Item::new("/media/clip.mp4");
        assert_eq!(item.state(), ItemState::Pending);
        assert!(item.preview().is_none());
    }

    #[test]
    fn set_preview_flips_to_valid() {
        let item = Item::new("/media/clip.mp4");
        let (update, _) = item.set_preview(test_image());

        assert_eq!(item.state(), ItemState::Valid);
        assert_eq!(update.attribute, ItemAttribute::Preview);
        assert!(update.old.is_none());
        assert!(update.new.is_some());
        assert!(item.preview().is_some());
    }

    #[test]
    fn set_preview_returns_listener_snapshot() {
        let item = Item::new("/media/clip.mp4");
        let id = item.register_update_listener(ContainerId(1));

        let (_, listeners) = item.set_preview(test_image());
        assert_eq!(listeners.len(), 1);
        assert_eq!(listeners[0].1, ContainerId(1));

        item.unregister_update_listener(id);
        let (_, listeners) = item.set_preview(test_image());
        assert!(listeners.is_empty());
    }

    #[test]
    fn clones_share_identity() {
        let item = Item::new("/media/clip.mp4");
        let other = item.clone();
        let unrelated = Item::new("/media/clip.mp4");

        assert!(item.same_item(&other));
        assert!(!item.same_item(&unrelated));
    }

    #[test]
    fn path_matches_compares_by_value() {
        let item = Item::new("/media/clip.mp4");
        assert!(item.path_matches(Path::new("/media/clip.mp4")));
        assert!(!item.path_matches(Path::new("/media/other.mp4")));
    }
}
