// SPDX-License-Identifier: MPL-2.0
//! Container state persistence using CBOR format.
//!
//! A container that is torn down and recreated (page rotation, process
//! restart) round-trips the values below. The format is CBOR for compact
//! binary storage and a clear separation from user-editable TOML
//! preferences.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// The restorable slice of a container.
///
/// `resume_playback` is only ever set when the engine was actually playing
/// at save time (the save path pauses it first), so a restored container
/// never auto-starts playback the user had paused.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SavedContainer {
    /// Media path of the item, if one was set.
    #[serde(default)]
    pub item_path: Option<PathBuf>,

    /// Whether this container owned the binding at save time.
    #[serde(default)]
    pub connected: bool,

    /// Fullscreen flag.
    #[serde(default)]
    pub fullscreen: bool,

    /// Controls strip visibility.
    #[serde(default)]
    pub controls_visible: bool,

    /// Last known seek position.
    #[serde(default)]
    pub seek_position_ms: Option<u32>,

    /// Last known duration.
    #[serde(default)]
    pub duration_ms: Option<u32>,

    /// Whether playback should resume on restore.
    #[serde(default)]
    pub resume_playback: bool,
}

/// Writes the state to the given file.
pub fn save_to(state: &SavedContainer, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::File::create(path)?;
    let writer = BufWriter::new(file);
    ciborium::into_writer(state, writer)
        .map_err(|e| Error::Persist(format!("Failed to write saved state: {e}")))
}

/// Reads the state back from the given file.
pub fn load_from(path: &Path) -> Result<SavedContainer> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    ciborium::from_reader(reader)
        .map_err(|e| Error::Persist(format!("Failed to parse saved state: {e}")))
}
