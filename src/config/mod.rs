// SPDX-License-Identifier: MPL-2.0
//! This module handles playback preferences, including loading and saving
//! them to a `settings.toml` file.
//!
//! # Examples
//!
//! ```no_run
//! use clipdock::config::{self, Config};
//!
//! // Load existing configuration
//! let mut config = config::load().unwrap_or_default();
//!
//! // Modify a setting
//! config.autoplay = Some(true);
//!
//! // Save the modified configuration
//! config::save(&config).expect("Failed to save config");
//! ```

pub mod defaults;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub use defaults::*;

const CONFIG_FILE: &str = "settings.toml";
const APP_NAME: &str = "clipdock";

/// User-tunable playback preferences.
///
/// Every field is optional in the file; missing fields fall back to the
/// values in [`defaults`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Start playback as soon as an item is set on a ready container.
    #[serde(default)]
    pub autoplay: Option<bool>,
    /// Controls visibility before the first tap.
    #[serde(default)]
    pub controls_visible: Option<bool>,
    /// Step for relative seek intents, in milliseconds.
    #[serde(default)]
    pub seek_step_ms: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            autoplay: Some(DEFAULT_AUTOPLAY),
            controls_visible: Some(DEFAULT_CONTROLS_VISIBLE),
            seek_step_ms: Some(DEFAULT_SEEK_STEP_MS),
        }
    }
}

impl Config {
    /// Effective autoplay setting.
    #[must_use]
    pub fn autoplay(&self) -> bool {
        self.autoplay.unwrap_or(DEFAULT_AUTOPLAY)
    }

    /// Effective default controls visibility.
    #[must_use]
    pub fn controls_visible(&self) -> bool {
        self.controls_visible.unwrap_or(DEFAULT_CONTROLS_VISIBLE)
    }

    /// Effective relative seek step, clamped to the allowed range.
    #[must_use]
    pub fn seek_step_ms(&self) -> u32 {
        self.seek_step_ms
            .unwrap_or(DEFAULT_SEEK_STEP_MS)
            .clamp(MIN_SEEK_STEP_MS, MAX_SEEK_STEP_MS)
    }
}

fn get_default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut path| {
        path.push(APP_NAME);
        path.push(CONFIG_FILE);
        path
    })
}

/// Loads preferences from the default location, or defaults if absent.
pub fn load() -> Result<Config> {
    if let Some(path) = get_default_config_path() {
        if path.exists() {
            return load_from_path(&path);
        }
    }
    Ok(Config::default())
}

/// Saves preferences to the default location.
pub fn save(config: &Config) -> Result<()> {
    if let Some(path) = get_default_config_path() {
        return save_to_path(config, &path);
    }
    Ok(())
}

/// Loads preferences from an explicit path (used by tests).
pub fn load_from_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)?;
    Ok(toml::from_str(&contents)?)
}

/// Saves preferences to an explicit path (used by tests).
pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let contents = toml::to_string_pretty(config)?;
    fs::write(path, contents)?;
    Ok(())
}
