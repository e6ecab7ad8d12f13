// SPDX-License-Identifier: MPL-2.0
//! `clipdock` binds one shared playback engine to interchangeable display
//! containers.
//!
//! Only one video decodes at a time, but the page asking for it changes:
//! different containers, fullscreen vs. inline, surfaces destroyed and
//! recreated under a running engine. This crate owns the sequencing that
//! makes those handovers safe — the playback state machine, the
//! container-binding protocol, fullscreen re-parenting, aspect-fit surface
//! measurement, and the bounded error-retry policy — while treating
//! layout, gesture detection, and the decode pipeline itself as external
//! collaborators.
//!
//! The entry point is [`stage::Stage`], which owns the single
//! [`player::Player`] and every [`container::Container`], and routes
//! engine events back to whichever container currently holds the binding.

#![doc(html_root_url = "https://docs.rs/clipdock/0.2.0")]

pub mod config;
pub mod container;
pub mod controls;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod ident;
pub mod item;
pub mod layout;
pub mod listeners;
pub mod persist;
pub mod player;
pub mod stage;
pub mod surface;
pub mod tasks;
pub mod test_utils;

pub use config::Config;
pub use engine::{EngineEvent, FfmpegEngine, MediaEngine};
pub use error::{Error, Result};
pub use ident::{ContainerId, ControlsId, ParentId};
pub use item::Item;
pub use persist::SavedContainer;
pub use player::{Player, PlayerState};
pub use stage::{Intent, Stage};
pub use surface::SurfaceEvent;
