// SPDX-License-Identifier: MPL-2.0
//! Integration tests for the binding and sequencing protocol.
//!
//! These drive a full stage against the scripted engine: container
//! handovers, prepare continuations, the retry budget, fullscreen
//! sequencing under a pending prepare, aspect-fit measurement, and the
//! save/restore round trip.

use std::path::Path;

use clipdock::persist::SavedContainer;
use clipdock::stage::Intent;
use clipdock::test_utils::ScriptedEngine;
use clipdock::{ContainerId, Item, ParentId, PlayerState, Stage, SurfaceEvent};

const CLIP: &str = "/media/clip.mp4";

/// Builds a stage plus a ready, laid-out container.
fn stage_with_container() -> (Stage, ScriptedEngine, ContainerId) {
    let engine = ScriptedEngine::new();
    let mut stage = Stage::new(Box::new(engine.clone()));
    let id = ready_container(&mut stage);
    (stage, engine, id)
}

/// Adds a container and walks it through ready → surface → layout.
fn ready_container(stage: &mut Stage) -> ContainerId {
    let id = stage.add_container(ParentId(0));
    stage.container_ready(id);
    stage.surface_event(id, SurfaceEvent::Created);
    stage.container_laid_out(id, 800, 600);
    id
}

/// Drives a container to `Started` on the given path.
fn start_playback(stage: &mut Stage, engine: &ScriptedEngine, id: ContainerId) {
    stage.set_item(id, Item::new(CLIP));
    stage.initialize_and_start(id);
    engine.push_prepared(1920, 1080, 60_000);
    stage.pump();
    assert_eq!(stage.player().state(), PlayerState::Started);
}

#[test]
fn handover_moves_binding_to_most_recent_container() {
    let (mut stage, engine, a) = stage_with_container();
    let b = ready_container(&mut stage);

    start_playback(&mut stage, &engine, a);

    stage.connect(b);
    let bound = stage.player().bound_controls();
    assert_eq!(bound, Some(stage.container(b).unwrap().controls().id()));
    assert!(!stage.container(a).unwrap().controls().is_attached());
    assert!(stage.container(b).unwrap().controls().is_attached());
}

#[test]
fn handover_back_to_first_container_rebinds_it() {
    let (mut stage, engine, a) = stage_with_container();
    let b = ready_container(&mut stage);

    start_playback(&mut stage, &engine, a);
    stage.connect(b);
    stage.connect(a);

    assert_eq!(
        stage.player().bound_controls(),
        Some(stage.container(a).unwrap().controls().id())
    );
    assert!(!stage.container(b).unwrap().controls().is_attached());
}

#[test]
fn detached_container_no_longer_receives_engine_events() {
    let (mut stage, engine, a) = stage_with_container();
    let b = ready_container(&mut stage);

    // A starts preparing, then B takes the binding mid-prepare.
    stage.set_item(a, Item::new(CLIP));
    stage.initialize_and_start(a);
    assert_eq!(stage.player().state(), PlayerState::Preparing);
    stage.connect(b);

    engine.push_prepared(1920, 1080, 60_000);
    stage.pump();

    // A's one-shot continuation was cleared with the handover: playback
    // never started and A was never marked initialized.
    assert_eq!(engine.start_calls(), 0);
    assert!(!stage.container(a).unwrap().is_initialized());
    // B's housekeeping listener ran instead (controls revealed).
    assert!(stage.container(b).unwrap().controls().is_visible());
}

#[test]
fn connect_is_idempotent_for_the_bound_container() {
    let (mut stage, _engine, a) = stage_with_container();

    stage.connect(a);
    let listeners_after_first = stage.player().prepared_listener_count();
    stage.connect(a);

    assert_eq!(stage.player().prepared_listener_count(), listeners_after_first);
}

#[test]
fn prepare_while_preparing_issues_no_second_request() {
    let (mut stage, engine, a) = stage_with_container();

    stage.set_item(a, Item::new(CLIP));
    stage.initialize_and_start(a);
    assert_eq!(engine.prepare_calls(), 1);

    // Second request rides on the in-flight preparation.
    stage.initialize_and_start(a);
    assert_eq!(engine.prepare_calls(), 1);

    engine.push_prepared(1920, 1080, 60_000);
    stage.pump();

    // Both queued continuations resolved against the single prepared
    // event, and playback started exactly once.
    assert_eq!(engine.prepare_calls(), 1);
    assert_eq!(engine.start_calls(), 1);
    assert_eq!(stage.player().state(), PlayerState::Started);
    assert!(stage.container(a).unwrap().is_initialized());
}

#[test]
fn first_error_triggers_exactly_one_automatic_retry() {
    let (mut stage, engine, a) = stage_with_container();

    stage.set_item(a, Item::new(CLIP));
    stage.initialize_and_start(a);
    assert_eq!(engine.prepare_calls(), 1);

    // First failure: the container re-attempts automatically.
    engine.push_error(100, -19);
    stage.pump();
    assert_eq!(engine.prepare_calls(), 2);
    assert!(!stage.container(a).unwrap().is_error_overlay_visible());

    // Second consecutive failure: no further retry, overlay shown.
    engine.push_error(100, -19);
    stage.pump();
    assert_eq!(engine.prepare_calls(), 2);
    assert!(stage.container(a).unwrap().is_error_overlay_visible());
    assert!(!stage.container(a).unwrap().taps_enabled());
}

#[test]
fn retry_counter_resets_once_playback_starts() {
    let (mut stage, engine, a) = stage_with_container();

    stage.set_item(a, Item::new(CLIP));
    stage.initialize_and_start(a);

    engine.push_error(100, 0);
    stage.pump(); // consumes the single retry

    engine.push_prepared(1920, 1080, 60_000);
    stage.pump();
    assert_eq!(stage.player().state(), PlayerState::Started);

    // A fresh error after Started gets a fresh retry budget.
    engine.push_error(100, 0);
    stage.pump();
    let prepares_after_retry = engine.prepare_calls();
    engine.push_prepared(1920, 1080, 60_000);
    stage.pump();
    assert_eq!(stage.player().state(), PlayerState::Started);
    assert!(prepares_after_retry > 2);
}

#[test]
fn fullscreen_toggle_during_prepare_settles_to_one_flip() {
    let (mut stage, engine, a) = stage_with_container();

    stage.set_item(a, Item::new(CLIP));
    stage.initialize_and_start(a);
    assert_eq!(stage.player().state(), PlayerState::Preparing);

    // Toggle while preparing: the flag flips, the body is deferred.
    stage.toggle_fullscreen(a);
    assert!(stage.container(a).unwrap().is_fullscreen());
    assert!(stage.container(a).unwrap().transition_in_flight());

    // A second toggle before the prepared event is rejected.
    stage.toggle_fullscreen(a);
    assert!(stage.container(a).unwrap().is_fullscreen());

    // Prepared: continuation starts playback, then the fullscreen body
    // runs, pauses it and re-parents the container.
    engine.push_prepared(1920, 1080, 60_000);
    stage.pump();
    assert!(stage.container(a).unwrap().transition_in_flight());

    // The re-parented container lays out; the transition settles.
    stage.container_laid_out(a, 1280, 720);

    let container = stage.container(a).unwrap();
    assert!(container.is_fullscreen());
    assert!(!container.transition_in_flight());
    assert!(container.surface().is_visible());
    // Playback was running before the body paused it, so it resumed.
    assert_eq!(stage.player().state(), PlayerState::Started);
}

#[test]
fn leaving_fullscreen_restores_geometry_and_chrome() {
    let (mut stage, engine, a) = stage_with_container();
    start_playback(&mut stage, &engine, a);

    stage.toggle_fullscreen(a);
    stage.container_laid_out(a, 1280, 720);
    assert!(stage.container(a).unwrap().is_fullscreen());
    assert!(stage.window().is_immersive());

    stage.toggle_fullscreen(a);
    stage.container_laid_out(a, 800, 600);

    let container = stage.container(a).unwrap();
    assert!(!container.is_fullscreen());
    assert!(!container.transition_in_flight());
    assert!(!stage.window().is_immersive());
    assert!(!stage.chrome().is_visible());
    assert_eq!(stage.player().state(), PlayerState::Started);
}

#[test]
fn surface_is_fit_to_container_preserving_aspect() {
    let (mut stage, engine, a) = stage_with_container();

    stage.set_item(a, Item::new(CLIP));
    stage.initialize_and_start(a);
    engine.push_prepared(1920, 1080, 60_000);
    stage.pump();

    assert_eq!(
        stage.container(a).unwrap().surface().layout_size(),
        Some((800, 450))
    );
}

#[test]
fn portrait_video_is_height_bound() {
    let engine = ScriptedEngine::new();
    let mut stage = Stage::new(Box::new(engine.clone()));
    let a = stage.add_container(ParentId(0));
    stage.container_ready(a);
    stage.surface_event(a, SurfaceEvent::Created);
    stage.container_laid_out(a, 400, 800);

    stage.set_item(a, Item::new(CLIP));
    stage.initialize_and_start(a);
    engine.push_prepared(1080, 1920, 60_000);
    stage.pump();

    assert_eq!(
        stage.container(a).unwrap().surface().layout_size(),
        Some((450, 800))
    );
}

#[test]
fn measurement_defers_until_the_container_is_laid_out() {
    let engine = ScriptedEngine::new();
    let mut stage = Stage::new(Box::new(engine.clone()));
    let a = stage.add_container(ParentId(0));
    stage.container_ready(a);
    stage.surface_event(a, SurfaceEvent::Created);
    // No layout pass yet: measured box is (0, 0).

    stage.set_item(a, Item::new(CLIP));
    stage.initialize_and_start(a);
    engine.push_prepared(1920, 1080, 60_000);
    stage.pump();
    assert_eq!(stage.container(a).unwrap().surface().layout_size(), None);

    stage.container_laid_out(a, 800, 600);
    assert_eq!(
        stage.container(a).unwrap().surface().layout_size(),
        Some((800, 450))
    );
}

#[test]
fn save_while_playing_pauses_and_requests_resume() {
    let (mut stage, engine, a) = stage_with_container();
    start_playback(&mut stage, &engine, a);

    let saved = stage.save_container(a);

    assert!(saved.resume_playback);
    assert!(saved.connected);
    assert_eq!(saved.item_path.as_deref(), Some(Path::new(CLIP)));
    assert_eq!(stage.player().state(), PlayerState::Paused);
}

#[test]
fn restore_reaches_started_without_resetting_the_source() {
    let (mut stage, engine, a) = stage_with_container();
    start_playback(&mut stage, &engine, a);
    assert_eq!(engine.set_source_calls(), 1);

    let saved = stage.save_container(a);
    stage.remove_container(a);

    // The page is recreated: a new container restores the saved slice.
    let b = stage.add_container(ParentId(0));
    stage.restore_container(b, &saved, None);
    stage.surface_event(b, SurfaceEvent::Created);
    stage.container_ready(b);
    stage.container_laid_out(b, 800, 600);
    stage.pump();

    assert_eq!(stage.player().state(), PlayerState::Started);
    // The path was unchanged, so the source was never set again.
    assert_eq!(engine.set_source_calls(), 1);
}

#[test]
fn saved_state_survives_a_cbor_round_trip() {
    let (mut stage, engine, a) = stage_with_container();
    start_playback(&mut stage, &engine, a);

    let saved = stage.save_container(a);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("container.cbor");
    clipdock::persist::save_to(&saved, &path).unwrap();
    let loaded: SavedContainer = clipdock::persist::load_from(&path).unwrap();
    assert_eq!(loaded, saved);
}

#[test]
fn operations_before_ready_replay_in_order() {
    let engine = ScriptedEngine::new();
    let mut stage = Stage::new(Box::new(engine.clone()));
    let a = stage.add_container(ParentId(0));
    stage.surface_event(a, SurfaceEvent::Created);

    // Requested before the root view exists: both are buffered.
    stage.set_item(a, Item::new(CLIP));
    stage.initialize_and_start(a);
    stage.toggle_fullscreen(a);
    assert_eq!(engine.prepare_calls(), 0);
    assert!(!stage.container(a).unwrap().is_fullscreen());

    stage.container_ready(a);

    // Replay ran initialize (prepare issued) then the fullscreen toggle
    // (deferred behind the in-flight prepare).
    assert_eq!(engine.prepare_calls(), 1);
    assert!(stage.container(a).unwrap().is_fullscreen());
    assert!(stage.container(a).unwrap().transition_in_flight());
}

#[test]
fn surface_attachment_is_deferred_until_creation() {
    let engine = ScriptedEngine::new();
    let mut stage = Stage::new(Box::new(engine.clone()));
    let a = stage.add_container(ParentId(0));
    stage.container_ready(a);

    // Surface does not exist yet: connect leaves the display detached.
    stage.connect(a);
    assert_eq!(engine.display_target(), None);

    stage.surface_event(a, SurfaceEvent::Created);
    assert!(engine.display_target().is_some());
}

#[test]
fn surface_destruction_leaves_the_display_target_for_point_of_use_checks() {
    let (mut stage, engine, a) = stage_with_container();
    stage.connect(a);
    let attached = engine.display_target();
    assert!(attached.is_some());

    stage.surface_event(a, SurfaceEvent::Destroyed);
    // No eager detach: validity is re-checked when the display is next
    // used, and a recreated surface re-attaches with a new generation.
    assert_eq!(engine.display_target(), attached);

    stage.surface_event(a, SurfaceEvent::Created);
    assert_ne!(engine.display_target(), attached);
}

#[test]
fn play_intent_initializes_then_toggles() {
    let (mut stage, engine, a) = stage_with_container();
    stage.set_item(a, Item::new(CLIP));

    // First press: container not initialized, runs the full sequence.
    assert!(stage.handle_intent(a, Intent::PlayPause));
    engine.push_prepared(1920, 1080, 60_000);
    stage.pump();
    assert_eq!(stage.player().state(), PlayerState::Started);

    // Subsequent presses toggle.
    stage.handle_intent(a, Intent::PlayPause);
    assert_eq!(stage.player().state(), PlayerState::Paused);
    stage.handle_intent(a, Intent::PlayPause);
    assert_eq!(stage.player().state(), PlayerState::Started);
}

#[test]
fn back_intent_is_consumed_only_in_fullscreen() {
    let (mut stage, engine, a) = stage_with_container();
    start_playback(&mut stage, &engine, a);

    assert!(!stage.handle_intent(a, Intent::Back));

    stage.toggle_fullscreen(a);
    stage.container_laid_out(a, 1280, 720);
    assert!(stage.handle_intent(a, Intent::Back));
    stage.container_laid_out(a, 800, 600);
    assert!(!stage.container(a).unwrap().is_fullscreen());
}

#[test]
fn preview_follows_playback_state() {
    let (mut stage, engine, a) = stage_with_container();

    assert!(stage.container(a).unwrap().is_preview_visible());
    start_playback(&mut stage, &engine, a);
    assert!(!stage.container(a).unwrap().is_preview_visible());

    stage.handle_intent(a, Intent::PlayPause);
    assert_eq!(stage.player().state(), PlayerState::Paused);
    assert!(!stage.container(a).unwrap().is_preview_visible());
}

#[test]
fn pending_item_preview_is_delivered_once() {
    let (mut stage, _engine, a) = stage_with_container();

    let item = Item::new(CLIP);
    stage.set_item(a, item.clone());
    assert!(stage.container(a).unwrap().preview_image().is_none());

    stage.deliver_preview(&item, image::DynamicImage::new_rgba8(4, 4));
    assert!(stage.container(a).unwrap().preview_image().is_some());

    // The subscription was one-shot: a second delivery finds no listeners.
    let (_, listeners) = item.set_preview(image::DynamicImage::new_rgba8(8, 8));
    assert!(listeners.is_empty());
}
