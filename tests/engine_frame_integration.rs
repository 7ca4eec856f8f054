//! Frame controller integration tests.
//!
//! These drive a full [`Engine`] through the headless backends and observe
//! its behavior through the recorded backend calls.
//!
//! # Test Categories
//!
//! 1. **Startup** - backend initialization failures
//! 2. **Draw scheduler** - z ordering, unassigned z-index, non-fatal failures
//! 3. **Collision** - model scenario, broad-phase rejection
//! 4. **Time** - time events, frame statistics
//! 5. **Input** - key/mouse folding, focus, quit
//! 6. **Audio** - command order on the audio thread, lock flag, failed sends
//! 7. **Teardown** - handle release

use std::time::Duration;

use glam::Vec2;

use moonframe::backend::EngineBackends;
use moonframe::backend::headless::{
    AudioCall, DrawCall, HeadlessFonts, HeadlessInput, HeadlessRenderer, NullAudio,
    headless_backends, HeadlessProbes,
};
use moonframe::components::collisionbox::Rect;
use moonframe::components::color::Color;
use moonframe::components::line::Line;
use moonframe::components::model::Model;
use moonframe::components::sound::{Sound, SoundLoad};
use moonframe::components::text::Text;
use moonframe::error::{BackendError, EntityKind};
use moonframe::resources::engineconfig::EngineConfig;
use moonframe::resources::input::{InputSnapshot, KeyCode, KeyState, MouseButton, Transition};
use moonframe::systems::collision::CollisionCheck;
use moonframe::{Engine, EngineError, EngineResult};

const FRAME: f32 = 0.1;

fn engine() -> (Engine, HeadlessProbes) {
    let (backends, probes) = headless_backends();
    let engine = Engine::new(EngineConfig::new(), backends).unwrap();
    (engine, probes)
}

fn frame(engine: &mut Engine) -> moonframe::systems::render::DrawReport {
    engine.begin_frame_with_delta(FRAME);
    let report = engine.draw_frame().unwrap();
    engine.end_frame().unwrap();
    report
}

fn textured_model(engine: &mut Engine, id: u32, x: f32, y: f32, z: u32) {
    engine.model_create(id).unwrap();
    engine.model_create_texture(id, 1, "ship.png").unwrap();
    engine
        .try_with_mut::<Model, _>(id, |m| {
            m.set_position(x, y);
            m.set_visible(true);
            m.set_zindex(z)
        })
        .unwrap();
}

// =============================================================================
// Startup
// =============================================================================

#[test]
fn unavailable_audio_device_fails_startup() {
    let backends = EngineBackends {
        render: Box::new(HeadlessRenderer::new()),
        input: Box::new(HeadlessInput::new()),
        fonts: std::sync::Arc::new(HeadlessFonts::new()),
        audio: Box::new(NullAudio::unavailable()),
    };
    match Engine::new(EngineConfig::new(), backends) {
        Err(EngineError::Init(msg)) => assert!(msg.contains("audio")),
        Err(other) => panic!("unexpected error {other}"),
        Ok(_) => panic!("engine started without an audio device"),
    }
}

#[test]
fn zero_sized_window_fails_startup() {
    let (backends, _) = headless_backends();
    let mut config = EngineConfig::new();
    config.window.width = 0;
    assert!(matches!(
        Engine::new(config, backends),
        Err(EngineError::Init(_))
    ));
}

// =============================================================================
// Draw scheduler
// =============================================================================

#[test]
fn higher_zindex_is_drawn_after_lower() {
    let (mut engine, probes) = engine();
    textured_model(&mut engine, 1, 30.0, 0.0, 3);
    textured_model(&mut engine, 2, 10.0, 0.0, 1);
    textured_model(&mut engine, 3, 20.0, 0.0, 2);

    let report = frame(&mut engine);
    assert_eq!(report.drawn, 3);

    let xs: Vec<f32> = probes.render.blits().iter().map(|b| b.position.x).collect();
    assert_eq!(xs, vec![10.0, 20.0, 30.0]);

    let calls = probes.render.calls();
    assert!(matches!(calls.first(), Some(DrawCall::Clear(_))));
    assert!(matches!(calls.last(), Some(DrawCall::Present)));
}

#[test]
fn unassigned_zindex_is_never_drawn() {
    let (mut engine, probes) = engine();
    engine.model_create(1).unwrap();
    engine.model_create_texture(1, 1, "ship.png").unwrap();
    engine
        .with_mut::<Model, _>(1, |m| m.set_visible(true))
        .unwrap();

    let report = frame(&mut engine);
    assert_eq!(report.drawn, 0);
    assert_eq!(report.skipped_unassigned, 1);
    assert!(probes.render.blits().is_empty());

    // Setters reject the sentinel.
    assert!(matches!(
        engine.try_with_mut::<Model, _>(1, |m| m.set_zindex(0)),
        Err(EngineError::InvalidArgument(_))
    ));
}

#[test]
fn a_failing_entity_does_not_abort_the_frame() {
    let (mut engine, probes) = engine();
    engine.text_create(5).unwrap();
    engine
        .try_with_mut::<Text, _>(5, |t| {
            t.set_visible(true);
            t.set_zindex(1)
        })
        .unwrap();
    engine.line_create(1).unwrap();
    engine
        .try_with_mut::<Line, _>(1, |l| {
            l.set(0, 0, 10, 10);
            l.set_visible(true);
            l.set_zindex(2)
        })
        .unwrap();

    let report = frame(&mut engine);
    assert_eq!(report.drawn, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].kind, EntityKind::Text);
    assert_eq!(report.failures[0].id, 5);
    assert!(
        probes
            .render
            .calls()
            .iter()
            .any(|c| matches!(c, DrawCall::Line { .. }))
    );

    frame(&mut engine);
    assert_eq!(engine.frame_stats().draw_failures, 2);
}

#[test]
fn prepared_text_is_blitted_with_its_texture_size() {
    let (mut engine, probes) = engine();
    engine.fonts().create_ttf(1, "mono.ttf", 16).unwrap();
    engine.text_create(1).unwrap();
    engine
        .try_with_mut::<Text, _>(1, |t| {
            t.relate_font(1);
            t.add_str("score");
            t.submit();
            t.set_position(4, 8);
            t.set_visible(true);
            t.set_zindex(1)
        })
        .unwrap();
    let info = engine.text_prepare_for_drawing(1).unwrap();
    assert_eq!((info.width, info.height), (40, 16));

    // Re-preparing releases the previous texture.
    engine.text_prepare_for_drawing(1).unwrap();
    assert_eq!(probes.fonts.text_count(), 1);

    frame(&mut engine);
    let blits = probes.render.blits();
    assert_eq!(blits.len(), 1);
    assert_eq!(blits[0].position, Vec2::new(4.0, 8.0));
    assert_eq!(blits[0].size, Vec2::new(40.0, 16.0));
}

#[test]
fn text_without_font_cannot_be_prepared() {
    let (mut engine, _) = engine();
    engine.text_create(1).unwrap();
    engine
        .with_mut::<Text, _>(1, |t| {
            t.add_str("x");
            t.submit();
        })
        .unwrap();
    assert!(matches!(
        engine.text_prepare_for_drawing(1),
        Err(EngineError::InvalidArgument(_))
    ));

    engine.with_mut::<Text, _>(1, |t| t.relate_font(9)).unwrap();
    assert!(engine.text_prepare_for_drawing(1).unwrap_err().is_not_found());
}

// =============================================================================
// Collision
// =============================================================================

#[test]
fn model_collision_scenario() {
    let (mut engine, _) = engine();
    engine.model_create(1).unwrap();
    engine
        .try_with_mut::<Model, _>(1, |m| {
            m.set_position(100.0, 100.0);
            m.set_size(32, 32);
            m.add_collision_rect(1, Rect::new(0, 0, 32, 32))
        })
        .unwrap();
    engine.model_create(2).unwrap();
    engine
        .with_mut::<Model, _>(2, |m| {
            m.set_position(200.0, 200.0);
            m.set_size(32, 32);
        })
        .unwrap();

    assert!(!engine.model_check_collision(1, 2).unwrap());
    assert!(!engine.model_check_frame_box_collision(1, 2).unwrap());

    engine
        .with_mut::<Model, _>(2, |m| m.set_position(110.0, 110.0))
        .unwrap();
    assert!(engine.model_check_collision(1, 2).unwrap());
    assert!(engine.model_check_collision(2, 1).unwrap());
}

#[test]
fn distant_models_are_rejected_before_the_fine_phase() {
    let (mut engine, _) = engine();
    for (id, x) in [(1, 0.0), (2, 500.0)] {
        engine.model_create(id).unwrap();
        engine
            .try_with_mut::<Model, _>(id, |m| {
                m.set_position(x, 0.0);
                m.set_size(16, 16);
                m.add_collision_rect(1, Rect::new(0, 0, 8, 8))?;
                m.add_collision_rect(2, Rect::new(8, 8, 8, 8))
            })
            .unwrap();
    }
    let check = engine.model_collision(1, 2).unwrap();
    assert_eq!(check, CollisionCheck::FrameMiss);
    assert_eq!(check.pairs_tested(), 0);

    assert!(engine.model_check_collision(1, 3).unwrap_err().is_not_found());
}

#[test]
fn moving_along_a_direction_uses_the_timestep() {
    let (mut engine, _) = engine();
    engine.model_create(1).unwrap();
    engine
        .try_with_mut::<Model, _>(1, |m| m.directions_mut().add(0, Vec2::new(50.0, 0.0)))
        .unwrap();
    engine.begin_frame_with_delta(0.5);
    engine.model_move(1, 0).unwrap();
    assert_eq!(engine.get::<Model>(1).unwrap().position(), Vec2::new(25.0, 0.0));
    assert!(engine.model_move(1, 4).is_err());
}

// =============================================================================
// Time
// =============================================================================

#[test]
fn time_events_are_reached_during_begin_frame() {
    let (mut engine, _) = engine();
    engine.time_event_create(1, 250).unwrap();
    engine.time_event_create(2, 150).unwrap();

    engine.begin_frame_with_delta(FRAME);
    assert!(!engine.time_event_reached(1).unwrap());
    engine.begin_frame_with_delta(FRAME);
    assert!(engine.time_event_reached(2).unwrap());

    // Only events not yet reached are extended.
    engine.time_event_extend_all(100);
    engine.begin_frame_with_delta(FRAME);
    assert!(!engine.time_event_reached(1).unwrap());
    engine.begin_frame_with_delta(FRAME);
    assert!(engine.time_event_reached(1).unwrap());
    assert_eq!(engine.timestamp(), 400);
}

#[test]
fn fps_is_published_after_one_second() {
    let (mut engine, _) = engine();
    for _ in 0..10 {
        frame(&mut engine);
        assert!(!engine.recent_fps_available());
    }
    frame(&mut engine);
    assert_eq!(engine.fps(), 10);
    assert!(engine.recent_fps_available());
    assert!(!engine.recent_fps_available());
    assert_eq!(engine.frame_stats().frame_count, 11);
}

// =============================================================================
// Input
// =============================================================================

#[test]
fn key_and_mouse_transitions_are_folded_per_frame() {
    let (mut engine, probes) = engine();
    let space = KeyCode(32);
    probes.input.push(
        InputSnapshot::default()
            .key_down(space)
            .mouse(MouseButton::Left, Transition::Down)
            .mouse_at(12, 34),
    );
    probes.input.push(InputSnapshot::default().key_up(space));

    engine.begin_frame_with_delta(FRAME);
    assert!(engine.key_event(KeyState::Pressed, space));
    assert!(!engine.key_event(KeyState::Released, space));
    assert!(engine.mouse_event(KeyState::Pressed, MouseButton::Left));
    assert_eq!(engine.mouse_position(), glam::IVec2::new(12, 34));

    engine.begin_frame_with_delta(FRAME);
    assert!(!engine.key_event(KeyState::Pressed, space));
    assert!(engine.key_event(KeyState::Released, space));
    // Buttons stay down until released.
    assert!(engine.mouse_event(KeyState::Pressed, MouseButton::Left));

    engine.begin_frame_with_delta(FRAME);
    assert!(!engine.key_event(KeyState::Released, space));
}

#[test]
fn focus_and_quit_reach_the_window_state() {
    let (mut engine, probes) = engine();
    probes.input.push(InputSnapshot {
        focus: Some(false),
        ..InputSnapshot::default()
    });
    probes.input.push(InputSnapshot {
        focus: Some(true),
        quit_requested: true,
        ..InputSnapshot::default()
    });

    engine.begin_frame_with_delta(FRAME);
    assert!(!engine.window_focused());
    assert!(!engine.should_quit());

    engine.begin_frame_with_delta(FRAME);
    assert!(engine.window_focused());
    assert!(engine.window().focus_gained);
    assert!(engine.should_quit());
}

// =============================================================================
// Audio
// =============================================================================

#[test]
fn audio_commands_run_in_order_on_the_audio_thread() {
    let (mut engine, probes) = engine();
    engine.sound_create(1).unwrap();
    engine.sound_load(1, "jump.wav").unwrap();
    assert!(engine.sound_play(1, 2).unwrap());
    engine.sound_volume(64).unwrap();

    engine.sound_set_locked(1, true).unwrap();
    assert!(!engine.sound_play(1, 0).unwrap());

    engine.shutdown();
    let calls = probes.audio.calls();
    assert!(matches!(calls[0], AudioCall::Open { .. }));
    let sample = match &calls[1] {
        AudioCall::Load { path, sample } => {
            assert_eq!(path, "jump.wav");
            *sample
        }
        other => panic!("expected a load, got {other:?}"),
    };
    assert_eq!(calls[2], AudioCall::Play { sample, loops: 2 });
    assert_eq!(calls[3], AudioCall::Volume(64));
    assert_eq!(calls[4], AudioCall::Free(sample));
    assert_eq!(calls.len(), 5);
}

#[test]
fn load_results_are_applied_to_the_sound_registry() {
    let (mut engine, _) = engine();
    engine.sound_create(1).unwrap();
    engine.sound_create(2).unwrap();
    engine.sound_load(1, "ok.wav").unwrap();
    engine.sound_load(2, "broken.mp3").unwrap();

    let mut settled = false;
    for _ in 0..200 {
        engine.begin_frame_with_delta(FRAME);
        let sounds = engine.registry::<Sound>();
        let first = sounds.get(1).unwrap().is_ready();
        let second = matches!(sounds.get(2).unwrap().load, SoundLoad::Failed { .. });
        if first && second {
            settled = true;
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    assert!(settled, "audio thread never answered");
    assert!(matches!(
        engine.sound_play(2, 0),
        Err(EngineError::InvalidArgument(_))
    ));
}

#[test]
fn empty_sounds_cannot_be_played() {
    let (mut engine, _) = engine();
    engine.sound_create(1).unwrap();
    assert!(matches!(
        engine.sound_play(1, 0),
        Err(EngineError::InvalidArgument(_))
    ));
    assert!(engine.sound_play(2, 0).unwrap_err().is_not_found());
}

#[test]
fn delete_all_unloads_every_sample() {
    let (mut engine, probes) = engine();
    for id in 1..=3 {
        engine.sound_create(id).unwrap();
    }
    engine.sound_load(1, "a.wav").unwrap();
    engine.sound_load(2, "b.wav").unwrap();

    assert_eq!(engine.sound_delete_all().unwrap(), 3);
    assert_eq!(engine.count::<Sound>(), 0);
    engine.sound_create(1).unwrap();

    engine.shutdown();
    let calls = probes.audio.calls();
    let loads = calls
        .iter()
        .filter(|c| matches!(c, AudioCall::Load { .. }))
        .count();
    let frees = calls
        .iter()
        .filter(|c| matches!(c, AudioCall::Free(_)))
        .count();
    assert_eq!((loads, frees), (2, 2));
    assert!(matches!(calls.last(), Some(AudioCall::Free(_))));
}

fn unavailable<T>(result: EngineResult<T>) -> bool {
    matches!(
        result,
        Err(EngineError::Backend(BackendError::Unavailable(_)))
    )
}

#[test]
fn sound_changes_are_not_applied_without_the_audio_thread() {
    let (mut engine, _) = engine();
    engine.sound_create(1).unwrap();
    engine.sound_load(1, "a.wav").unwrap();
    engine.sound_create(2).unwrap();
    engine.shutdown();

    // The sound survives a failed delete, so a retry fails the same way.
    assert!(unavailable(engine.sound_delete(1)));
    assert!(unavailable(engine.sound_delete(1)));
    assert_eq!(engine.count::<Sound>(), 2);

    // A failed load leaves the sound empty and unplayable.
    assert!(unavailable(engine.sound_load(2, "b.wav")));
    assert_eq!(engine.get::<Sound>(2).unwrap().load, SoundLoad::Empty);
    assert!(matches!(
        engine.sound_play(2, 0),
        Err(EngineError::InvalidArgument(_))
    ));

    assert!(unavailable(engine.sound_delete_all()));
    assert_eq!(engine.count::<Sound>(), 2);

    // Empty sounds need no unload.
    engine.sound_delete(2).unwrap();
    assert_eq!(engine.count::<Sound>(), 1);
}

// =============================================================================
// Teardown
// =============================================================================

#[test]
fn shutdown_releases_every_backend_handle() {
    let (mut engine, probes) = engine();
    textured_model(&mut engine, 1, 0.0, 0.0, 1);
    textured_model(&mut engine, 2, 0.0, 0.0, 1);
    engine.fonts().create_ttf(1, "mono.ttf", 12).unwrap();
    engine.text_create(1).unwrap();
    engine
        .with_mut::<Text, _>(1, |t| {
            t.relate_font(1);
            t.add_str("bye");
            t.submit();
        })
        .unwrap();
    engine.text_prepare_for_drawing(1).unwrap();

    engine.model_delete(2).unwrap();
    assert_eq!(probes.render.live_textures(), 1);

    engine.shutdown();
    assert_eq!(probes.render.live_textures(), 0);
    assert_eq!(probes.fonts.text_count(), 0);
    assert_eq!(probes.fonts.loaded_count(), 0);
    assert_eq!(engine.count::<Model>(), 0);

    // A second shutdown (and the one on drop) is a no-op.
    engine.shutdown();
}

#[test]
fn background_colour_is_used_for_clear() {
    let (mut engine, probes) = engine();
    engine.set_background(Color::rgb(10, 20, 30));
    frame(&mut engine);
    assert_eq!(
        probes.render.calls().first(),
        Some(&DrawCall::Clear(Color::rgb(10, 20, 30)))
    );
}
