//! Moonframe demo entry point.
//!
//! Runs a small scene against the headless backends: drifting sprite models
//! with collision checks, a line grid, orbiting points, a text label and a
//! sound. With `--font-thread` a worker thread loads fonts in producer mode
//! while the first frames run.
//!
//! # Running
//!
//! ```sh
//! RUST_LOG=debug cargo run -- --frames 240 --font-thread
//! ```

use std::path::PathBuf;
use std::thread::JoinHandle;

use clap::Parser;
use glam::Vec2;

use moonframe::backend::headless::headless_backends;
use moonframe::components::collisionbox::Rect;
use moonframe::components::color::Color;
use moonframe::components::line::Line;
use moonframe::components::model::Model;
use moonframe::components::point::Point;
use moonframe::components::text::Text;
use moonframe::resources::engineconfig::EngineConfig;
use moonframe::resources::fontregistry::FontRegistry;
use moonframe::{Engine, EngineResult};

const MODEL_COUNT: u32 = 8;
const LABEL_FONT: u32 = 1;
const WORKER_FONTS: std::ops::Range<u32> = 100..110;

/// Moonframe 2D engine demo
#[derive(Parser)]
#[command(version, about = "Moonframe engine core demo on headless backends")]
struct Cli {
    /// Path of the INI configuration file.
    #[arg(long, value_name = "PATH", default_value = "config.ini")]
    config: PathBuf,

    /// Number of frames to run before exiting.
    #[arg(long, default_value_t = 180)]
    frames: u32,

    /// Load extra fonts from a producer thread while the scene runs.
    #[arg(long)]
    font_thread: bool,
}

fn build_scene(engine: &mut Engine) -> EngineResult<()> {
    let (width, height) = engine.screen_size();

    engine.fonts().create_ttf(LABEL_FONT, "assets/fonts/mono.ttf", 16)?;

    for id in 1..=MODEL_COUNT {
        engine.model_create(id)?;
        engine.model_create_texture(id, 1, "assets/ship.png")?;
        let x = fastrand::u32(0..width.saturating_sub(32).max(1)) as f32;
        let y = fastrand::u32(0..height.saturating_sub(32).max(1)) as f32;
        let heading = Vec2::from_angle(fastrand::f32() * std::f32::consts::TAU) * 60.0;
        engine.try_with_mut::<Model, _>(id, |m| {
            m.set_position(x, y);
            m.add_collision_rect(1, Rect::new(4, 4, 24, 24))?;
            m.directions_mut().add(0, heading)?;
            m.set_visible(true);
            m.set_zindex(2 + id % 3)
        })?;
    }

    for id in 1..=4 {
        engine.line_create(id)?;
        let x = (width / 5 * id) as i32;
        engine.try_with_mut::<Line, _>(id, |l| {
            l.set(x, 0, x, height as i32);
            l.color = Color::rgb(40, 40, 80);
            l.set_visible(true);
            l.set_zindex(1)
        })?;
    }

    for id in 1..=3 {
        engine.point_create(id)?;
        engine.try_with_mut::<Point, _>(id, |p| {
            p.set_position((width / 2) as i32 + 40 * id as i32, (height / 2) as i32);
            p.set_color(Color::rgb(255, 200, 0));
            p.set_visible(true);
            p.set_zindex(6)
        })?;
    }

    engine.text_create(1)?;
    engine.try_with_mut::<Text, _>(1, |t| {
        t.relate_font(LABEL_FONT);
        t.add_str("moonframe");
        t.submit();
        t.set_position(8, 8);
        t.set_visible(true);
        t.set_zindex(10)
    })?;
    engine.text_prepare_for_drawing(1)?;

    engine.sound_create(1)?;
    engine.sound_load(1, "assets/sounds/start.wav")?;
    engine.sound_play(1, 0)?;

    engine.time_event_create(1, 2_000)?;
    Ok(())
}

/// Switch the font registry into producer mode and load fonts on a worker.
fn spawn_font_worker(fonts: FontRegistry) -> JoinHandle<()> {
    fonts.set_producer_mode(true);
    std::thread::spawn(move || {
        for id in WORKER_FONTS {
            let size = 8 + id % 24;
            if let Err(err) = fonts.create_ttf(id, "assets/fonts/worker.ttf", size) {
                log::error!("worker font {} failed: {}", id, err);
            }
        }
        fonts.log_lists();
        fonts.set_producer_mode(false);
    })
}

fn update_scene(engine: &mut Engine) -> EngineResult<()> {
    let (width, height) = engine.screen_size();
    for id in 1..=MODEL_COUNT {
        engine.model_move(id, 0)?;
        let position = engine.get::<Model>(id)?.position();
        // Bounce off the screen edges.
        let bounce = Vec2::new(
            if position.x < 0.0 || position.x > width as f32 - 32.0 { -1.0 } else { 1.0 },
            if position.y < 0.0 || position.y > height as f32 - 32.0 { -1.0 } else { 1.0 },
        );
        if bounce != Vec2::ONE {
            engine.try_with_mut::<Model, _>(id, |m| {
                let heading = m.directions().get(0)?;
                m.directions_mut().change(0, heading * bounce)
            })?;
        }
    }

    for a in 1..=MODEL_COUNT {
        for b in (a + 1)..=MODEL_COUNT {
            if engine.model_check_collision(a, b)? {
                log::debug!("models {} and {} collide", a, b);
            }
        }
    }

    let center = Vec2::new(
        engine.screen_size().0 as f32 / 2.0,
        engine.screen_size().1 as f32 / 2.0,
    );
    for id in 1..=3 {
        engine.point_rotate_around(id, center, 45.0 * id as f32)?;
    }

    if engine.time_event_reached(1)? {
        log::info!("two seconds of engine time passed");
        engine.time_event_delete(1)?;
    }
    Ok(())
}

fn run(cli: Cli) -> EngineResult<()> {
    let mut config = EngineConfig::with_path(&cli.config);
    if let Err(err) = config.load_from_file() {
        log::warn!("{}; using defaults", err);
    }

    let (backends, probes) = headless_backends();
    let mut engine = Engine::new(config, backends)?;
    build_scene(&mut engine)?;

    let mut worker = cli.font_thread.then(|| spawn_font_worker(engine.fonts()));

    for _ in 0..cli.frames {
        engine.begin_frame();
        update_scene(&mut engine)?;
        let report = engine.draw_frame()?;
        engine.end_frame()?;

        if !report.failures.is_empty() {
            log::warn!("{} draw failures this frame", report.failures.len());
        }
        if engine.recent_fps_available() {
            log::info!("fps: {}", engine.fps());
        }
        if worker.as_ref().is_some_and(|w| w.is_finished()) {
            if let Some(handle) = worker.take() {
                if handle.join().is_err() {
                    log::error!("font worker panicked");
                }
            }
        }
        if engine.should_quit() {
            break;
        }
        engine.limit_frame_rate();
    }

    if let Some(handle) = worker.take() {
        let _ = handle.join();
    }
    // Pick up anything the worker left in the buffer.
    engine.begin_frame();

    let stats = engine.frame_stats();
    log::info!(
        "{} frames, {} fonts, {} draw calls recorded, {} draw failures",
        stats.frame_count,
        engine.fonts().count(),
        probes.render.calls().len(),
        stats.draw_failures
    );
    engine.shutdown();
    log::info!("audio calls: {:?}", probes.audio.calls());
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        log::error!("{}", err);
        std::process::exit(1);
    }
}
