//! Engine context and frame controller.
//!
//! [`Engine`] owns the ECS [`World`] holding every registry and resource, the
//! per-frame update [`Schedule`], and the render and input backends. There is
//! no global state: client code holds the engine and drives it with
//!
//! 1. [`Engine::begin_frame`] – poll input, advance time, run the update
//!    schedule (fold input, time events, audio replies, font merge)
//! 2. client update logic through the facade methods below
//! 3. [`Engine::draw_frame`] – clear and run the draw scheduler
//! 4. [`Engine::end_frame`] – present and update frame statistics
//!
//! [`Engine::run_frame`] does 1, 3 and 4 in one call.
//!
//! Backend handles held by entities are released in [`Engine::shutdown`],
//! which also runs on drop.

use std::time::{Duration, Instant};

use bevy_ecs::prelude::*;
use glam::{IVec2, Vec2};

use crate::backend::{EngineBackends, InputBackend, RenderBackend, TextureInfo};
use crate::components::color::Color;
use crate::components::line::{Line, LineRegistry};
use crate::components::model::{Model, ModelRegistry};
use crate::components::point::{Point, PointRegistry};
use crate::components::sound::{Sound, SoundLoad, SoundRegistry};
use crate::components::text::{Text, TextRegistry};
use crate::components::timeevent::{TimeEvent, TimeEventRegistry};
use crate::components::video::{Video, VideoRegistry};
use crate::error::{BackendError, EngineError, EngineResult};
use crate::events::audio::AudioCmd;
use crate::registry::{Registry, RegistryEntry};
use crate::resources::audio::{AudioBridge, setup_audio, shutdown_audio};
use crate::resources::engineconfig::EngineConfig;
use crate::resources::fontregistry::FontRegistry;
use crate::resources::input::{InputSnapshot, InputState, KeyCode, KeyState, MouseButton};
use crate::resources::stats::{FrameStats, SharedStats};
use crate::resources::window::WindowState;
use crate::resources::worldtime::WorldTime;
use crate::systems::audio::{
    apply_audio_messages, poll_audio_messages, update_bevy_audio_messages,
};
use crate::systems::collision::{CollisionCheck, check_collision, frame_boxes_overlap};
use crate::systems::fonts::merge_fonts_at_safe_point;
use crate::systems::input::update_input_state;
use crate::systems::render::{DrawReport, insert_drawable_registries, render_pass};
use crate::systems::time::{update_time_events, update_world_time};

pub struct Engine {
    world: World,
    update: Schedule,
    render: Box<dyn RenderBackend>,
    input: Box<dyn InputBackend>,
    last_frame: Instant,
    frame_started: Instant,
    shut_down: bool,
}

impl Engine {
    /// Initialize every backend and build the engine context.
    ///
    /// Any backend that fails to start aborts construction with
    /// [`EngineError::Init`].
    pub fn new(config: EngineConfig, backends: EngineBackends) -> EngineResult<Self> {
        let EngineBackends {
            mut render,
            input,
            fonts,
            audio,
        } = backends;

        render
            .init(&config.window)
            .map_err(|e| EngineError::Init(format!("render backend: {e}")))?;
        fonts
            .init()
            .map_err(|e| EngineError::Init(format!("font backend: {e}")))?;

        let (width, height) = render.screen_size();
        let mut world = World::new();
        world.insert_resource(WorldTime::default());
        world.insert_resource(WindowState::new(width, height));
        world.insert_resource(InputSnapshot::default());
        world.insert_resource(InputState::default());
        world.insert_resource(SharedStats::new());
        world.insert_resource(FontRegistry::new(fonts));
        insert_drawable_registries(&mut world);
        world.insert_resource(SoundRegistry::new());
        world.insert_resource(TimeEventRegistry::new());
        world.insert_resource(VideoRegistry::new());
        setup_audio(&mut world, audio, config.audio)?;

        log::info!(
            "engine started: '{}' {}x{}, target {} fps",
            config.window.title,
            width,
            height,
            config.target_fps
        );
        world.insert_resource(config);

        let mut update = Schedule::default();
        update.add_systems(
            (
                update_input_state,
                update_time_events,
                poll_audio_messages,
                apply_audio_messages,
                update_bevy_audio_messages,
                merge_fonts_at_safe_point,
            )
                .chain(),
        );

        let now = Instant::now();
        Ok(Self {
            world,
            update,
            render,
            input,
            last_frame: now,
            frame_started: now,
            shut_down: false,
        })
    }

    // ---- frame controller ----------------------------------------------

    /// Start a frame using the wall-clock time since the previous one.
    pub fn begin_frame(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.begin_frame_with_delta(dt);
    }

    /// Start a frame with an explicit delta in seconds.
    pub fn begin_frame_with_delta(&mut self, dt: f32) {
        self.frame_started = Instant::now();
        let snapshot = self.input.poll();
        self.world.insert_resource(snapshot);

        let (width, height) = self.render.screen_size();
        {
            let mut window = self.world.resource_mut::<WindowState>();
            window.width = width;
            window.height = height;
        }

        update_world_time(&mut self.world, dt);
        self.update.run(&mut self.world);
    }

    /// Clear to the background colour and draw every scheduled entity.
    ///
    /// Only the clear can fail the call; per-entity failures are collected
    /// in the returned report.
    pub fn draw_frame(&mut self) -> EngineResult<DrawReport> {
        let background = self.world.resource::<EngineConfig>().background;
        self.render.clear(background)?;
        let report = render_pass(&self.world, self.render.as_mut());
        self.world
            .resource::<SharedStats>()
            .add_draw_failures(report.failures.len() as u64);
        Ok(report)
    }

    /// Present the frame and count it in the frame statistics.
    pub fn end_frame(&mut self) -> EngineResult<()> {
        self.render.present()?;
        let now_ms = self.timestamp();
        self.world.resource::<SharedStats>().record_frame(now_ms);
        Ok(())
    }

    pub fn run_frame(&mut self) -> EngineResult<DrawReport> {
        self.begin_frame();
        let report = self.draw_frame()?;
        self.end_frame()?;
        Ok(report)
    }

    /// Sleep out the rest of the frame budget for the configured target fps.
    pub fn limit_frame_rate(&self) {
        let budget = Duration::from_millis(self.config().frame_budget_ms() as u64);
        let spent = self.frame_started.elapsed();
        if spent < budget {
            std::thread::sleep(budget - spent);
        }
    }

    pub fn should_quit(&self) -> bool {
        self.world.resource::<WindowState>().quit_requested
    }

    pub fn request_quit(&mut self) {
        self.world.resource_mut::<WindowState>().quit_requested = true;
    }

    // ---- context access ------------------------------------------------

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn config(&self) -> &EngineConfig {
        self.world.resource::<EngineConfig>()
    }

    pub fn registry<T: RegistryEntry>(&self) -> &Registry<T> {
        self.world.resource::<Registry<T>>()
    }

    pub fn registry_mut<T: RegistryEntry>(&mut self) -> Mut<'_, Registry<T>> {
        self.world.resource_mut::<Registry<T>>()
    }

    pub fn get<T: RegistryEntry>(&self, id: u32) -> EngineResult<&T> {
        self.registry::<T>().get(id)
    }

    /// Create an entity with default state (not visible, no z-index).
    pub fn create<T: RegistryEntry + Default>(&mut self, id: u32) -> EngineResult<()> {
        self.registry_mut::<T>().create(id)?;
        Ok(())
    }

    pub fn count<T: RegistryEntry>(&self) -> u32 {
        self.registry::<T>().count()
    }

    /// Run `f` on entity `id`.
    pub fn with_mut<T: RegistryEntry, R>(
        &mut self,
        id: u32,
        f: impl FnOnce(&mut T) -> R,
    ) -> EngineResult<R> {
        let mut registry = self.registry_mut::<T>();
        let entity = registry.get_mut(id)?;
        Ok(f(entity))
    }

    /// Run a fallible `f` on entity `id`.
    pub fn try_with_mut<T: RegistryEntry, R>(
        &mut self,
        id: u32,
        f: impl FnOnce(&mut T) -> EngineResult<R>,
    ) -> EngineResult<R> {
        self.with_mut(id, f)?
    }

    /// Shared handle to the font registry, e.g. for a producer thread.
    pub fn fonts(&self) -> FontRegistry {
        self.world.resource::<FontRegistry>().clone()
    }

    /// Shared handle to the frame statistics.
    pub fn stats(&self) -> SharedStats {
        self.world.resource::<SharedStats>().clone()
    }

    // ---- time ----------------------------------------------------------

    /// Engine time in milliseconds.
    pub fn timestamp(&self) -> u64 {
        self.world.resource::<WorldTime>().timestamp_ms
    }

    /// Scaled duration of the current frame in seconds.
    pub fn timestep(&self) -> f32 {
        self.world.resource::<WorldTime>().delta
    }

    pub fn set_time_scale(&mut self, scale: f32) {
        self.world.resource_mut::<WorldTime>().time_scale = scale.max(0.0);
    }

    pub fn fps(&self) -> u16 {
        self.world.resource::<SharedStats>().fps()
    }

    /// True once after each completed one-second fps window.
    pub fn recent_fps_available(&self) -> bool {
        self.world.resource::<SharedStats>().take_recent_fps()
    }

    pub fn frame_stats(&self) -> FrameStats {
        self.world.resource::<SharedStats>().snapshot()
    }

    // ---- window and screen ---------------------------------------------

    pub fn screen_size(&self) -> (u32, u32) {
        let window = self.world.resource::<WindowState>();
        (window.width, window.height)
    }

    pub fn window(&self) -> &WindowState {
        self.world.resource::<WindowState>()
    }

    pub fn window_focused(&self) -> bool {
        self.window().focused
    }

    pub fn background(&self) -> Color {
        self.config().background
    }

    pub fn set_background(&mut self, color: Color) {
        self.world.resource_mut::<EngineConfig>().background = color;
    }

    pub fn show_cursor(&mut self, show: bool) -> EngineResult<()> {
        self.render.show_cursor(show)?;
        Ok(())
    }

    // ---- input ---------------------------------------------------------

    pub fn key_event(&self, state: KeyState, key: KeyCode) -> bool {
        self.world.resource::<InputState>().key_event(state, key)
    }

    pub fn mouse_event(&self, state: KeyState, button: MouseButton) -> bool {
        self.world.resource::<InputState>().mouse_event(state, button)
    }

    pub fn mouse_position(&self) -> IVec2 {
        self.world.resource::<InputState>().mouse_position()
    }

    // ---- models --------------------------------------------------------

    pub fn model_create(&mut self, id: u32) -> EngineResult<()> {
        self.create::<Model>(id)
    }

    /// Delete a model and release its textures.
    pub fn model_delete(&mut self, id: u32) -> EngineResult<()> {
        let mut model = self.registry_mut::<Model>().delete(id)?;
        for texture in model.take_textures() {
            self.render.release_texture(texture);
        }
        Ok(())
    }

    /// Load an image and attach it to a model as texture `texture_id`.
    pub fn model_create_texture(
        &mut self,
        id: u32,
        texture_id: u32,
        path: &str,
    ) -> EngineResult<TextureInfo> {
        if self.get::<Model>(id)?.texture_exists(texture_id) {
            return Err(EngineError::invalid(format!(
                "model {id} already has texture {texture_id}"
            )));
        }
        let info = self.render.load_texture(path)?;
        if let Err(err) = self.try_with_mut::<Model, _>(id, |m| m.add_texture(texture_id, info)) {
            self.render.release_texture(info.handle);
            return Err(err);
        }
        log::debug!("model {} texture {} loaded from '{}'", id, texture_id, path);
        Ok(info)
    }

    /// Scale a model to `percent` of the screen width; returns the factor.
    pub fn model_set_size_percent(&mut self, id: u32, percent: f32) -> EngineResult<f32> {
        let (screen_width, _) = self.screen_size();
        self.try_with_mut::<Model, _>(id, |m| m.set_size_percent(percent, screen_width))
    }

    /// Advance a model along direction `index` for the current timestep.
    pub fn model_move(&mut self, id: u32, index: u32) -> EngineResult<()> {
        let dt = self.timestep();
        self.try_with_mut::<Model, _>(id, |m| m.move_direction(index, dt))
    }

    pub fn model_rotate(&mut self, id: u32, degrees_per_second: f32) -> EngineResult<()> {
        let dt = self.timestep();
        self.with_mut::<Model, _>(id, |m| m.rotate(degrees_per_second, dt))
    }

    pub fn model_fade_texture(&mut self, id: u32, texture_id: u32, speed: f32) -> EngineResult<()> {
        let dt = self.timestep();
        self.try_with_mut::<Model, _>(id, |m| m.fade_texture(texture_id, speed, dt))
    }

    /// Full two-phase collision test between models `a` and `b`.
    pub fn model_collision(&self, a: u32, b: u32) -> EngineResult<CollisionCheck> {
        let models = self.registry::<Model>();
        Ok(check_collision(models.get(a)?, models.get(b)?))
    }

    pub fn model_check_collision(&self, a: u32, b: u32) -> EngineResult<bool> {
        Ok(self.model_collision(a, b)?.collided())
    }

    /// Broad-phase test only.
    pub fn model_check_frame_box_collision(&self, a: u32, b: u32) -> EngineResult<bool> {
        let models = self.registry::<Model>();
        Ok(frame_boxes_overlap(models.get(a)?, models.get(b)?))
    }

    // ---- points, lines -------------------------------------------------

    pub fn point_create(&mut self, id: u32) -> EngineResult<()> {
        self.create::<Point>(id)
    }

    pub fn point_move(&mut self, id: u32, index: u32) -> EngineResult<()> {
        let dt = self.timestep();
        self.try_with_mut::<Point, _>(id, |p| p.move_direction(index, dt))
    }

    pub fn point_fade(&mut self, id: u32, speed: f32) -> EngineResult<()> {
        let dt = self.timestep();
        self.with_mut::<Point, _>(id, |p| p.fade(speed, dt))
    }

    pub fn point_rotate_around(
        &mut self,
        id: u32,
        center: Vec2,
        degrees_per_second: f32,
    ) -> EngineResult<()> {
        let dt = self.timestep();
        self.with_mut::<Point, _>(id, |p| p.rotate_around(center, degrees_per_second, dt))
    }

    pub fn line_create(&mut self, id: u32) -> EngineResult<()> {
        self.create::<Line>(id)
    }

    pub fn line_delete(&mut self, id: u32) -> EngineResult<()> {
        self.world.resource_mut::<LineRegistry>().delete(id)?;
        Ok(())
    }

    pub fn point_delete(&mut self, id: u32) -> EngineResult<()> {
        self.world.resource_mut::<PointRegistry>().delete(id)?;
        Ok(())
    }

    // ---- texts ---------------------------------------------------------

    pub fn text_create(&mut self, id: u32) -> EngineResult<()> {
        self.create::<Text>(id)
    }

    /// Delete a text and release its prepared texture.
    pub fn text_delete(&mut self, id: u32) -> EngineResult<()> {
        let mut text = self.world.resource_mut::<TextRegistry>().delete(id)?;
        if let Some(texture) = text.take_prepared() {
            self.fonts().backend().release_text(texture);
        }
        Ok(())
    }

    /// Render the submitted content with the related font into a texture
    /// the draw scheduler can blit. Replaces (and releases) any earlier one.
    pub fn text_prepare_for_drawing(&mut self, id: u32) -> EngineResult<TextureInfo> {
        let (font_id, content, color) = {
            let text = self.get::<Text>(id)?;
            let (font_id, content) = text.render_request()?;
            (font_id, content.to_string(), text.color())
        };
        let fonts = self.fonts();
        let font = fonts.get(font_id)?;
        let info = fonts.backend().render_text(font.handle, &content, color)?;
        if let Some(old) = self.with_mut::<Text, _>(id, |t| t.set_prepared(info))? {
            fonts.backend().release_text(old);
        }
        Ok(info)
    }

    pub fn text_move(&mut self, id: u32, index: u32) -> EngineResult<()> {
        let dt = self.timestep();
        self.try_with_mut::<Text, _>(id, |t| t.move_direction(index, dt))
    }

    pub fn text_fade(&mut self, id: u32, speed: f32) -> EngineResult<()> {
        let dt = self.timestep();
        self.with_mut::<Text, _>(id, |t| t.fade(speed, dt))
    }

    // ---- sounds --------------------------------------------------------

    fn audio_send(&self, cmd: AudioCmd) -> EngineResult<()> {
        let sent = self
            .world
            .get_resource::<AudioBridge>()
            .is_some_and(|bridge| bridge.send(cmd));
        if sent {
            Ok(())
        } else {
            Err(BackendError::Unavailable("audio thread is not running".into()).into())
        }
    }

    pub fn sound_create(&mut self, id: u32) -> EngineResult<()> {
        self.create::<Sound>(id)
    }

    /// Queue loading a WAV sample for sound `id`. The result arrives as an
    /// audio message and is applied during a later `begin_frame`.
    /// The sound keeps its previous state if the command cannot be sent.
    pub fn sound_load(&mut self, id: u32, path: &str) -> EngineResult<()> {
        let previous = self.with_mut::<Sound, _>(id, |s| {
            std::mem::replace(
                &mut s.load,
                SoundLoad::Pending {
                    path: path.to_string(),
                },
            )
        })?;
        if let Err(err) = self.audio_send(AudioCmd::Load {
            id,
            path: path.to_string(),
        }) {
            self.with_mut::<Sound, _>(id, |s| s.load = previous)?;
            return Err(err);
        }
        Ok(())
    }

    fn playable(&self, id: u32) -> EngineResult<bool> {
        let sound = self.get::<Sound>(id)?;
        if sound.locked {
            return Ok(false);
        }
        match &sound.load {
            SoundLoad::Empty => Err(EngineError::invalid(format!(
                "sound {id} has no sample loaded"
            ))),
            SoundLoad::Failed { error } => Err(EngineError::invalid(format!(
                "sound {id} failed to load: {error}"
            ))),
            SoundLoad::Pending { .. } | SoundLoad::Ready => Ok(true),
        }
    }

    /// Play sound `id`; returns `false` without playing if it is locked.
    pub fn sound_play(&self, id: u32, loops: i32) -> EngineResult<bool> {
        if !self.playable(id)? {
            return Ok(false);
        }
        self.audio_send(AudioCmd::Play { id, loops })?;
        Ok(true)
    }

    pub fn sound_fade_in(&self, id: u32, loops: i32, ms: u32) -> EngineResult<bool> {
        if !self.playable(id)? {
            return Ok(false);
        }
        self.audio_send(AudioCmd::FadeIn { id, loops, ms })?;
        Ok(true)
    }

    pub fn sound_fade_out(&self, ms: u32) -> EngineResult<()> {
        self.audio_send(AudioCmd::FadeOut { ms })
    }

    pub fn sound_pause(&self) -> EngineResult<()> {
        self.audio_send(AudioCmd::Pause)
    }

    pub fn sound_volume(&self, volume: u8) -> EngineResult<()> {
        self.audio_send(AudioCmd::Volume { volume })
    }

    pub fn sound_set_locked(&mut self, id: u32, locked: bool) -> EngineResult<()> {
        self.with_mut::<Sound, _>(id, |s| s.locked = locked)
    }

    /// Delete a sound, unloading its sample first. Nothing is removed if
    /// the unload cannot be sent.
    pub fn sound_delete(&mut self, id: u32) -> EngineResult<()> {
        if self.get::<Sound>(id)?.load != SoundLoad::Empty {
            self.audio_send(AudioCmd::Unload { id })?;
        }
        self.world.resource_mut::<SoundRegistry>().delete(id)?;
        Ok(())
    }

    /// Unload every sample and empty the sound registry; returns how many
    /// sounds were removed. Nothing is removed if the unload cannot be sent.
    pub fn sound_delete_all(&mut self) -> EngineResult<u32> {
        self.audio_send(AudioCmd::UnloadAll)?;
        let removed = self.world.resource_mut::<SoundRegistry>().take_all();
        log::debug!("{} sounds deleted", removed.len());
        Ok(removed.len() as u32)
    }

    // ---- time events ---------------------------------------------------

    /// Create a time event that is reached `duration_ms` from now.
    pub fn time_event_create(&mut self, id: u32, duration_ms: u32) -> EngineResult<()> {
        let now = self.timestamp();
        self.world
            .resource_mut::<TimeEventRegistry>()
            .insert(id, TimeEvent::starting_at(now, duration_ms))?;
        Ok(())
    }

    pub fn time_event_reached(&self, id: u32) -> EngineResult<bool> {
        Ok(self.get::<TimeEvent>(id)?.reached)
    }

    pub fn time_event_reset(&mut self, id: u32, duration_ms: u32) -> EngineResult<()> {
        let now = self.timestamp();
        self.with_mut::<TimeEvent, _>(id, |e| e.reset(now, duration_ms))
    }

    pub fn time_event_extend(&mut self, id: u32, extra_ms: u32) -> EngineResult<()> {
        self.with_mut::<TimeEvent, _>(id, |e| e.extend(extra_ms))
    }

    /// Push back every time event that has not been reached yet.
    pub fn time_event_extend_all(&mut self, extra_ms: u32) {
        self.world
            .resource_mut::<TimeEventRegistry>()
            .for_each_mut(|_, e| {
                if !e.reached {
                    e.extend(extra_ms);
                }
            });
    }

    pub fn time_event_delete(&mut self, id: u32) -> EngineResult<()> {
        self.world.resource_mut::<TimeEventRegistry>().delete(id)?;
        Ok(())
    }

    // ---- videos --------------------------------------------------------

    pub fn video_create(&mut self, id: u32, path: &str) -> EngineResult<()> {
        self.world
            .resource_mut::<VideoRegistry>()
            .insert(id, Video::new(path))?;
        Ok(())
    }

    /// Toggle playback; returns whether the video is now playing.
    pub fn video_toggle(&mut self, id: u32) -> EngineResult<bool> {
        self.with_mut::<Video, _>(id, |v| v.toggle())
    }

    pub fn video_delete(&mut self, id: u32) -> EngineResult<()> {
        self.world.resource_mut::<VideoRegistry>().delete(id)?;
        Ok(())
    }

    // ---- teardown ------------------------------------------------------

    /// Release every backend handle held by entities, free all fonts and
    /// stop the audio thread. Runs once; later calls do nothing.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        let fonts = self.fonts();
        let texts = self.world.resource_mut::<TextRegistry>().take_all();
        for (_, mut text) in texts {
            if let Some(texture) = text.take_prepared() {
                fonts.backend().release_text(texture);
            }
        }
        let models = self.world.resource_mut::<ModelRegistry>().take_all();
        for (_, mut model) in models {
            for texture in model.take_textures() {
                self.render.release_texture(texture);
            }
        }
        let freed_fonts = fonts.free_all();
        shutdown_audio(&mut self.world);

        log::info!(
            "engine shut down after {} frames ({} fonts freed)",
            self.world.resource::<WorldTime>().frame_count,
            freed_fonts
        );
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
