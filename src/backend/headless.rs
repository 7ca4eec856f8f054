//! Headless backends.
//!
//! Recording implementations of every backend trait. Nothing is rasterized
//! or played; each backend keeps a log behind a shared `parking_lot` lock so
//! the demo binary and the tests can observe what the engine asked for
//! after the backend itself has been moved into the engine.

use std::collections::VecDeque;
use std::sync::Arc;

use glam::IVec2;
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::backend::{
    AudioBackend, BackendResult, Blit, EngineBackends, FontBackend, FontHandle, InputBackend,
    RenderBackend, SampleHandle, TextureHandle, TextureInfo,
};
use crate::components::color::Color;
use crate::components::font::FontStyle;
use crate::error::BackendError;
use crate::resources::engineconfig::{AudioConfig, WindowConfig};
use crate::resources::input::InputSnapshot;

/// Texture handles handed out by [`HeadlessFonts`] start here so they never
/// collide with renderer-issued ones.
const TEXT_HANDLE_BASE: u64 = 1 << 32;

fn has_extension(path: &str, extensions: &[&str]) -> bool {
    let lower = path.to_ascii_lowercase();
    extensions.iter().any(|ext| lower.ends_with(ext))
}

fn load_error(path: &str, reason: &str) -> BackendError {
    BackendError::Load {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

// ---- rendering ---------------------------------------------------------

/// One recorded call on the [`HeadlessRenderer`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Clear(Color),
    Blit(Blit),
    Line { from: IVec2, to: IVec2, color: Color },
    Point { at: IVec2, color: Color },
    Present,
}

#[derive(Debug, Default)]
struct RenderLog {
    calls: Vec<DrawCall>,
    live: FxHashSet<u64>,
    revoked: FxHashSet<u64>,
    next_handle: u64,
}

/// Shared view into a [`HeadlessRenderer`]'s log.
#[derive(Debug, Clone, Default)]
pub struct RenderProbe(Arc<Mutex<RenderLog>>);

impl RenderProbe {
    pub fn calls(&self) -> Vec<DrawCall> {
        self.0.lock().calls.clone()
    }

    /// Drain the recorded calls.
    pub fn take(&self) -> Vec<DrawCall> {
        std::mem::take(&mut self.0.lock().calls)
    }

    /// Blits recorded so far, in call order.
    pub fn blits(&self) -> Vec<Blit> {
        self.0
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::Blit(blit) => Some(*blit),
                _ => None,
            })
            .collect()
    }

    /// Make every later blit of `texture` fail, as if the texture had been
    /// lost behind the engine's back.
    pub fn forget_texture(&self, texture: TextureHandle) {
        let mut log = self.0.lock();
        log.live.remove(&texture.0);
        log.revoked.insert(texture.0);
    }

    /// Renderer-issued textures not yet released.
    pub fn live_textures(&self) -> usize {
        self.0.lock().live.len()
    }
}

pub struct HeadlessRenderer {
    width: u32,
    height: u32,
    texture_size: (u32, u32),
    log: RenderProbe,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            texture_size: (32, 32),
            log: RenderProbe::default(),
        }
    }

    /// Size reported for every loaded texture.
    pub fn with_texture_size(mut self, width: u32, height: u32) -> Self {
        self.texture_size = (width, height);
        self
    }

    pub fn probe(&self) -> RenderProbe {
        self.log.clone()
    }

    fn record(&self, call: DrawCall) {
        self.log.0.lock().calls.push(call);
    }
}

impl Default for HeadlessRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for HeadlessRenderer {
    fn init(&mut self, window: &WindowConfig) -> BackendResult<()> {
        if window.width == 0 || window.height == 0 {
            return Err(BackendError::Unavailable(format!(
                "cannot open a {}x{} window",
                window.width, window.height
            )));
        }
        self.width = window.width;
        self.height = window.height;
        log::debug!(
            "headless window '{}' {}x{}",
            window.title,
            self.width,
            self.height
        );
        Ok(())
    }

    fn screen_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self, color: Color) -> BackendResult<()> {
        self.record(DrawCall::Clear(color));
        Ok(())
    }

    fn load_texture(&mut self, path: &str) -> BackendResult<TextureInfo> {
        if !has_extension(path, &[".png", ".bmp", ".jpg"]) {
            return Err(load_error(path, "unsupported image format"));
        }
        let mut log = self.log.0.lock();
        log.next_handle += 1;
        let handle = log.next_handle;
        log.live.insert(handle);
        Ok(TextureInfo {
            handle: TextureHandle(handle),
            width: self.texture_size.0,
            height: self.texture_size.1,
        })
    }

    fn release_texture(&mut self, texture: TextureHandle) {
        self.log.0.lock().live.remove(&texture.0);
    }

    fn blit(&mut self, blit: &Blit) -> BackendResult<()> {
        let mut log = self.log.0.lock();
        let handle = blit.texture.0;
        let known = if handle >= TEXT_HANDLE_BASE {
            !log.revoked.contains(&handle)
        } else {
            log.live.contains(&handle)
        };
        if !known {
            return Err(BackendError::UnknownHandle(handle));
        }
        log.calls.push(DrawCall::Blit(*blit));
        Ok(())
    }

    fn draw_line(&mut self, from: IVec2, to: IVec2, color: Color) -> BackendResult<()> {
        self.record(DrawCall::Line { from, to, color });
        Ok(())
    }

    fn draw_point(&mut self, at: IVec2, color: Color) -> BackendResult<()> {
        self.record(DrawCall::Point { at, color });
        Ok(())
    }

    fn present(&mut self) -> BackendResult<()> {
        self.record(DrawCall::Present);
        Ok(())
    }
}

// ---- input -------------------------------------------------------------

/// Queue of snapshots the [`HeadlessInput`] hands out, one per poll.
#[derive(Debug, Clone, Default)]
pub struct InputScript(Arc<Mutex<VecDeque<InputSnapshot>>>);

impl InputScript {
    pub fn push(&self, snapshot: InputSnapshot) {
        self.0.lock().push_back(snapshot);
    }

    pub fn pending(&self) -> usize {
        self.0.lock().len()
    }
}

#[derive(Default)]
pub struct HeadlessInput {
    script: InputScript,
}

impl HeadlessInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self) -> InputScript {
        self.script.clone()
    }
}

impl InputBackend for HeadlessInput {
    fn poll(&mut self) -> InputSnapshot {
        self.script.0.lock().pop_front().unwrap_or_default()
    }
}

// ---- fonts -------------------------------------------------------------

#[derive(Debug)]
struct LoadedFont {
    point_size: u32,
    style: FontStyle,
}

#[derive(Debug, Default)]
struct FontState {
    next_font: u64,
    fonts: FxHashMap<u64, LoadedFont>,
    next_text: u64,
    texts: FxHashSet<u64>,
}

/// Font backend producing fake glyph textures: every character is half the
/// point size wide and the point size tall.
#[derive(Debug, Default)]
pub struct HeadlessFonts {
    state: Mutex<FontState>,
}

impl HeadlessFonts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loaded_count(&self) -> usize {
        self.state.lock().fonts.len()
    }

    /// Text textures rendered and not yet released.
    pub fn text_count(&self) -> usize {
        self.state.lock().texts.len()
    }

    pub fn style_of(&self, font: FontHandle) -> Option<FontStyle> {
        self.state.lock().fonts.get(&font.0).map(|f| f.style)
    }
}

impl FontBackend for HeadlessFonts {
    fn load_ttf(&self, path: &str, point_size: u32) -> BackendResult<FontHandle> {
        if !has_extension(path, &[".ttf"]) {
            return Err(load_error(path, "not a TrueType font"));
        }
        let mut state = self.state.lock();
        state.next_font += 1;
        let handle = state.next_font;
        state.fonts.insert(
            handle,
            LoadedFont {
                point_size,
                style: FontStyle::NORMAL,
            },
        );
        Ok(FontHandle(handle))
    }

    fn set_style(&self, font: FontHandle, style: FontStyle) -> BackendResult<()> {
        let mut state = self.state.lock();
        let loaded = state
            .fonts
            .get_mut(&font.0)
            .ok_or(BackendError::UnknownHandle(font.0))?;
        loaded.style = style;
        Ok(())
    }

    fn render_text(&self, font: FontHandle, text: &str, _color: Color) -> BackendResult<TextureInfo> {
        let mut state = self.state.lock();
        let point_size = state
            .fonts
            .get(&font.0)
            .map(|f| f.point_size)
            .ok_or(BackendError::UnknownHandle(font.0))?;
        if text.is_empty() {
            return Err(BackendError::Call("cannot render an empty string".into()));
        }
        let handle = TEXT_HANDLE_BASE + state.next_text;
        state.next_text += 1;
        state.texts.insert(handle);
        Ok(TextureInfo {
            handle: TextureHandle(handle),
            width: text.chars().count() as u32 * point_size / 2,
            height: point_size,
        })
    }

    fn release_text(&self, texture: TextureHandle) {
        self.state.lock().texts.remove(&texture.0);
    }

    fn free_font(&self, font: FontHandle) {
        if self.state.lock().fonts.remove(&font.0).is_none() {
            log::warn!("free of unknown font handle {}", font.0);
        }
    }
}

// ---- audio -------------------------------------------------------------

/// One recorded call on the [`NullAudio`] backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioCall {
    Open { frequency: u32, channels: u8 },
    Load { path: String, sample: SampleHandle },
    Play { sample: SampleHandle, loops: i32 },
    FadeIn { sample: SampleHandle, loops: i32, ms: u32 },
    FadeOut { ms: u32 },
    Pause,
    Volume(u8),
    Free(SampleHandle),
}

/// Shared view into a [`NullAudio`]'s call log.
#[derive(Debug, Clone, Default)]
pub struct AudioLog(Arc<Mutex<Vec<AudioCall>>>);

impl AudioLog {
    pub fn calls(&self) -> Vec<AudioCall> {
        self.0.lock().clone()
    }
}

/// Audio backend that accepts `.wav` samples and records every call.
#[derive(Default)]
pub struct NullAudio {
    log: AudioLog,
    next_sample: u64,
    unavailable: bool,
}

impl NullAudio {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose device never opens.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn log(&self) -> AudioLog {
        self.log.clone()
    }

    fn record(&self, call: AudioCall) {
        self.log.0.lock().push(call);
    }
}

impl AudioBackend for NullAudio {
    fn open(&mut self, config: &AudioConfig) -> BackendResult<()> {
        if self.unavailable {
            return Err(BackendError::Unavailable("no audio device".into()));
        }
        self.record(AudioCall::Open {
            frequency: config.frequency,
            channels: config.channels,
        });
        Ok(())
    }

    fn load_sample(&mut self, path: &str) -> BackendResult<SampleHandle> {
        if !has_extension(path, &[".wav"]) {
            return Err(load_error(path, "not a WAV file"));
        }
        self.next_sample += 1;
        let sample = SampleHandle(self.next_sample);
        self.record(AudioCall::Load {
            path: path.to_string(),
            sample,
        });
        Ok(sample)
    }

    fn play(&mut self, sample: SampleHandle, loops: i32) -> BackendResult<()> {
        self.record(AudioCall::Play { sample, loops });
        Ok(())
    }

    fn fade_in(&mut self, sample: SampleHandle, loops: i32, ms: u32) -> BackendResult<()> {
        self.record(AudioCall::FadeIn { sample, loops, ms });
        Ok(())
    }

    fn fade_out(&mut self, ms: u32) {
        self.record(AudioCall::FadeOut { ms });
    }

    fn pause(&mut self) {
        self.record(AudioCall::Pause);
    }

    fn set_volume(&mut self, volume: u8) {
        self.record(AudioCall::Volume(volume));
    }

    fn free_sample(&mut self, sample: SampleHandle) {
        self.record(AudioCall::Free(sample));
    }
}

// ---- bundle ------------------------------------------------------------

/// Observation handles for a set of headless backends.
#[derive(Clone)]
pub struct HeadlessProbes {
    pub render: RenderProbe,
    pub input: InputScript,
    pub fonts: Arc<HeadlessFonts>,
    pub audio: AudioLog,
}

/// All four headless backends plus the handles to observe them.
pub fn headless_backends() -> (EngineBackends, HeadlessProbes) {
    let render = HeadlessRenderer::new();
    let input = HeadlessInput::new();
    let fonts = Arc::new(HeadlessFonts::new());
    let audio = NullAudio::new();
    let probes = HeadlessProbes {
        render: render.probe(),
        input: input.script(),
        fonts: fonts.clone(),
        audio: audio.log(),
    };
    let backends = EngineBackends {
        render: Box::new(render),
        input: Box::new(input),
        fonts,
        audio: Box::new(audio),
    };
    (backends, probes)
}
