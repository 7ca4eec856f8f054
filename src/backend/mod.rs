//! Backend seams.
//!
//! The engine core never rasterizes, mixes audio, renders glyphs or reads
//! hardware input itself. It talks to four backends through the traits in
//! this module and only ever holds opaque handles the backends hand out:
//!
//! - [`RenderBackend`] – textures and draw primitives, owned by the render thread
//! - [`FontBackend`] – TTF loading and glyph-texture rendering; `Send + Sync`
//!   because fonts may be created from a producer thread
//! - [`AudioBackend`] – samples and playback, owned by the audio thread
//! - [`InputBackend`] – one [`InputSnapshot`] per frame
//!
//! [`headless`] provides recording implementations of all four.

pub mod headless;

use glam::{IVec2, Vec2};

use crate::components::collisionbox::Rect;
use crate::components::color::Color;
use crate::components::font::FontStyle;
use crate::error::BackendError;
use crate::resources::engineconfig::{AudioConfig, WindowConfig};
use crate::resources::input::InputSnapshot;

pub type BackendResult<T> = Result<T, BackendError>;

/// Texture owned by the render (or font) backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u64);

/// Loaded font owned by the font backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FontHandle(pub u64);

/// Audio sample owned by the audio backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SampleHandle(pub u64);

/// A texture handle together with its pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    pub handle: TextureHandle,
    pub width: u32,
    pub height: u32,
}

/// One texture draw: `source` selects a region of the texture (whole
/// texture when `None`), `position`/`size` place it on screen and
/// `rotation` turns it, in degrees, around the centre of that rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blit {
    pub texture: TextureHandle,
    pub source: Option<Rect>,
    pub position: Vec2,
    pub size: Vec2,
    pub rotation: f32,
    pub alpha: u8,
    pub tint: Color,
}

pub trait RenderBackend {
    /// Open the window / display. Failure is fatal to engine startup.
    fn init(&mut self, window: &WindowConfig) -> BackendResult<()>;

    fn screen_size(&self) -> (u32, u32);

    fn clear(&mut self, color: Color) -> BackendResult<()>;

    fn load_texture(&mut self, path: &str) -> BackendResult<TextureInfo>;

    fn release_texture(&mut self, texture: TextureHandle);

    fn blit(&mut self, blit: &Blit) -> BackendResult<()>;

    fn draw_line(&mut self, from: IVec2, to: IVec2, color: Color) -> BackendResult<()>;

    fn draw_point(&mut self, at: IVec2, color: Color) -> BackendResult<()>;

    fn present(&mut self) -> BackendResult<()>;

    fn show_cursor(&mut self, _show: bool) -> BackendResult<()> {
        Ok(())
    }
}

pub trait FontBackend: Send + Sync {
    fn init(&self) -> BackendResult<()> {
        Ok(())
    }

    fn load_ttf(&self, path: &str, point_size: u32) -> BackendResult<FontHandle>;

    fn set_style(&self, font: FontHandle, style: FontStyle) -> BackendResult<()>;

    /// Render `text` into a texture the render backend can blit.
    fn render_text(&self, font: FontHandle, text: &str, color: Color)
    -> BackendResult<TextureInfo>;

    fn release_text(&self, texture: TextureHandle);

    fn free_font(&self, font: FontHandle);
}

pub trait AudioBackend: Send {
    /// Open the audio device. Failure is fatal to engine startup.
    fn open(&mut self, config: &AudioConfig) -> BackendResult<()>;

    fn load_sample(&mut self, path: &str) -> BackendResult<SampleHandle>;

    /// Play a sample; `loops` extra repetitions, `-1` loops forever.
    fn play(&mut self, sample: SampleHandle, loops: i32) -> BackendResult<()>;

    fn fade_in(&mut self, sample: SampleHandle, loops: i32, ms: u32) -> BackendResult<()>;

    fn fade_out(&mut self, ms: u32);

    fn pause(&mut self);

    fn set_volume(&mut self, volume: u8);

    fn free_sample(&mut self, sample: SampleHandle);
}

pub trait InputBackend {
    /// Key/button transitions since the previous poll.
    fn poll(&mut self) -> InputSnapshot;
}

/// The backends an [`Engine`](crate::engine::Engine) is started with.
pub struct EngineBackends {
    pub render: Box<dyn RenderBackend>,
    pub input: Box<dyn InputBackend>,
    pub fonts: std::sync::Arc<dyn FontBackend>,
    pub audio: Box<dyn AudioBackend>,
}
