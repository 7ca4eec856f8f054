//! Text entities.
//!
//! Text is edited letter by letter (or string by string) into a pending
//! buffer; [`Text::submit`] publishes the buffer as the displayed content.
//! Before a text can be drawn it has to be prepared: the font backend
//! renders the content with the related font into a texture, which
//! [`Text::set_prepared`] stores. Any later change to content, font or
//! colour marks the texture stale, but the old texture keeps being drawn
//! until the text is prepared again.

use glam::{IVec2, Vec2};

use crate::backend::{TextureHandle, TextureInfo};
use crate::components::color::{Color, alpha_channel};
use crate::components::directions::DirectionList;
use crate::components::zindex::{self, ZIndex};
use crate::error::{EngineError, EngineResult, EntityKind};
use crate::registry::{Registry, RegistryEntry};

pub type TextRegistry = Registry<Text>;

#[derive(Debug, Clone)]
pub struct Text {
    pending: String,
    content: String,
    font: Option<u32>,
    color: Color,
    alpha: f32,
    position: Vec2,
    visible: bool,
    zindex: Option<ZIndex>,
    directions: DirectionList,
    prepared: Option<TextureInfo>,
    stale: bool,
}

impl RegistryEntry for Text {
    const KIND: EntityKind = EntityKind::Text;
}

impl Default for Text {
    fn default() -> Self {
        Self {
            pending: String::new(),
            content: String::new(),
            font: None,
            color: Color::WHITE,
            alpha: 255.0,
            position: Vec2::ZERO,
            visible: false,
            zindex: None,
            directions: DirectionList::new(),
            prepared: None,
            stale: true,
        }
    }
}

impl Text {
    pub fn add_letter(&mut self, letter: char) {
        self.pending.push(letter);
    }

    pub fn add_str(&mut self, s: &str) {
        self.pending.push_str(s);
    }

    /// Publish the pending letters as the displayed content.
    pub fn submit(&mut self) {
        if self.content != self.pending {
            self.content = self.pending.clone();
            self.stale = true;
        }
    }

    /// Drop all letters, pending and submitted.
    pub fn clear(&mut self) {
        self.pending.clear();
        if !self.content.is_empty() {
            self.content.clear();
            self.stale = true;
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn pending(&self) -> &str {
        &self.pending
    }

    pub fn relate_font(&mut self, font_id: u32) {
        self.font = Some(font_id);
        self.stale = true;
    }

    pub fn font(&self) -> Option<u32> {
        self.font
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
        self.alpha = color.a as f32;
        self.stale = true;
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_alpha(&mut self, alpha: u8) {
        self.alpha = alpha as f32;
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn alpha_channel(&self) -> u8 {
        alpha_channel(self.alpha)
    }

    pub fn fade(&mut self, speed: f32, delta: f32) {
        self.alpha = (self.alpha + speed * delta).clamp(0.0, 255.0);
    }

    pub fn set_position(&mut self, x: i32, y: i32) {
        self.position = Vec2::new(x as f32, y as f32);
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn pixel_position(&self) -> IVec2 {
        self.position.round().as_ivec2()
    }

    /// Pixel size of the prepared texture, zero before preparation.
    pub fn size(&self) -> (u32, u32) {
        self.prepared.map_or((0, 0), |t| (t.width, t.height))
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn set_zindex(&mut self, value: u32) -> EngineResult<()> {
        self.zindex = Some(ZIndex::new(value)?);
        Ok(())
    }

    pub fn zindex(&self) -> Option<ZIndex> {
        self.zindex
    }

    pub fn zindex_raw(&self) -> u32 {
        zindex::raw(self.zindex)
    }

    pub fn directions(&self) -> &DirectionList {
        &self.directions
    }

    pub fn directions_mut(&mut self) -> &mut DirectionList {
        &mut self.directions
    }

    pub fn move_direction(&mut self, index: u32, delta: f32) -> EngineResult<()> {
        self.position += self.directions.step(index, delta)?;
        Ok(())
    }

    /// Font id and content to render, or why the text cannot be prepared.
    pub fn render_request(&self) -> EngineResult<(u32, &str)> {
        let font = self
            .font
            .ok_or_else(|| EngineError::invalid("text has no related font"))?;
        if self.content.is_empty() {
            return Err(EngineError::invalid("text has no submitted content"));
        }
        Ok((font, &self.content))
    }

    /// Store a freshly rendered texture, returning the one it replaces.
    pub fn set_prepared(&mut self, texture: TextureInfo) -> Option<TextureHandle> {
        self.stale = false;
        self.prepared.replace(texture).map(|t| t.handle)
    }

    pub fn prepared(&self) -> Option<TextureInfo> {
        self.prepared
    }

    /// Detach the prepared texture for release.
    pub fn take_prepared(&mut self) -> Option<TextureHandle> {
        self.stale = true;
        self.prepared.take().map(|t| t.handle)
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }
}
