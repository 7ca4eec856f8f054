//! Sprite models.
//!
//! A [`Model`] is the main drawable entity: a positioned, sized box that owns
//! any number of textures (drawn on top of each other in texture z-order),
//! optional clones drawn at other positions, movement directions and the
//! collision rectangles used by [`crate::systems::collision`].
//!
//! Positions are kept as precise `f32` pixels so sub-pixel movement
//! accumulates across frames; the pixel accessors round.

use std::collections::BTreeMap;

use glam::{IVec2, Vec2};
use smallvec::SmallVec;

use crate::backend::{TextureHandle, TextureInfo};
use crate::components::collisionbox::{CollisionBox, Rect};
use crate::components::directions::DirectionList;
use crate::components::zindex::{self, ZIndex};
use crate::error::{EngineError, EngineResult, EntityKind};
use crate::registry::{Registry, RegistryEntry};

pub type ModelRegistry = Registry<Model>;

/// Texture attached to a model.
#[derive(Debug, Clone)]
pub struct ModelTexture {
    pub info: TextureInfo,
    /// Alpha in `0.0..=255.0`; kept fractional so fades accumulate.
    pub alpha: f32,
    pub active: bool,
    /// Order inside the model; `0` means "by texture id".
    pub zindex: u32,
    source_rects: BTreeMap<u32, Rect>,
    focus: Option<u32>,
}

impl ModelTexture {
    pub fn new(info: TextureInfo) -> Self {
        Self {
            info,
            alpha: 255.0,
            active: true,
            zindex: 0,
            source_rects: BTreeMap::new(),
            focus: None,
        }
    }

    pub fn add_source_rect(&mut self, rect_id: u32, rect: Rect) -> EngineResult<()> {
        let rect = rect.validate()?;
        if self.source_rects.contains_key(&rect_id) {
            return Err(EngineError::invalid(format!(
                "texture source rectangle {rect_id} already exists"
            )));
        }
        self.source_rects.insert(rect_id, rect);
        if self.focus.is_none() {
            self.focus = Some(rect_id);
        }
        Ok(())
    }

    /// Draw only `rect_id` from now on.
    pub fn focus_source_rect(&mut self, rect_id: u32) -> EngineResult<()> {
        if !self.source_rects.contains_key(&rect_id) {
            return Err(EngineError::invalid(format!(
                "texture source rectangle {rect_id} is not defined"
            )));
        }
        self.focus = Some(rect_id);
        Ok(())
    }

    /// The currently selected source rectangle, if any.
    pub fn source(&self) -> Option<Rect> {
        self.focus.and_then(|id| self.source_rects.get(&id).copied())
    }

    pub fn source_rect_count(&self) -> u32 {
        self.source_rects.len() as u32
    }
}

/// Extra draw position of a model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelClone {
    pub position: Vec2,
    pub visible: bool,
}

#[derive(Debug, Clone)]
pub struct Model {
    position: Vec2,
    width: u32,
    height: u32,
    size_factor: f32,
    rotation: f32,
    visible: bool,
    zindex: Option<ZIndex>,
    directions: DirectionList,
    collision_rects: SmallVec<[(u32, Rect); 4]>,
    textures: BTreeMap<u32, ModelTexture>,
    clones: BTreeMap<u32, ModelClone>,
}

impl RegistryEntry for Model {
    const KIND: EntityKind = EntityKind::Model;
}

impl Default for Model {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            width: 0,
            height: 0,
            size_factor: 1.0,
            rotation: 0.0,
            visible: false,
            zindex: None,
            directions: DirectionList::new(),
            collision_rects: SmallVec::new(),
            textures: BTreeMap::new(),
            clones: BTreeMap::new(),
        }
    }
}

fn missing_texture(texture_id: u32) -> EngineError {
    EngineError::invalid(format!("model texture {texture_id} is not defined"))
}

fn missing_clone(clone_id: u32) -> EngineError {
    EngineError::invalid(format!("model clone {clone_id} is not defined"))
}

impl Model {
    pub fn set_position(&mut self, x: f32, y: f32) {
        self.position = Vec2::new(x, y);
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn pixel_position(&self) -> IVec2 {
        self.position.round().as_ivec2()
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Unscaled size in pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn has_size(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Size with the size factor applied.
    pub fn scaled_size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32) * self.size_factor
    }

    pub fn set_size_factor(&mut self, factor: f32) -> EngineResult<()> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(EngineError::invalid(format!(
                "size factor {factor} must be positive"
            )));
        }
        self.size_factor = factor;
        Ok(())
    }

    pub fn size_factor(&self) -> f32 {
        self.size_factor
    }

    /// Scale the model so its width covers `percent` of `screen_width`.
    /// Returns the resulting size factor.
    pub fn set_size_percent(&mut self, percent: f32, screen_width: u32) -> EngineResult<f32> {
        if self.width == 0 {
            return Err(EngineError::invalid("model has no width to scale"));
        }
        let target = screen_width as f32 * percent / 100.0;
        self.set_size_factor(target / self.width as f32)?;
        Ok(self.size_factor)
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Rotate by a fixed amount of degrees, normalized to `0..360`.
    pub fn rotate_once(&mut self, degrees: f32) {
        self.rotation = (self.rotation + degrees).rem_euclid(360.0);
    }

    /// Rotate by `degrees_per_second` over `delta` seconds.
    pub fn rotate(&mut self, degrees_per_second: f32, delta: f32) {
        self.rotate_once(degrees_per_second * delta);
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

    /// Raw z-index, `0` when unassigned.
    pub fn zindex_raw(&self) -> u32 {
        zindex::raw(self.zindex)
    }

    pub fn directions(&self) -> &DirectionList {
        &self.directions
    }

    pub fn directions_mut(&mut self) -> &mut DirectionList {
        &mut self.directions
    }

    /// Advance along direction `index` for `delta` seconds.
    pub fn move_direction(&mut self, index: u32, delta: f32) -> EngineResult<()> {
        self.position += self.directions.step(index, delta)?;
        Ok(())
    }

    // ---- collision -----------------------------------------------------

    pub fn add_collision_rect(&mut self, rect_id: u32, rect: Rect) -> EngineResult<()> {
        let rect = rect.validate()?;
        if self.collision_rects.iter().any(|(id, _)| *id == rect_id) {
            return Err(EngineError::invalid(format!(
                "collision rectangle {rect_id} already exists"
            )));
        }
        self.collision_rects.push((rect_id, rect));
        Ok(())
    }

    pub fn collision_rect_count(&self) -> u32 {
        self.collision_rects.len() as u32
    }

    /// World-space box of collision rectangle `rect_id`.
    pub fn collision_box(&self, rect_id: u32) -> EngineResult<CollisionBox> {
        self.collision_rects
            .iter()
            .find(|(id, _)| *id == rect_id)
            .map(|(_, rect)| rect.to_box(self.position, self.size_factor))
            .ok_or_else(|| {
                EngineError::invalid(format!("collision rectangle {rect_id} is not defined"))
            })
    }

    /// World-space boxes of every collision rectangle, in registration order.
    pub fn collision_boxes(&self) -> impl Iterator<Item = CollisionBox> + '_ {
        self.collision_rects
            .iter()
            .map(|(_, rect)| rect.to_box(self.position, self.size_factor))
    }

    /// Coarse box covering the full rendered extent of the model. A rotated
    /// model turns around its centre, so the box grows to the rotated bounds.
    pub fn frame_box(&self) -> CollisionBox {
        let size = self.scaled_size();
        if self.rotation == 0.0 {
            return CollisionBox::from_position_size(self.position, size);
        }
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        let half = Vec2::new(
            size.x * cos.abs() + size.y * sin.abs(),
            size.x * sin.abs() + size.y * cos.abs(),
        ) / 2.0;
        let center = self.position + size / 2.0;
        CollisionBox::new(
            center.x - half.x,
            center.y - half.y,
            center.x + half.x,
            center.y + half.y,
        )
    }

    // ---- textures ------------------------------------------------------

    /// Attach a texture. The first texture gives a size-less model its size.
    pub fn add_texture(&mut self, texture_id: u32, info: TextureInfo) -> EngineResult<()> {
        if self.textures.contains_key(&texture_id) {
            return Err(EngineError::invalid(format!(
                "model texture {texture_id} already exists"
            )));
        }
        if !self.has_size() {
            self.set_size(info.width, info.height);
        }
        self.textures.insert(texture_id, ModelTexture::new(info));
        Ok(())
    }

    pub fn texture_exists(&self, texture_id: u32) -> bool {
        self.textures.contains_key(&texture_id)
    }

    pub fn texture(&self, texture_id: u32) -> EngineResult<&ModelTexture> {
        self.textures
            .get(&texture_id)
            .ok_or_else(|| missing_texture(texture_id))
    }

    pub fn texture_mut(&mut self, texture_id: u32) -> EngineResult<&mut ModelTexture> {
        self.textures
            .get_mut(&texture_id)
            .ok_or_else(|| missing_texture(texture_id))
    }

    pub fn set_texture_alpha(&mut self, texture_id: u32, alpha: u8) -> EngineResult<()> {
        self.texture_mut(texture_id)?.alpha = alpha as f32;
        Ok(())
    }

    /// Change a texture's alpha by `speed` units per second.
    pub fn fade_texture(&mut self, texture_id: u32, speed: f32, delta: f32) -> EngineResult<()> {
        let texture = self.texture_mut(texture_id)?;
        texture.alpha = (texture.alpha + speed * delta).clamp(0.0, 255.0);
        Ok(())
    }

    pub fn set_texture_active(&mut self, texture_id: u32, active: bool) -> EngineResult<()> {
        self.texture_mut(texture_id)?.active = active;
        Ok(())
    }

    pub fn set_texture_zindex(&mut self, texture_id: u32, value: u32) -> EngineResult<()> {
        let value = ZIndex::new(value)?.get();
        self.texture_mut(texture_id)?.zindex = value;
        Ok(())
    }

    /// Active textures in draw order (texture z-index, then texture id).
    pub fn draw_textures(&self) -> Vec<(u32, &ModelTexture)> {
        let mut textures: Vec<(u32, &ModelTexture)> = self
            .textures
            .iter()
            .filter(|(_, t)| t.active)
            .map(|(id, t)| (*id, t))
            .collect();
        textures.sort_by_key(|(id, t)| (t.zindex, *id));
        textures
    }

    /// True if at least one texture would be drawn.
    pub fn has_active_texture(&self) -> bool {
        self.textures.values().any(|t| t.active)
    }

    /// Detach every texture, handing back the handles for release.
    pub fn take_textures(&mut self) -> Vec<TextureHandle> {
        std::mem::take(&mut self.textures)
            .into_values()
            .map(|t| t.info.handle)
            .collect()
    }

    pub fn texture_count(&self) -> u32 {
        self.textures.len() as u32
    }

    // ---- clones --------------------------------------------------------

    pub fn create_clone(&mut self, clone_id: u32) -> EngineResult<()> {
        if self.clones.contains_key(&clone_id) {
            return Err(EngineError::invalid(format!(
                "model clone {clone_id} already exists"
            )));
        }
        self.clones.insert(
            clone_id,
            ModelClone {
                position: self.position,
                visible: false,
            },
        );
        Ok(())
    }

    pub fn set_clone_position(&mut self, clone_id: u32, position: Vec2) -> EngineResult<()> {
        self.clones
            .get_mut(&clone_id)
            .ok_or_else(|| missing_clone(clone_id))?
            .position = position;
        Ok(())
    }

    pub fn set_clone_visible(&mut self, clone_id: u32, visible: bool) -> EngineResult<()> {
        self.clones
            .get_mut(&clone_id)
            .ok_or_else(|| missing_clone(clone_id))?
            .visible = visible;
        Ok(())
    }

    pub fn clear_clones(&mut self) {
        self.clones.clear();
    }

    pub fn clone_count(&self) -> u32 {
        self.clones.len() as u32
    }

    /// Positions the model is drawn at: itself, then each visible clone.
    pub fn draw_positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        std::iter::once(self.position).chain(
            self.clones
                .values()
                .filter(|c| c.visible)
                .map(|c| c.position),
        )
    }
}
