//! Single-pixel points.

use glam::{IVec2, Vec2};

use crate::components::color::{Color, alpha_channel};
use crate::components::directions::DirectionList;
use crate::components::zindex::{self, ZIndex};
use crate::error::{EngineResult, EntityKind};
use crate::registry::{Registry, RegistryEntry};

pub type PointRegistry = Registry<Point>;

#[derive(Debug, Clone)]
pub struct Point {
    position: Vec2,
    color: Color,
    /// Fade alpha in `0.0..=255.0`, applied on top of `color.a`.
    alpha: f32,
    visible: bool,
    zindex: Option<ZIndex>,
    directions: DirectionList,
}

impl RegistryEntry for Point {
    const KIND: EntityKind = EntityKind::Point;
}

impl Default for Point {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            color: Color::WHITE,
            alpha: 255.0,
            visible: false,
            zindex: None,
            directions: DirectionList::new(),
        }
    }
}

impl Point {
    pub fn set_position(&mut self, x: i32, y: i32) {
        self.position = Vec2::new(x as f32, y as f32);
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn pixel_position(&self) -> IVec2 {
        self.position.round().as_ivec2()
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
        self.alpha = color.a as f32;
    }

    /// Base colour with the current fade alpha applied.
    pub fn color(&self) -> Color {
        self.color.with_alpha(alpha_channel(self.alpha))
    }

    /// Change alpha by `speed` units per second.
    pub fn fade(&mut self, speed: f32, delta: f32) {
        self.alpha = (self.alpha + speed * delta).clamp(0.0, 255.0);
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

    /// Orbit `center` at `degrees_per_second` for `delta` seconds.
    pub fn rotate_around(&mut self, center: Vec2, degrees_per_second: f32, delta: f32) {
        let angle = (degrees_per_second * delta).to_radians();
        self.position = center + Vec2::from_angle(angle).rotate(self.position - center);
    }
}
