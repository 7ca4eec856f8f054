//! Rectangles used for collision and texture source selection.
//!
//! [`Rect`] is an integer rectangle relative to a model's top-left corner
//! (collision rectangles) or to a texture (source rectangles).
//! [`CollisionBox`] is the world-space axis-aligned box a rectangle covers
//! once the model's position and size factor are applied.
//!
//! Overlap uses closed intervals: boxes whose edges exactly touch collide.

use glam::Vec2;

use crate::error::{EngineError, EngineResult};

/// Integer rectangle with top-left corner and size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Reject rectangles without a positive area.
    pub fn validate(self) -> EngineResult<Self> {
        if self.w <= 0 || self.h <= 0 {
            return Err(EngineError::invalid(format!(
                "rectangle {}x{} must have a positive width and height",
                self.w, self.h
            )));
        }
        Ok(self)
    }

    /// World-space box for this rectangle on a model placed at `origin`
    /// and scaled by `factor`.
    pub fn to_box(&self, origin: Vec2, factor: f32) -> CollisionBox {
        let left = origin.x + self.x as f32 * factor;
        let top = origin.y + self.y as f32 * factor;
        CollisionBox::new(
            left,
            top,
            left + self.w as f32 * factor,
            top + self.h as f32 * factor,
        )
    }
}

/// Axis-aligned box in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl CollisionBox {
    /// Build a box, normalizing swapped edges to proper min/max.
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left: left.min(right),
            top: top.min(bottom),
            right: left.max(right),
            bottom: top.max(bottom),
        }
    }

    pub fn from_position_size(position: Vec2, size: Vec2) -> Self {
        Self::new(
            position.x,
            position.y,
            position.x + size.x,
            position.y + size.y,
        )
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Closed-interval overlap test; touching edges count as overlapping.
    pub fn overlaps(&self, other: &CollisionBox) -> bool {
        self.left <= other.right
            && self.right >= other.left
            && self.top <= other.bottom
            && self.bottom >= other.top
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.left && point.x <= self.right && point.y >= self.top && point.y <= self.bottom
    }
}
