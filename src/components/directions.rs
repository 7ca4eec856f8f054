//! Movement directions attached to models, points and texts.
//!
//! A [`DirectionList`] holds 2D vectors addressed by a caller-chosen index,
//! kept in the order they were added. Moving along a direction advances a
//! position by `vector * delta_seconds`, so vectors are speeds in pixels per
//! second.

use glam::Vec2;
use smallvec::SmallVec;

use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Default)]
pub struct DirectionList {
    entries: SmallVec<[(u32, Vec2); 4]>,
}

fn missing(index: u32) -> EngineError {
    EngineError::invalid(format!("direction {index} is not defined"))
}

impl DirectionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, index: u32, direction: Vec2) -> EngineResult<()> {
        if self.entries.iter().any(|(i, _)| *i == index) {
            return Err(EngineError::invalid(format!(
                "direction {index} already exists"
            )));
        }
        self.entries.push((index, direction));
        Ok(())
    }

    pub fn change(&mut self, index: u32, direction: Vec2) -> EngineResult<()> {
        *self.slot_mut(index)? = direction;
        Ok(())
    }

    pub fn get(&self, index: u32) -> EngineResult<Vec2> {
        self.entries
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, dir)| *dir)
            .ok_or_else(|| missing(index))
    }

    /// Rotate a direction by `degrees` (clockwise in screen space, y down).
    pub fn rotate(&mut self, index: u32, degrees: f32) -> EngineResult<()> {
        let dir = self.slot_mut(index)?;
        *dir = Vec2::from_angle(degrees.to_radians()).rotate(*dir);
        Ok(())
    }

    pub fn remove(&mut self, index: u32) -> EngineResult<Vec2> {
        let pos = self
            .entries
            .iter()
            .position(|(i, _)| *i == index)
            .ok_or_else(|| missing(index))?;
        Ok(self.entries.remove(pos).1)
    }

    /// Displacement for moving along `index` during `delta` seconds.
    pub fn step(&self, index: u32, delta: f32) -> EngineResult<Vec2> {
        Ok(self.get(index)? * delta)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, Vec2)> + '_ {
        self.entries.iter().copied()
    }

    fn slot_mut(&mut self, index: u32) -> EngineResult<&mut Vec2> {
        self.entries
            .iter_mut()
            .find(|(i, _)| *i == index)
            .map(|(_, dir)| dir)
            .ok_or_else(|| missing(index))
    }
}
