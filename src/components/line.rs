//! Straight lines between two pixel endpoints.

use glam::IVec2;

use crate::components::color::Color;
use crate::components::zindex::{self, ZIndex};
use crate::error::{EngineResult, EntityKind};
use crate::registry::{Registry, RegistryEntry};

pub type LineRegistry = Registry<Line>;

#[derive(Debug, Clone, Default)]
pub struct Line {
    pub from: IVec2,
    pub to: IVec2,
    pub color: Color,
    visible: bool,
    zindex: Option<ZIndex>,
}

impl RegistryEntry for Line {
    const KIND: EntityKind = EntityKind::Line;
}

impl Line {
    pub fn set(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        self.from = IVec2::new(x1, y1);
        self.to = IVec2::new(x2, y2);
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
}
