//! Draw scheduler.
//!
//! Once per frame, after the update schedule and before presentation,
//! [`render_pass`] collects every visible model, text, line and point with an
//! assigned z-index, sorts the list ascending by z-index (stable, so equal
//! z-indices keep collection order: models, texts, lines, points, each in id
//! order) and issues one backend call per entity and draw position.
//!
//! Entities whose z-index was never assigned are excluded from the pass and
//! counted in [`DrawReport::skipped_unassigned`]. Models without an active
//! texture have nothing to draw and are counted in
//! [`DrawReport::skipped_empty`].
//!
//! A failing draw call only fails that entity; it is logged, recorded in the
//! report and the pass continues.

use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::backend::{Blit, RenderBackend};
use crate::components::color::{Color, alpha_channel};
use crate::components::line::{Line, LineRegistry};
use crate::components::model::{Model, ModelRegistry};
use crate::components::point::{Point, PointRegistry};
use crate::components::text::{Text, TextRegistry};
use crate::error::{EngineError, EngineResult, EntityKind};
use crate::registry::{Registry, RegistryEntry};

/// Reference to one drawable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drawable {
    Model(u32),
    Text(u32),
    Line(u32),
    Point(u32),
}

impl Drawable {
    pub fn kind(self) -> EntityKind {
        match self {
            Drawable::Model(_) => EntityKind::Model,
            Drawable::Text(_) => EntityKind::Text,
            Drawable::Line(_) => EntityKind::Line,
            Drawable::Point(_) => EntityKind::Point,
        }
    }

    pub fn id(self) -> u32 {
        match self {
            Drawable::Model(id)
            | Drawable::Text(id)
            | Drawable::Line(id)
            | Drawable::Point(id) => id,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DrawList {
    /// `(zindex, drawable)` in paint order.
    pub entries: Vec<(u32, Drawable)>,
    /// Visible entities left out because their z-index is unassigned.
    pub skipped_unassigned: u32,
    /// Visible entities left out because they have nothing to draw.
    pub skipped_empty: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawFailure {
    pub kind: EntityKind,
    pub id: u32,
    pub error: EngineError,
}

/// Result of one [`render_pass`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawReport {
    /// Entities drawn without error.
    pub drawn: u32,
    pub skipped_unassigned: u32,
    pub skipped_empty: u32,
    pub failures: Vec<DrawFailure>,
}

fn collect<T: RegistryEntry>(
    world: &World,
    list: &mut DrawList,
    visible_zindex: impl Fn(&T) -> Option<u32>,
    has_content: impl Fn(&T) -> bool,
    wrap: impl Fn(u32) -> Drawable,
) {
    let Some(registry) = world.get_resource::<Registry<T>>() else {
        return;
    };
    for (id, entity) in registry.iter() {
        match visible_zindex(entity) {
            Some(0) => list.skipped_unassigned += 1,
            Some(_) if !has_content(entity) => list.skipped_empty += 1,
            Some(z) => list.entries.push((z, wrap(id))),
            None => {}
        }
    }
}

/// Gather visible drawables from every drawable registry and order them.
pub fn collect_draw_list(world: &World) -> DrawList {
    let mut list = DrawList::default();
    collect::<Model>(
        world,
        &mut list,
        |m| m.visible().then(|| m.zindex_raw()),
        Model::has_active_texture,
        Drawable::Model,
    );
    collect::<Text>(
        world,
        &mut list,
        |t| t.visible().then(|| t.zindex_raw()),
        |_| true,
        Drawable::Text,
    );
    collect::<Line>(
        world,
        &mut list,
        |l| l.visible().then(|| l.zindex_raw()),
        |_| true,
        Drawable::Line,
    );
    collect::<Point>(
        world,
        &mut list,
        |p| p.visible().then(|| p.zindex_raw()),
        |_| true,
        Drawable::Point,
    );
    list.entries.sort_by_key(|(z, _)| *z);
    list
}

fn registry<T: RegistryEntry>(world: &World, id: u32) -> EngineResult<&Registry<T>> {
    world
        .get_resource::<Registry<T>>()
        .ok_or(EngineError::NotFound { kind: T::KIND, id })
}

fn draw_one(
    world: &World,
    backend: &mut dyn RenderBackend,
    drawable: Drawable,
) -> EngineResult<()> {
    match drawable {
        Drawable::Model(id) => {
            let model = registry::<Model>(world, id)?.get(id)?;
            let size = model.scaled_size();
            let textures = model.draw_textures();
            for position in model.draw_positions() {
                for (_, texture) in &textures {
                    backend.blit(&Blit {
                        texture: texture.info.handle,
                        source: texture.source(),
                        position,
                        size,
                        rotation: model.rotation(),
                        alpha: alpha_channel(texture.alpha),
                        tint: Color::WHITE,
                    })?;
                }
            }
        }
        Drawable::Text(id) => {
            let text = registry::<Text>(world, id)?.get(id)?;
            let prepared = text
                .prepared()
                .ok_or_else(|| EngineError::invalid("text is not prepared for drawing"))?;
            backend.blit(&Blit {
                texture: prepared.handle,
                source: None,
                position: text.position(),
                size: Vec2::new(prepared.width as f32, prepared.height as f32),
                rotation: 0.0,
                alpha: text.alpha_channel(),
                tint: Color::WHITE,
            })?;
        }
        Drawable::Line(id) => {
            let line = registry::<Line>(world, id)?.get(id)?;
            backend.draw_line(line.from, line.to, line.color)?;
        }
        Drawable::Point(id) => {
            let point = registry::<Point>(world, id)?.get(id)?;
            backend.draw_point(point.pixel_position(), point.color())?;
        }
    }
    Ok(())
}

/// Draw every scheduled entity through `backend`, lowest z-index first.
pub fn render_pass(world: &World, backend: &mut dyn RenderBackend) -> DrawReport {
    let list = collect_draw_list(world);
    let mut report = DrawReport {
        skipped_unassigned: list.skipped_unassigned,
        skipped_empty: list.skipped_empty,
        ..DrawReport::default()
    };

    for (zindex, drawable) in list.entries {
        match draw_one(world, backend, drawable) {
            Ok(()) => report.drawn += 1,
            Err(error) => {
                log::warn!(
                    "draw of {} {} (z {}) failed: {}",
                    drawable.kind(),
                    drawable.id(),
                    zindex,
                    error
                );
                report.failures.push(DrawFailure {
                    kind: drawable.kind(),
                    id: drawable.id(),
                    error,
                });
            }
        }
    }
    report
}

/// Registries read by [`render_pass`]; inserted by the engine at startup.
pub fn insert_drawable_registries(world: &mut World) {
    world.insert_resource(ModelRegistry::new());
    world.insert_resource(TextRegistry::new());
    world.insert_resource(LineRegistry::new());
    world.insert_resource(PointRegistry::new());
}
