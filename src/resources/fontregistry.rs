//! Font registry with a buffered producer mode.
//!
//! Fonts are the one entity kind that may be created from a second,
//! caller-managed producer thread (typically a loading-screen worker). The
//! registry keeps two [`Registry`] instances behind one `parking_lot::Mutex`:
//!
//! - `primary` – the authoritative set the render thread draws with
//! - `buffer` – where creations land while the producer mode is on
//!
//! In [`FontMode::Direct`] every operation targets `primary` and deletion is
//! structural. In [`FontMode::Buffered`] creations go to `buffer` and
//! deletions only tombstone the entry, wherever it lives. The tombstones are
//! swept and the buffer is folded into `primary` by [`FontRegistry::merge`],
//! which the frame controller runs at its safe point once the producer mode
//! has been switched off again.
//!
//! The lock is taken per operation only. Loading a TTF through the backend
//! happens outside of it, so lookups from the render thread are never stuck
//! behind a slow font load on the producer thread.
//!
//! Ids are checked against both trees (tombstones included) on creation, so
//! merging can never produce a duplicate.
//!
//! Sequencing the mode toggle against in-flight producer work is the
//! caller's job: the registry refuses to merge while the mode flag is
//! `Buffered`, but it cannot tell whether a producer that already switched
//! the flag off is still running.

use std::sync::Arc;

use bevy_ecs::prelude::Resource;
use parking_lot::Mutex;

use crate::backend::{FontBackend, FontHandle};
use crate::components::font::{Font, FontStyle};
use crate::error::{EngineError, EngineResult, EntityKind};
use crate::registry::Registry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontMode {
    /// Single-thread mode; everything targets the primary registry.
    Direct,
    /// Producer mode; creations land in the buffer, deletions tombstone.
    Buffered,
}

/// What a [`FontRegistry::merge`] pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Tombstoned fonts removed and freed.
    pub swept: u32,
    /// Fonts moved from the buffer into the primary registry.
    pub migrated: u32,
}

struct FontTrees {
    mode: FontMode,
    primary: Registry<Font>,
    buffer: Registry<Font>,
}

impl FontTrees {
    fn holds(&self, id: u32) -> bool {
        self.primary.holds(id) || self.buffer.holds(id)
    }

    fn active_mut(&mut self) -> &mut Registry<Font> {
        match self.mode {
            FontMode::Direct => &mut self.primary,
            FontMode::Buffered => &mut self.buffer,
        }
    }

    /// Live font for a mutation, searching the active tree first.
    fn find_mut(&mut self, id: u32) -> EngineResult<&mut Font> {
        let (first, second) = match self.mode {
            FontMode::Direct => (&mut self.primary, &mut self.buffer),
            FontMode::Buffered => (&mut self.buffer, &mut self.primary),
        };
        if first.contains(id) {
            first.get_mut(id)
        } else {
            second.get_mut(id)
        }
    }
}

/// Shared font registry. Cloning yields another handle to the same fonts,
/// which is how a producer thread gets access.
#[derive(Resource, Clone)]
pub struct FontRegistry {
    trees: Arc<Mutex<FontTrees>>,
    backend: Arc<dyn FontBackend>,
}

impl FontRegistry {
    pub fn new(backend: Arc<dyn FontBackend>) -> Self {
        Self {
            trees: Arc::new(Mutex::new(FontTrees {
                mode: FontMode::Direct,
                primary: Registry::new(),
                buffer: Registry::new(),
            })),
            backend,
        }
    }

    pub fn backend(&self) -> &Arc<dyn FontBackend> {
        &self.backend
    }

    fn duplicate(id: u32) -> EngineError {
        EngineError::DuplicateId {
            kind: EntityKind::Font,
            id,
        }
    }

    pub fn mode(&self) -> FontMode {
        self.trees.lock().mode
    }

    /// Switch the producer mode on (`true`) or off (`false`).
    pub fn set_producer_mode(&self, producing: bool) {
        let mode = if producing {
            FontMode::Buffered
        } else {
            FontMode::Direct
        };
        let mut trees = self.trees.lock();
        if trees.mode != mode {
            log::debug!("font registry mode {:?} -> {:?}", trees.mode, mode);
            trees.mode = mode;
        }
    }

    /// Load a TTF font and register it under `id` in the active tree.
    pub fn create_ttf(&self, id: u32, path: &str, point_size: u32) -> EngineResult<()> {
        if point_size == 0 {
            return Err(EngineError::invalid("font point size must be positive"));
        }
        if self.trees.lock().holds(id) {
            return Err(Self::duplicate(id));
        }

        let handle = self.backend.load_ttf(path, point_size)?;
        let font = Font {
            handle,
            path: path.to_string(),
            point_size,
            style: FontStyle::NORMAL,
        };

        let mut trees = self.trees.lock();
        // Another thread may have taken the id while the font was loading.
        if trees.holds(id) {
            drop(trees);
            self.backend.free_font(handle);
            return Err(Self::duplicate(id));
        }
        let mode = trees.mode;
        trees.active_mut().insert(id, font)?;
        log::debug!("font {} created from '{}' ({:?})", id, path, mode);
        Ok(())
    }

    /// Delete a font. Structural in `Direct` mode, a tombstone in
    /// `Buffered` mode. Deleting an already tombstoned font reports
    /// `NotFound`.
    pub fn delete(&self, id: u32) -> EngineResult<()> {
        let mut trees = self.trees.lock();
        match trees.mode {
            FontMode::Direct => {
                let font = if trees.primary.contains(id) {
                    trees.primary.delete(id)?
                } else {
                    trees.buffer.delete(id)?
                };
                drop(trees);
                self.backend.free_font(font.handle);
            }
            FontMode::Buffered => {
                if trees.primary.contains(id) {
                    trees.primary.tombstone(id)?;
                } else {
                    trees.buffer.tombstone(id)?;
                }
                log::debug!("font {} tombstoned", id);
            }
        }
        Ok(())
    }

    /// Look a font up, primary first, then the buffer. Returns a copy so the
    /// lock is released as soon as the lookup is done.
    pub fn get(&self, id: u32) -> EngineResult<Font> {
        let trees = self.trees.lock();
        if trees.primary.contains(id) {
            trees.primary.get(id).cloned()
        } else {
            trees.buffer.get(id).cloned()
        }
    }

    pub fn contains(&self, id: u32) -> bool {
        let trees = self.trees.lock();
        trees.primary.contains(id) || trees.buffer.contains(id)
    }

    pub fn set_style(&self, id: u32, style: FontStyle) -> EngineResult<()> {
        let mut trees = self.trees.lock();
        let font = trees.find_mut(id)?;
        self.backend.set_style(font.handle, style)?;
        font.style = style;
        Ok(())
    }

    /// True if a merge would change anything.
    pub fn merge_pending(&self) -> bool {
        let trees = self.trees.lock();
        trees.primary.tombstone_count() > 0 || !trees.buffer.is_empty()
    }

    /// Sweep tombstones from both trees and move every remaining buffered
    /// font into the primary registry, leaving the buffer empty.
    ///
    /// Refused with [`EngineError::ConcurrencyMisuse`] while the producer
    /// mode is still on.
    pub fn merge(&self) -> EngineResult<MergeSummary> {
        let mut freed: Vec<FontHandle> = Vec::new();
        let mut summary = MergeSummary::default();
        {
            let mut trees = self.trees.lock();
            if trees.mode == FontMode::Buffered {
                return Err(EngineError::ConcurrencyMisuse(
                    "font merge requested while the producer mode is active",
                ));
            }
            freed.extend(
                trees
                    .primary
                    .sweep_tombstones()
                    .into_iter()
                    .map(|(_, f)| f.handle),
            );
            freed.extend(
                trees
                    .buffer
                    .sweep_tombstones()
                    .into_iter()
                    .map(|(_, f)| f.handle),
            );
            summary.swept = freed.len() as u32;

            for (id, font) in trees.buffer.take_all() {
                if trees.primary.holds(id) {
                    log::error!("font {} exists in both registries; dropping buffered copy", id);
                    freed.push(font.handle);
                    continue;
                }
                trees.primary.insert(id, font)?;
                summary.migrated += 1;
            }
        }
        for handle in freed {
            self.backend.free_font(handle);
        }
        if summary != MergeSummary::default() {
            log::debug!(
                "font merge: {} swept, {} migrated",
                summary.swept,
                summary.migrated
            );
        }
        Ok(summary)
    }

    /// Live fonts across both trees.
    pub fn count(&self) -> u32 {
        let trees = self.trees.lock();
        trees.primary.count() + trees.buffer.count()
    }

    pub fn primary_ids(&self) -> Vec<u32> {
        self.trees.lock().primary.ids()
    }

    pub fn buffer_ids(&self) -> Vec<u32> {
        self.trees.lock().buffer.ids()
    }

    /// Log the contents of both trees at debug level.
    pub fn log_lists(&self) {
        let trees = self.trees.lock();
        log::debug!("font primary ({:?}):", trees.mode);
        trees
            .primary
            .for_each(|id, f| log::debug!("  {} -> '{}' {}pt", id, f.path, f.point_size));
        log::debug!("font buffer:");
        trees
            .buffer
            .for_each(|id, f| log::debug!("  {} -> '{}' {}pt", id, f.path, f.point_size));
    }

    /// Remove and free every font, tombstoned ones included.
    pub fn free_all(&self) -> u32 {
        let taken: Vec<(u32, Font)> = {
            let mut trees = self.trees.lock();
            let mut all = trees.primary.take_all();
            all.extend(trees.buffer.take_all());
            all
        };
        for (_, font) in &taken {
            self.backend.free_font(font.handle);
        }
        taken.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::headless::HeadlessFonts;

    fn registry() -> (FontRegistry, Arc<HeadlessFonts>) {
        let backend = Arc::new(HeadlessFonts::new());
        (FontRegistry::new(backend.clone()), backend)
    }

    #[test]
    fn direct_mode_behaves_like_a_plain_registry() {
        let (fonts, backend) = registry();
        fonts.create_ttf(1, "a.ttf", 12).unwrap();
        assert!(matches!(
            fonts.create_ttf(1, "b.ttf", 12),
            Err(EngineError::DuplicateId { .. })
        ));
        assert_eq!(fonts.get(1).unwrap().path, "a.ttf");
        fonts.delete(1).unwrap();
        assert!(fonts.get(1).unwrap_err().is_not_found());
        assert!(fonts.delete(1).unwrap_err().is_not_found());
        assert_eq!(backend.loaded_count(), 0);
    }

    #[test]
    fn buffered_creations_land_in_buffer_and_merge_into_primary() {
        let (fonts, _) = registry();
        fonts.create_ttf(3, "c.ttf", 10).unwrap();
        fonts.create_ttf(4, "d.ttf", 10).unwrap();

        fonts.set_producer_mode(true);
        fonts.create_ttf(1, "a.ttf", 10).unwrap();
        fonts.create_ttf(2, "b.ttf", 10).unwrap();
        assert_eq!(fonts.buffer_ids(), vec![1, 2]);
        assert_eq!(fonts.primary_ids(), vec![3, 4]);
        // Visible to lookups before the merge.
        assert_eq!(fonts.get(2).unwrap().path, "b.ttf");

        fonts.set_producer_mode(false);
        let summary = fonts.merge().unwrap();
        assert_eq!(summary, MergeSummary { swept: 0, migrated: 2 });
        assert_eq!(fonts.primary_ids(), vec![1, 2, 3, 4]);
        assert!(fonts.buffer_ids().is_empty());
        assert!(!fonts.merge_pending());
    }

    #[test]
    fn ids_are_unique_across_both_trees() {
        let (fonts, _) = registry();
        fonts.create_ttf(1, "a.ttf", 10).unwrap();
        fonts.set_producer_mode(true);
        assert!(matches!(
            fonts.create_ttf(1, "a.ttf", 10),
            Err(EngineError::DuplicateId { .. })
        ));
        fonts.create_ttf(2, "b.ttf", 10).unwrap();
        fonts.set_producer_mode(false);
        assert!(matches!(
            fonts.create_ttf(2, "b.ttf", 10),
            Err(EngineError::DuplicateId { .. })
        ));
    }

    #[test]
    fn buffered_deletes_tombstone_until_merge() {
        let (fonts, backend) = registry();
        fonts.create_ttf(1, "a.ttf", 10).unwrap();
        fonts.set_producer_mode(true);
        fonts.create_ttf(2, "b.ttf", 10).unwrap();

        fonts.delete(1).unwrap();
        fonts.delete(2).unwrap();
        assert!(fonts.get(1).is_err());
        assert!(fonts.get(2).is_err());
        assert_eq!(fonts.count(), 0);
        // Tombstoned entries are not deleted twice.
        assert!(fonts.delete(1).unwrap_err().is_not_found());
        // Still loaded until the merge sweeps them.
        assert_eq!(backend.loaded_count(), 2);

        fonts.set_producer_mode(false);
        let summary = fonts.merge().unwrap();
        assert_eq!(summary, MergeSummary { swept: 2, migrated: 0 });
        assert_eq!(backend.loaded_count(), 0);
        assert!(fonts.primary_ids().is_empty());
    }

    #[test]
    fn merge_is_refused_in_producer_mode() {
        let (fonts, _) = registry();
        fonts.set_producer_mode(true);
        fonts.create_ttf(1, "a.ttf", 10).unwrap();
        assert!(matches!(
            fonts.merge(),
            Err(EngineError::ConcurrencyMisuse(_))
        ));
        assert_eq!(fonts.buffer_ids(), vec![1]);
    }

    #[test]
    fn failed_load_registers_nothing() {
        let (fonts, _) = registry();
        assert!(matches!(
            fonts.create_ttf(1, "missing.otf", 10),
            Err(EngineError::Backend(_))
        ));
        assert!(matches!(
            fonts.create_ttf(1, "a.ttf", 0),
            Err(EngineError::InvalidArgument(_))
        ));
        assert_eq!(fonts.count(), 0);
    }

    #[test]
    fn set_style_reaches_buffered_and_primary_fonts() {
        let (fonts, _) = registry();
        fonts.create_ttf(1, "a.ttf", 10).unwrap();
        fonts.set_producer_mode(true);
        fonts.create_ttf(2, "b.ttf", 10).unwrap();
        fonts.set_style(1, FontStyle::BOLD).unwrap();
        fonts
            .set_style(2, FontStyle::ITALIC | FontStyle::UNDERLINE)
            .unwrap();
        assert_eq!(fonts.get(1).unwrap().style, FontStyle::BOLD);
        assert!(fonts.get(2).unwrap().style.contains(FontStyle::UNDERLINE));
        assert!(fonts.set_style(9, FontStyle::BOLD).is_err());
    }

    #[test]
    fn producer_thread_creations_merge_cleanly() {
        let (fonts, _) = registry();
        fonts.create_ttf(100, "base.ttf", 10).unwrap();
        fonts.set_producer_mode(true);

        let producer = fonts.clone();
        let worker = std::thread::spawn(move || {
            for id in 0..32 {
                producer.create_ttf(id, "worker.ttf", 14).unwrap();
            }
        });
        // Render-thread lookups interleave with the producer.
        for _ in 0..32 {
            assert!(fonts.get(100).is_ok());
        }
        worker.join().unwrap();

        fonts.set_producer_mode(false);
        fonts.merge().unwrap();
        assert_eq!(fonts.count(), 33);
        assert_eq!(fonts.primary_ids().len(), 33);
        assert!(fonts.buffer_ids().is_empty());
    }

    #[test]
    fn free_all_releases_every_handle() {
        let (fonts, backend) = registry();
        fonts.create_ttf(1, "a.ttf", 10).unwrap();
        fonts.set_producer_mode(true);
        fonts.create_ttf(2, "b.ttf", 10).unwrap();
        fonts.delete(1).unwrap();
        assert_eq!(fonts.free_all(), 2);
        assert_eq!(backend.loaded_count(), 0);
        assert_eq!(fonts.count(), 0);
    }
}
