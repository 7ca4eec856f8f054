//! Ordered, id-keyed entity registry.
//!
//! [`Registry`] is the container used for every entity kind. Entries live in
//! a slot arena; a `BTreeMap` keyed by the client id maps to the slot, so
//! lookups are `O(log n)` regardless of insertion order and traversal is
//! always in ascending id order.
//!
//! A one-entry "last accessed" cache short-circuits the map search when the
//! same id is touched repeatedly within a frame. The cache is refreshed on
//! every successful create and lookup and invalidated when the cached entry
//! is deleted or tombstoned.
//!
//! Entries can also be tombstoned: they stay in storage but are invisible to
//! every lookup until [`Registry::sweep_tombstones`] removes them. Only the
//! font registry uses this, see [`crate::resources::fontregistry`].

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use bevy_ecs::prelude::Resource;

use crate::error::{EngineError, EngineResult, EntityKind};

/// Payload types stored in a [`Registry`].
pub trait RegistryEntry: Send + Sync + 'static {
    /// Registry kind used in error messages.
    const KIND: EntityKind;
}

const EMPTY_CACHE: u64 = u64::MAX;

fn pack(id: u32, slot: usize) -> u64 {
    ((id as u64) << 32) | (slot as u32 as u64)
}

#[derive(Debug)]
struct Node<T> {
    id: u32,
    tombstoned: bool,
    value: T,
}

/// Id-keyed container for one entity kind.
#[derive(Resource)]
pub struct Registry<T> {
    slots: Vec<Option<Node<T>>>,
    free: Vec<usize>,
    index: BTreeMap<u32, usize>,
    tombstones: u32,
    last: AtomicU64,
}

impl<T: RegistryEntry> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: RegistryEntry> Registry<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            index: BTreeMap::new(),
            tombstones: 0,
            last: AtomicU64::new(EMPTY_CACHE),
        }
    }

    pub fn kind(&self) -> EntityKind {
        T::KIND
    }

    fn not_found(id: u32) -> EngineError {
        EngineError::NotFound { kind: T::KIND, id }
    }

    fn remember(&self, id: u32, slot: usize) {
        self.last.store(pack(id, slot), Ordering::Relaxed);
    }

    fn forget(&self, id: u32) {
        let packed = self.last.load(Ordering::Relaxed);
        if packed != EMPTY_CACHE && (packed >> 32) as u32 == id {
            self.last.store(EMPTY_CACHE, Ordering::Relaxed);
        }
    }

    /// Resolve `id` to the slot of a live entry, consulting the cache first.
    fn locate(&self, id: u32) -> Option<usize> {
        let packed = self.last.load(Ordering::Relaxed);
        if packed != EMPTY_CACHE && (packed >> 32) as u32 == id {
            let slot = packed as u32 as usize;
            if let Some(Some(node)) = self.slots.get(slot) {
                if node.id == id && !node.tombstoned {
                    return Some(slot);
                }
            }
        }
        let slot = *self.index.get(&id)?;
        match &self.slots[slot] {
            Some(node) if !node.tombstoned => Some(slot),
            _ => None,
        }
    }

    /// Insert `value` under `id`. Fails without mutation if `id` is already
    /// stored, tombstoned entries included.
    pub fn insert(&mut self, id: u32, value: T) -> EngineResult<&mut T> {
        if self.index.contains_key(&id) {
            return Err(EngineError::DuplicateId { kind: T::KIND, id });
        }
        let node = Node {
            id,
            tombstoned: false,
            value,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                slot
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };
        self.index.insert(id, slot);
        self.remember(id, slot);
        log::trace!("{} {} created in slot {}", T::KIND, id, slot);
        match self.slots[slot].as_mut() {
            Some(node) => Ok(&mut node.value),
            None => Err(Self::not_found(id)),
        }
    }

    /// Create an entry with the default payload.
    pub fn create(&mut self, id: u32) -> EngineResult<&mut T>
    where
        T: Default,
    {
        self.insert(id, T::default())
    }

    /// True if a live (not tombstoned) entry exists for `id`.
    pub fn contains(&self, id: u32) -> bool {
        self.locate(id).is_some()
    }

    /// True if `id` is stored, live or tombstoned.
    pub fn holds(&self, id: u32) -> bool {
        self.index.contains_key(&id)
    }

    pub fn is_tombstoned(&self, id: u32) -> bool {
        self.index
            .get(&id)
            .and_then(|slot| self.slots[*slot].as_ref())
            .is_some_and(|node| node.tombstoned)
    }

    pub fn get(&self, id: u32) -> EngineResult<&T> {
        let slot = self.locate(id).ok_or_else(|| Self::not_found(id))?;
        self.remember(id, slot);
        match &self.slots[slot] {
            Some(node) => Ok(&node.value),
            None => Err(Self::not_found(id)),
        }
    }

    pub fn get_mut(&mut self, id: u32) -> EngineResult<&mut T> {
        let slot = self.locate(id).ok_or_else(|| Self::not_found(id))?;
        self.remember(id, slot);
        match self.slots[slot].as_mut() {
            Some(node) => Ok(&mut node.value),
            None => Err(Self::not_found(id)),
        }
    }

    /// Structurally remove a live entry and hand back its payload.
    pub fn delete(&mut self, id: u32) -> EngineResult<T> {
        if self.locate(id).is_none() {
            return Err(Self::not_found(id));
        }
        self.remove_stored(id).ok_or_else(|| Self::not_found(id))
    }

    fn remove_stored(&mut self, id: u32) -> Option<T> {
        let slot = self.index.remove(&id)?;
        let node = self.slots[slot].take()?;
        self.free.push(slot);
        self.forget(id);
        if node.tombstoned {
            self.tombstones -= 1;
        }
        log::trace!("{} {} removed from slot {}", T::KIND, id, slot);
        Some(node.value)
    }

    /// Mark a live entry as deleted without removing it from storage.
    pub fn tombstone(&mut self, id: u32) -> EngineResult<()> {
        let slot = self.locate(id).ok_or_else(|| Self::not_found(id))?;
        if let Some(node) = self.slots[slot].as_mut() {
            node.tombstoned = true;
            self.tombstones += 1;
        }
        self.forget(id);
        Ok(())
    }

    /// Remove every tombstoned entry, returning the payloads in id order so
    /// the caller can release any backend handles they hold.
    pub fn sweep_tombstones(&mut self) -> Vec<(u32, T)> {
        if self.tombstones == 0 {
            return Vec::new();
        }
        let dead: Vec<u32> = self
            .index
            .iter()
            .filter(|(_, slot)| {
                self.slots[**slot]
                    .as_ref()
                    .is_some_and(|node| node.tombstoned)
            })
            .map(|(id, _)| *id)
            .collect();
        dead.into_iter()
            .filter_map(|id| self.remove_stored(id).map(|value| (id, value)))
            .collect()
    }

    /// Remove every stored entry (tombstoned ones included), in id order.
    pub fn take_all(&mut self) -> Vec<(u32, T)> {
        let ids: Vec<u32> = self.index.keys().copied().collect();
        let taken = ids
            .into_iter()
            .filter_map(|id| self.remove_stored(id).map(|value| (id, value)))
            .collect();
        self.slots.clear();
        self.free.clear();
        self.last.store(EMPTY_CACHE, Ordering::Relaxed);
        taken
    }

    /// Number of live entries.
    pub fn count(&self) -> u32 {
        self.index.len() as u32 - self.tombstones
    }

    /// Number of tombstoned entries awaiting a sweep.
    pub fn tombstone_count(&self) -> u32 {
        self.tombstones
    }

    /// True if nothing is stored, not even tombstones.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Id of the cached last-accessed entry, if any.
    pub fn last_accessed(&self) -> Option<u32> {
        let packed = self.last.load(Ordering::Relaxed);
        (packed != EMPTY_CACHE).then_some((packed >> 32) as u32)
    }

    /// Live entries in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> + '_ {
        self.index.iter().filter_map(|(id, slot)| match &self.slots[*slot] {
            Some(node) if !node.tombstoned => Some((*id, &node.value)),
            _ => None,
        })
    }

    /// Visit live entries in ascending id order.
    pub fn for_each(&self, mut visitor: impl FnMut(u32, &T)) {
        for (id, value) in self.iter() {
            visitor(id, value);
        }
    }

    /// Visit live entries mutably in ascending id order.
    pub fn for_each_mut(&mut self, mut visitor: impl FnMut(u32, &mut T)) {
        for slot in self.index.values() {
            if let Some(node) = self.slots[*slot].as_mut() {
                if !node.tombstoned {
                    visitor(node.id, &mut node.value);
                }
            }
        }
    }

    /// Live ids in ascending order.
    pub fn ids(&self) -> Vec<u32> {
        self.iter().map(|(id, _)| id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Dummy {
        value: i32,
    }

    impl RegistryEntry for Dummy {
        const KIND: EntityKind = EntityKind::Line;
    }

    fn registry_with(ids: &[u32]) -> Registry<Dummy> {
        let mut reg: Registry<Dummy> = Registry::new();
        for id in ids {
            reg.create(*id).unwrap().value = *id as i32 * 10;
        }
        reg
    }

    #[test]
    fn duplicate_create_is_rejected_without_mutation() {
        let mut reg = registry_with(&[5]);
        reg.get_mut(5).unwrap().value = 42;

        let err = reg.create(5).unwrap_err();
        assert_eq!(
            err,
            EngineError::DuplicateId {
                kind: EntityKind::Line,
                id: 5
            }
        );
        assert_eq!(reg.count(), 1);
        assert_eq!(reg.get(5).unwrap().value, 42);
    }

    #[test]
    fn missing_ids_report_not_found() {
        let mut reg = registry_with(&[1, 2]);
        assert!(reg.get(3).unwrap_err().is_not_found());
        assert!(reg.get_mut(3).unwrap_err().is_not_found());
        assert!(reg.delete(3).unwrap_err().is_not_found());
        assert_eq!(reg.count(), 2);
    }

    #[test]
    fn create_then_delete_then_get_misses() {
        let mut reg = registry_with(&[9]);
        let removed = reg.delete(9).unwrap();
        assert_eq!(removed.value, 90);
        assert!(reg.get(9).is_err());
        assert_eq!(reg.count(), 0);
        assert!(reg.is_empty());
    }

    #[test]
    fn traversal_is_in_id_order_not_insertion_order() {
        let reg = registry_with(&[50, 10, 40, 20, 30]);
        assert_eq!(reg.ids(), vec![10, 20, 30, 40, 50]);

        let mut seen = Vec::new();
        reg.for_each(|id, d| seen.push((id, d.value)));
        assert_eq!(seen[0], (10, 100));
        assert_eq!(seen[4], (50, 500));
    }

    #[test]
    fn deleting_inner_entries_keeps_order() {
        let mut reg = registry_with(&[4, 2, 6, 1, 3, 5, 7]);
        reg.delete(4).unwrap();
        reg.delete(2).unwrap();
        assert_eq!(reg.ids(), vec![1, 3, 5, 6, 7]);
        assert_eq!(reg.count(), 5);
    }

    #[test]
    fn slots_are_reused_after_delete() {
        let mut reg = registry_with(&[1, 2, 3]);
        reg.delete(2).unwrap();
        reg.create(8).unwrap();
        assert_eq!(reg.slots.len(), 3);
        assert_eq!(reg.get(8).unwrap().value, 0);
    }

    #[test]
    fn cache_tracks_last_access_and_is_invalidated_on_delete() {
        let mut reg = registry_with(&[1, 2, 3]);
        assert_eq!(reg.last_accessed(), Some(3));

        reg.get(1).unwrap();
        assert_eq!(reg.last_accessed(), Some(1));

        reg.delete(1).unwrap();
        assert_eq!(reg.last_accessed(), None);
        assert!(reg.get(1).is_err());

        // A reused slot must not be served through a stale cache entry.
        reg.get(2).unwrap();
        reg.delete(2).unwrap();
        reg.create(20).unwrap();
        assert!(reg.get(2).is_err());
        assert_eq!(reg.get(20).unwrap().value, 0);
    }

    #[test]
    fn failed_lookups_do_not_touch_cache() {
        let reg = registry_with(&[1]);
        assert!(reg.get(99).is_err());
        assert_eq!(reg.last_accessed(), Some(1));
    }

    #[test]
    fn tombstoned_entries_are_invisible_until_swept() {
        let mut reg = registry_with(&[1, 2, 3]);
        reg.tombstone(2).unwrap();

        assert!(!reg.contains(2));
        assert!(reg.holds(2));
        assert!(reg.is_tombstoned(2));
        assert!(reg.get(2).is_err());
        assert_eq!(reg.count(), 2);
        assert_eq!(reg.ids(), vec![1, 3]);
        // The id is still taken until the sweep runs.
        assert!(reg.create(2).is_err());
        // Tombstoning twice reports the entry as gone.
        assert!(reg.tombstone(2).unwrap_err().is_not_found());

        let swept = reg.sweep_tombstones();
        assert_eq!(swept, vec![(2, Dummy { value: 20 })]);
        assert_eq!(reg.tombstone_count(), 0);
        assert!(!reg.holds(2));
        reg.create(2).unwrap();
        assert_eq!(reg.count(), 3);
    }

    #[test]
    fn take_all_empties_the_registry() {
        let mut reg = registry_with(&[3, 1, 2]);
        reg.tombstone(1).unwrap();
        let all = reg.take_all();
        assert_eq!(
            all.iter().map(|(id, _)| *id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(reg.is_empty());
        assert_eq!(reg.count(), 0);
        assert_eq!(reg.last_accessed(), None);
    }

    #[test]
    fn for_each_mut_updates_in_place() {
        let mut reg = registry_with(&[1, 2]);
        reg.for_each_mut(|_, d| d.value += 1);
        assert_eq!(reg.get(1).unwrap().value, 11);
        assert_eq!(reg.get(2).unwrap().value, 21);
    }
}
