// ── Ordered entity collection ──
//
// Insertion-ordered storage keyed by `EntityId`. Values are `Arc`-shared so
// cloning a collection for a new store snapshot only bumps refcounts.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::model::{EntityId, Identified};

/// An insertion-ordered collection with unique ids.
///
/// Every mutator reports whether it changed anything, so the store can
/// skip notifying subscribers on no-ops.
#[derive(Debug)]
pub(crate) struct EntityCollection<T> {
    items: IndexMap<EntityId, Arc<T>>,
}

impl<T> Clone for EntityCollection<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
        }
    }
}

impl<T> Default for EntityCollection<T> {
    fn default() -> Self {
        Self {
            items: IndexMap::new(),
        }
    }
}

impl<T: Identified + PartialEq> EntityCollection<T> {
    /// Build from a list. A repeated id keeps its first position and takes
    /// the last value.
    pub(crate) fn from_items(items: impl IntoIterator<Item = T>) -> Self {
        let mut map = IndexMap::new();
        for item in items {
            map.insert(item.id().clone(), Arc::new(item));
        }
        Self { items: map }
    }

    /// Append a new entity. No-op if the id is already present.
    pub(crate) fn insert_new(&mut self, item: T) -> bool {
        if self.items.contains_key(item.id()) {
            return false;
        }
        self.items.insert(item.id().clone(), Arc::new(item));
        true
    }

    /// Replace the entity with the same id, keeping its position. No-op if
    /// absent or identical.
    pub(crate) fn replace(&mut self, item: T) -> bool {
        match self.items.get_mut(item.id()) {
            Some(slot) if **slot != item => {
                *slot = Arc::new(item);
                true
            }
            _ => false,
        }
    }

    /// Apply `f` to the entity with `id` in place. `f` returns whether it
    /// changed anything.
    pub(crate) fn modify(&mut self, id: &EntityId, f: impl FnOnce(&mut T) -> bool) -> bool
    where
        T: Clone,
    {
        match self.items.get_mut(id) {
            Some(slot) => f(Arc::make_mut(slot)),
            None => false,
        }
    }

    /// Remove by id, preserving the order of the rest.
    pub(crate) fn remove(&mut self, id: &EntityId) -> bool {
        self.items.shift_remove(id).is_some()
    }

    pub(crate) fn clear(&mut self) -> bool {
        if self.items.is_empty() {
            return false;
        }
        self.items.clear();
        true
    }

    /// Same ids, same order, same values.
    pub(crate) fn same_as(&self, other: &Self) -> bool {
        self.items.len() == other.items.len()
            && self
                .items
                .iter()
                .zip(other.items.iter())
                .all(|((ka, va), (kb, vb))| ka == kb && va == vb)
    }
}

impl<T> EntityCollection<T> {
    pub(crate) fn get(&self, id: &EntityId) -> Option<Arc<T>> {
        self.items.get(id).cloned()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Arc<T>> {
        self.items.values()
    }

    /// All entities in insertion order.
    pub(crate) fn to_vec(&self) -> Vec<Arc<T>> {
        self.items.values().cloned().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    #[cfg(test)]
    pub(crate) fn ids(&self) -> Vec<EntityId> {
        self.items.keys().cloned().collect()
    }
}
