/// ObjectVector - slot arena issuing typed identities

use std::marker::PhantomData;

use crate::object::{Id, Identified};
use crate::utils::SlotAllocator;

/// Dense arena of objects addressed by `Id<K>`.
///
/// Slots are recycled (freed index first) and each slot carries a
/// generation so stale ids miss. Iteration follows slot order, which is
/// stable relative to identity assignment.
///
/// `K` is the identity type; it defaults to the stored type and differs only
/// when objects are stored behind a wrapper (e.g. `Arc<T>` in `RefCounter`).
pub struct ObjectVector<T, K = T> {
    slots: Vec<Option<T>>,
    generations: Vec<u32>,
    allocator: SlotAllocator,
    _marker: PhantomData<fn() -> K>,
}

impl<T, K> ObjectVector<T, K> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            generations: Vec::new(),
            allocator: SlotAllocator::new(),
            _marker: PhantomData,
        }
    }

    /// Store the value built by `make`, which receives the identity assigned to it
    pub fn insert_with(&mut self, make: impl FnOnce(Id<K>) -> T) -> Id<K> {
        let slot = self.allocator.alloc() as usize;
        if slot == self.slots.len() {
            self.slots.push(None);
            self.generations.push(0);
        }

        let id = Id::new(slot as u32 + 1, self.generations[slot]);
        self.slots[slot] = Some(make(id));
        id
    }

    pub fn insert(&mut self, value: T) -> Id<K> {
        self.insert_with(|_| value)
    }

    pub fn contains(&self, id: Id<K>) -> bool {
        id.is_valid()
            && id.slot() < self.slots.len()
            && self.generations[id.slot()] == id.generation()
            && self.slots[id.slot()].is_some()
    }

    pub fn get(&self, id: Id<K>) -> Option<&T> {
        if !self.contains(id) {
            return None;
        }
        self.slots[id.slot()].as_ref()
    }

    pub fn get_mut(&mut self, id: Id<K>) -> Option<&mut T> {
        if !self.contains(id) {
            return None;
        }
        self.slots[id.slot()].as_mut()
    }

    /// Take the object out and recycle its slot
    pub fn remove(&mut self, id: Id<K>) -> Option<T> {
        if !self.contains(id) {
            return None;
        }

        let slot = id.slot();
        let value = self.slots[slot].take();
        self.generations[slot] = self.generations[slot].wrapping_add(1);
        self.allocator.free(slot as u32);
        value
    }

    /// Remove every object, returned in slot order
    pub fn drain(&mut self) -> Vec<T> {
        let ids: Vec<Id<K>> = self.ids();
        ids.into_iter().filter_map(|id| self.remove(id)).collect()
    }

    pub fn ids(&self) -> Vec<Id<K>> {
        self.iter().map(|(id, _)| id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Id<K>, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(slot, value)| {
            value
                .as_ref()
                .map(|v| (Id::new(slot as u32 + 1, self.generations[slot]), v))
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Id<K>, &mut T)> + '_ {
        let generations = &self.generations;
        self.slots.iter_mut().enumerate().filter_map(move |(slot, value)| {
            value
                .as_mut()
                .map(|v| (Id::new(slot as u32 + 1, generations[slot]), v))
        })
    }

    pub fn len(&self) -> usize {
        self.allocator.len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.allocator.is_empty()
    }
}

impl<T: Identified> ObjectVector<T> {
    /// Add an object that does not carry an identity yet
    ///
    /// # Panics
    ///
    /// Panics if the object already has an identity (it lives in another table).
    pub fn add(&mut self, mut object: T) -> Id<T> {
        assert!(
            !object.id().is_valid(),
            "object already carries identity {:?}",
            object.id()
        );
        self.insert_with(|id| {
            object.set_id(id);
            object
        })
    }

    /// First object matching `predicate`
    pub fn find(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<&T> {
        self.iter().map(|(_, object)| object).find(|object| predicate(object))
    }
}

impl<T, K> Default for ObjectVector<T, K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "object_vector_tests.rs"]
mod tests;
