/// ObjectMap - sparse identity-to-value side table

use std::marker::PhantomData;

use crate::object::Id;

/// Maps identities to values through a sparse index over a dense value array.
///
/// `index_map[id - 1]` holds the 1-based position of the id's value in
/// `values` (0 = absent). The index is sized to the next power of two that
/// covers the highest live id. Removal compacts `values`, so every index
/// pointing past the removed entry is shifted down; O(n), fine for
/// pipeline-scale tables.
pub struct ObjectMap<K, V> {
    index_map: Vec<usize>,
    keys: Vec<u32>,
    values: Vec<V>,
    _marker: PhantomData<fn() -> K>,
}

impl<K, V> ObjectMap<K, V> {
    pub fn new() -> Self {
        Self {
            index_map: Vec::new(),
            keys: Vec::new(),
            values: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Set the value for `id`, replacing any previous one
    pub fn insert(&mut self, id: Id<K>, value: V) {
        assert!(id.is_valid(), "cannot map the bad id");

        let key = id.value() as usize;
        if key > self.index_map.len() {
            self.index_map.resize(key.next_power_of_two(), 0);
        }

        match self.index_map[key - 1] {
            0 => {
                self.values.push(value);
                self.keys.push(id.value());
                self.index_map[key - 1] = self.values.len();
            }
            position => self.values[position - 1] = value,
        }
    }

    fn position(&self, id: Id<K>) -> Option<usize> {
        if !id.is_valid() {
            return None;
        }
        match self.index_map.get(id.value() as usize - 1) {
            Some(&position) if position != 0 => Some(position - 1),
            _ => None,
        }
    }

    pub fn contains(&self, id: Id<K>) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: Id<K>) -> Option<&V> {
        self.position(id).map(|position| &self.values[position])
    }

    pub fn get_mut(&mut self, id: Id<K>) -> Option<&mut V> {
        self.position(id).map(move |position| &mut self.values[position])
    }

    pub fn remove(&mut self, id: Id<K>) -> Option<V> {
        let position = self.position(id)?;

        let value = self.values.remove(position);
        self.keys.remove(position);
        self.index_map[id.value() as usize - 1] = 0;

        let removed = position + 1;
        for index in self.index_map.iter_mut() {
            if *index > removed {
                *index -= 1;
            }
        }

        self.trim();
        Some(value)
    }

    /// Shrink the index to the next power of two covering the highest live id
    fn trim(&mut self) {
        let highest = self.keys.iter().copied().max().unwrap_or(0) as usize;
        let wanted = if highest == 0 { 0 } else { highest.next_power_of_two() };
        if wanted < self.index_map.len() {
            self.index_map.truncate(wanted);
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Capacity of the sparse index (always zero or a power of two)
    pub fn index_capacity(&self) -> usize {
        self.index_map.len()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.values.iter()
    }

    /// Raw 1-based identity values currently mapped, in insertion order
    pub fn keys(&self) -> impl Iterator<Item = u32> + '_ {
        self.keys.iter().copied()
    }

    pub fn clear(&mut self) {
        self.index_map.clear();
        self.keys.clear();
        self.values.clear();
    }
}

impl<K, V> Default for ObjectMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "object_map_tests.rs"]
mod tests;
