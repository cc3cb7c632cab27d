/// RefCounter - shared ownership of identified objects
///
/// Objects added to a `RefCounter` are handed out through `Ref<T>` handles.
/// Cloning a handle acquires one more reference; dropping (or `release`-ing)
/// one gives it back. The last release removes the object from the table and
/// drops it, so its teardown runs exactly once.

use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::object::{Id, Identified, ObjectMap, ObjectVector};

struct RefTable<T> {
    objects: ObjectVector<Arc<T>, T>,
    ref_counts: ObjectMap<T, usize>,
}

type SharedTable<T> = Arc<Mutex<RefTable<T>>>;

fn lock<T>(table: &Mutex<RefTable<T>>) -> MutexGuard<'_, RefTable<T>> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Table of reference-counted objects
pub struct RefCounter<T: Identified> {
    table: SharedTable<T>,
}

impl<T: Identified> RefCounter<T> {
    pub fn new() -> Self {
        Self {
            table: Arc::new(Mutex::new(RefTable {
                objects: ObjectVector::new(),
                ref_counts: ObjectMap::new(),
            })),
        }
    }

    /// Take ownership of `object` and return the first reference to it
    ///
    /// # Panics
    ///
    /// Panics if the object already carries an identity.
    pub fn add(&self, mut object: T) -> Ref<T> {
        assert!(
            !object.id().is_valid(),
            "object already carries identity {:?}",
            object.id()
        );

        let mut table = lock(&self.table);
        let id = table.objects.insert_with(|id| {
            object.set_id(id);
            Arc::new(object)
        });
        table.ref_counts.insert(id, 1);

        let object = table.objects.get(id).map(Arc::clone);
        Ref {
            id,
            object: object.unwrap_or_else(|| unreachable!("object inserted above")),
            table: Arc::clone(&self.table),
        }
    }

    /// Acquire a new reference to a live object
    pub fn get(&self, id: Id<T>) -> Option<Ref<T>> {
        let mut table = lock(&self.table);
        let object = table.objects.get(id).map(Arc::clone)?;
        if let Some(count) = table.ref_counts.get_mut(id) {
            *count += 1;
        }

        Some(Ref {
            id,
            object,
            table: Arc::clone(&self.table),
        })
    }

    /// Number of live references to `id` (0 once released, even after its
    /// slot is reused)
    pub fn ref_count(&self, id: Id<T>) -> usize {
        let table = lock(&self.table);
        if !table.objects.contains(id) {
            return 0;
        }
        table.ref_counts.get(id).copied().unwrap_or(0)
    }

    pub fn contains(&self, id: Id<T>) -> bool {
        lock(&self.table).objects.contains(id)
    }

    pub fn len(&self) -> usize {
        lock(&self.table).objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Identified> Default for RefCounter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Identified> Drop for RefCounter<T> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }
        let live = lock(&self.table).objects.len();
        assert!(
            live == 0,
            "RefCounter dropped while {} object(s) still referenced",
            live
        );
    }
}

/// Counted reference to an object living in a `RefCounter`
pub struct Ref<T: Identified> {
    id: Id<T>,
    object: Arc<T>,
    table: SharedTable<T>,
}

impl<T: Identified> Ref<T> {
    pub fn id(&self) -> Id<T> {
        self.id
    }

    /// Give the reference back; the object is dropped if this was the last one
    pub fn release(self) {
        drop(self);
    }
}

impl<T: Identified> Deref for Ref<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.object
    }
}

impl<T: Identified> Clone for Ref<T> {
    fn clone(&self) -> Self {
        let mut table = lock(&self.table);
        if let Some(count) = table.ref_counts.get_mut(self.id) {
            *count += 1;
        }

        Self {
            id: self.id,
            object: Arc::clone(&self.object),
            table: Arc::clone(&self.table),
        }
    }
}

impl<T: Identified> Drop for Ref<T> {
    fn drop(&mut self) {
        let released = {
            let mut table = lock(&self.table);
            let remaining = match table.ref_counts.get_mut(self.id) {
                Some(count) => {
                    *count -= 1;
                    *count
                }
                None => return,
            };

            if remaining == 0 {
                table.ref_counts.remove(self.id);
                table.objects.remove(self.id)
            } else {
                None
            }
        };

        // Dropped outside the lock; `self.object` goes right after
        drop(released);
    }
}

impl<T: Identified> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ref").field("id", &self.id).finish()
    }
}

#[cfg(test)]
#[path = "ref_counter_tests.rs"]
mod tests;
