/// ObjectHolder - identity table for objects that own GPU state
///
/// Objects are created when added, or (with `defer_create`) all at once by
/// `create_all`. Removing an object destroys it before its slot is recycled.

use crate::error::{Error, Result};
use crate::object::{Id, Identified, ObjectVector};

/// GPU-backed objects with an explicit teardown step
pub trait GpuComponent {
    /// Release GPU state; must be safe on a never-created object
    fn destroy(&mut self) -> Result<()>;
}

pub struct ObjectHolder<T: Identified + GpuComponent> {
    objects: ObjectVector<T>,
    defer_create: bool,
    created: bool,
    /// Added while creation is deferred, in insertion order
    pending: Vec<Id<T>>,
}

impl<T: Identified + GpuComponent> ObjectHolder<T> {
    pub fn new(defer_create: bool) -> Self {
        Self {
            objects: ObjectVector::new(),
            defer_create,
            created: false,
            pending: Vec::new(),
        }
    }

    pub fn defer_create(&self) -> bool {
        self.defer_create
    }

    /// `create_all` has run (always false without `defer_create`)
    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Store `object` and create it with `create`, unless creation is deferred
    ///
    /// A failed creation destroys the object and leaves the table unchanged.
    ///
    /// # Panics
    ///
    /// Panics if the object already carries an identity.
    pub fn add(
        &mut self,
        object: T,
        create: impl FnOnce(&mut T) -> Result<()>,
    ) -> Result<Id<T>> {
        let id = self.objects.add(object);

        if self.defer_create && !self.created {
            self.pending.push(id);
            return Ok(id);
        }

        let Some(object) = self.objects.get_mut(id) else {
            unreachable!("object inserted above");
        };
        if let Err(error) = create(object) {
            if let Some(mut object) = self.objects.remove(id) {
                // The creation error is the one worth reporting
                let _ = object.destroy();
            }
            return Err(error);
        }
        Ok(id)
    }

    /// Create every object added while creation was deferred
    ///
    /// Objects added afterwards are created immediately.
    ///
    /// # Panics
    ///
    /// Panics if the holder was not built with `defer_create`.
    pub fn create_all(&mut self, mut create: impl FnMut(&mut T) -> Result<()>) -> Result<()> {
        assert!(self.defer_create, "create_all on a holder without defer_create");

        let pending = std::mem::take(&mut self.pending);
        for (index, id) in pending.iter().enumerate() {
            if let Some(object) = self.objects.get_mut(*id) {
                if let Err(error) = create(object) {
                    self.pending = pending[index..].to_vec();
                    return Err(error);
                }
            }
        }

        self.created = true;
        Ok(())
    }

    /// Destroy and drop the object behind `id`
    pub fn remove(&mut self, id: Id<T>) -> Result<()> {
        let Some(mut object) = self.objects.remove(id) else {
            return Err(Error::InvalidResource(format!("no object with id {:?}", id)));
        };
        self.pending.retain(|pending| *pending != id);
        object.destroy()
    }

    /// Destroy and drop every object, in slot order
    ///
    /// Keeps going past failures and returns the first one. The holder is
    /// back to its initial state afterwards.
    pub fn remove_all(&mut self) -> Result<()> {
        let mut result = Ok(());
        for mut object in self.objects.drain() {
            let destroyed = object.destroy();
            if result.is_ok() {
                result = destroyed;
            }
        }

        self.pending.clear();
        self.created = false;
        result
    }

    pub fn get(&self, id: Id<T>) -> Option<&T> {
        self.objects.get(id)
    }

    pub fn get_mut(&mut self, id: Id<T>) -> Option<&mut T> {
        self.objects.get_mut(id)
    }

    pub fn contains(&self, id: Id<T>) -> bool {
        self.objects.contains(id)
    }

    /// Identity of the first object matching `predicate`
    pub fn find(&self, predicate: impl FnMut(&T) -> bool) -> Option<Id<T>> {
        self.objects.find(predicate).map(|object| object.id())
    }

    /// Objects in slot order
    pub fn iter(&self) -> impl Iterator<Item = (Id<T>, &T)> + '_ {
        self.objects.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Id<T>, &mut T)> + '_ {
        self.objects.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl<T: Identified + GpuComponent> Default for ObjectHolder<T> {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
#[path = "object_holder_tests.rs"]
mod tests;
