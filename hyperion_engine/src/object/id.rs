/// Typed identities for table-resident objects

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Opaque handle to an object living in an identity table.
///
/// `value()` is 1-based; `0` is the "bad/unset" sentinel. The generation
/// half is bumped every time the slot is freed, so an id kept past its
/// object's lifetime never resolves to the slot's next occupant.
pub struct Id<T> {
    value: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    /// The "bad/unset" identity
    pub const BAD: Self = Self {
        value: 0,
        generation: 0,
        _marker: PhantomData,
    };

    pub(crate) fn new(value: u32, generation: u32) -> Self {
        debug_assert!(value != 0, "0 is reserved for the bad id");
        Self {
            value,
            generation,
            _marker: PhantomData,
        }
    }

    /// 1-based identity value (0 for the bad id)
    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn is_valid(&self) -> bool {
        self.value != 0
    }

    /// Dense slot index backing this identity
    pub(crate) fn slot(&self) -> usize {
        (self.value - 1) as usize
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.generation == other.generation
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
        self.generation.hash(state);
    }
}

impl<T> Default for Id<T> {
    fn default() -> Self {
        Self::BAD
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "Id({}#{})", self.value, self.generation)
        } else {
            write!(f, "Id(bad)")
        }
    }
}

/// Objects that remember the identity their table assigned to them
pub trait Identified: Sized {
    fn id(&self) -> Id<Self>;

    fn set_id(&mut self, id: Id<Self>);
}
