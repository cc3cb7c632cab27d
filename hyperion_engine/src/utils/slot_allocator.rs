/// Allocates and recycles dense `u32` slot indices.
///
/// Backing allocator of the identity tables: a freed index is handed out
/// again before the storage grows. Freeing an index twice is a logic bug
/// and aborts.
///
/// # Example
///
/// ```ignore
/// let mut alloc = SlotAllocator::new();
/// let a = alloc.alloc();  // 0
/// let b = alloc.alloc();  // 1
/// alloc.free(a);          // 0 is now available
/// let c = alloc.alloc();  // 0 (recycled)
/// ```
#[derive(Debug)]
pub struct SlotAllocator {
    free_list: Vec<u32>,
    in_use: Vec<bool>,
    len: u32,
}

impl SlotAllocator {
    /// Create a new empty allocator
    pub fn new() -> Self {
        Self {
            free_list: Vec::new(),
            in_use: Vec::new(),
            len: 0,
        }
    }

    /// Allocate the next available slot index, recycled indices first
    pub fn alloc(&mut self) -> u32 {
        self.len += 1;
        match self.free_list.pop() {
            Some(slot) => {
                self.in_use[slot as usize] = true;
                slot
            }
            None => {
                self.in_use.push(true);
                (self.in_use.len() - 1) as u32
            }
        }
    }

    /// Return a slot index to the pool for reuse
    ///
    /// # Panics
    ///
    /// Panics if the slot was never allocated or is already free.
    pub fn free(&mut self, slot: u32) {
        assert!(self.is_allocated(slot), "freeing slot {} which is not allocated", slot);
        self.in_use[slot as usize] = false;
        self.len -= 1;
        self.free_list.push(slot);
    }

    /// Whether `slot` is currently handed out
    pub fn is_allocated(&self, slot: u32) -> bool {
        self.in_use.get(slot as usize).copied().unwrap_or(false)
    }

    /// Number of currently allocated slots
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Whether no slots are currently allocated
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for SlotAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "slot_allocator_tests.rs"]
mod tests;
