//! # Identifier Free List
//!
//! Issues entity identifiers from a fixed pool and recycles them in the
//! order they were released. Identifier 0 is never handed out.

use super::entity::EntityId;
use std::collections::VecDeque;

/// FIFO pool of entity identifiers in `[1, capacity - 1]`.
///
/// Both [`FreeList::allocate`] and [`FreeList::release`] are O(1). The pool
/// does not track which identifiers are outstanding: releasing an identifier
/// twice is a caller bug and is not detected.
#[derive(Clone, Debug)]
pub struct FreeList {
    /// Identifiers available for allocation, front first.
    queue: VecDeque<EntityId>,
    /// Number of slots, including the reserved identifier 0.
    capacity: usize,
}

impl FreeList {
    /// Creates a pool holding every identifier in `[1, capacity - 1]`.
    ///
    /// # Panics
    ///
    /// Panics if capacity is less than 2 or does not fit in 32 bits.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 2, "Capacity must leave room for one identifier");
        assert!(
            capacity <= u32::MAX as usize,
            "Capacity cannot exceed u32::MAX"
        );

        let queue = (1..capacity as u32).map(EntityId::new).collect();

        Self { queue, capacity }
    }

    /// Takes the identifier at the front of the pool.
    ///
    /// # Returns
    ///
    /// The identifier, or [`EntityId::NULL`] if the pool is exhausted.
    #[inline]
    pub fn allocate(&mut self) -> EntityId {
        self.queue.pop_front().unwrap_or(EntityId::NULL)
    }

    /// Returns an identifier to the back of the pool.
    #[inline]
    pub fn release(&mut self, id: EntityId) {
        self.queue.push_back(id);
    }

    /// Returns the number of identifiers that can still be allocated.
    #[inline]
    #[must_use]
    pub fn available(&self) -> usize {
        self.queue.len()
    }

    /// Returns the number of slots, including the reserved identifier 0.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of identifiers currently handed out.
    #[inline]
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.capacity - 1 - self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_never_allocates_zero() {
        let mut list = FreeList::new(16);
        for _ in 0..15 {
            let id = list.allocate();
            assert!(!id.is_null());
        }
        assert!(list.allocate().is_null());
    }

    #[test]
    fn test_exhaustion_returns_null_until_release() {
        let mut list = FreeList::new(4);
        let ids: Vec<_> = (0..3).map(|_| list.allocate()).collect();
        assert_eq!(list.available(), 0);
        assert!(list.allocate().is_null());

        list.release(ids[1]);
        assert_eq!(list.allocate(), ids[1]);
    }

    #[test]
    fn test_reuse_follows_release_order() {
        let mut list = FreeList::new(4);
        let a = list.allocate();
        let b = list.allocate();
        let c = list.allocate();

        list.release(c);
        list.release(a);
        list.release(b);

        assert_eq!(list.allocate(), c);
        assert_eq!(list.allocate(), a);
        assert_eq!(list.allocate(), b);
    }

    #[test]
    fn test_fresh_identifiers_come_before_released_ones() {
        let mut list = FreeList::new(8);
        let first = list.allocate();
        list.release(first);

        assert_eq!(list.allocate(), EntityId::new(2));
        assert_eq!(list.in_use(), 1);
    }

    #[test]
    fn test_live_identifiers_are_unique() {
        let mut list = FreeList::new(64);
        let mut live = HashSet::new();

        for round in 0..200u32 {
            if round % 3 == 2 {
                if let Some(&id) = live.iter().next() {
                    live.remove(&id);
                    list.release(id);
                }
            } else {
                let id = list.allocate();
                if !id.is_null() {
                    assert!(live.insert(id), "identifier {id} handed out twice");
                }
            }
        }
    }
}
