//! # Component Storage
//!
//! Pre-allocated, dense component storage indexed by entity identifier.
//!
//! The storage uses a dense array strategy:
//! - All component slots are pre-allocated at creation
//! - Access is O(1) via entity index
//! - The array never grows, shrinks or moves

use super::entity::EntityId;

/// Fixed-capacity array for a single component type.
///
/// Slot `i` belongs to entity `i`. A slot holding `C::default()` is empty.
///
/// # Example
///
/// ```rust,ignore
/// let mut storage: ComponentStorage<Position> = ComponentStorage::new(1024);
/// storage.set(7, Position::new(100.0, 50.0));
/// ```
#[derive(Clone, Debug)]
pub struct ComponentStorage<C> {
    /// The dense array of components.
    data: Box<[C]>,
}

impl<C: Clone + Default> ComponentStorage<C> {
    /// Creates storage with `capacity` default-initialized slots.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");

        Self {
            data: vec![C::default(); capacity].into_boxed_slice(),
        }
    }

    /// Returns the capacity of this storage.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Gets a component by entity index.
    ///
    /// # Returns
    ///
    /// Reference to the component, or None if index is out of bounds.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&C> {
        self.data.get(index)
    }

    /// Gets a mutable component by entity index.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut C> {
        self.data.get_mut(index)
    }

    /// Returns the slot owned by `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is outside the capacity. Identifiers handed out by the
    /// manager's free list never are.
    #[inline]
    #[must_use]
    pub fn slot(&self, id: EntityId) -> &C {
        &self.data[id.index()]
    }

    /// Returns the slot owned by `id` mutably.
    ///
    /// # Panics
    ///
    /// Panics if `id` is outside the capacity.
    #[inline]
    pub fn slot_mut(&mut self, id: EntityId) -> &mut C {
        &mut self.data[id.index()]
    }

    /// Overwrites the slot at `index`.
    ///
    /// # Returns
    ///
    /// `true` if the component was set, `false` if index was out of bounds.
    #[inline]
    pub fn set(&mut self, index: usize, component: C) -> bool {
        if let Some(slot) = self.data.get_mut(index) {
            *slot = component;
            true
        } else {
            false
        }
    }

    /// Returns a slice of all components.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[C] {
        &self.data
    }

    /// Returns a mutable slice of all components.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [C] {
        &mut self.data
    }

    /// Iterates over all components with their indices.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (usize, &C)> {
        self.data.iter().enumerate()
    }

    /// Resets a component slot to its default value.
    #[inline]
    pub fn reset(&mut self, index: usize) {
        if let Some(slot) = self.data.get_mut(index) {
            *slot = C::default();
        }
    }

    /// Clears all components to their default values.
    pub fn clear(&mut self) {
        self.data.fill(C::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::component::{Collision, CollisionKind, Position};

    #[test]
    fn test_storage_creation() {
        let storage: ComponentStorage<Position> = ComponentStorage::new(1000);
        assert_eq!(storage.capacity(), 1000);
        assert!(storage.iter().all(|(_, p)| *p == Position::default()));
    }

    #[test]
    fn test_storage_get_set() {
        let mut storage: ComponentStorage<Position> = ComponentStorage::new(100);

        let pos = Position::new(1.0, 2.0);
        assert!(storage.set(50, pos));
        assert_eq!(*storage.slot(EntityId::new(50)), pos);
    }

    #[test]
    fn test_storage_bounds() {
        let mut storage: ComponentStorage<Position> = ComponentStorage::new(100);
        assert!(storage.get(100).is_none());
        assert!(storage.get(99).is_some());
        assert!(!storage.set(100, Position::new(1.0, 1.0)));
    }

    #[test]
    fn test_reset_restores_default() {
        let mut storage: ComponentStorage<Collision> = ComponentStorage::new(8);
        let slot = storage.slot_mut(EntityId::new(3));
        slot.kind = CollisionKind::Fish;
        slot.prev_cell_count = 4;
        slot.grid_cells.push((1, 2));

        storage.reset(3);
        assert_eq!(*storage.slot(EntityId::new(3)), Collision::default());
    }

    #[test]
    #[should_panic(expected = "Capacity must be greater than zero")]
    fn test_zero_capacity_panics() {
        let _storage: ComponentStorage<Position> = ComponentStorage::new(0);
    }
}
