//! # Component Registry
//!
//! Owns one fixed-capacity array per component kind. Generic code reaches
//! "the array for `T`" through [`Component::storage`]; the indirect sprite
//! array is reached through [`ComponentRegistry::sprites`].

use super::component::{
    Animation, Attack, Collision, Color, Component, ComponentKind, Distortion, Input, Pathing,
    Physics, Player, Position, Rotation, Score, Store, Velocity,
};
use super::entity::EntityId;
use super::sprite::SpriteStorage;
use super::storage::ComponentStorage;

/// All component storage of one entity manager.
///
/// Built once at construction; no array is ever resized.
#[derive(Clone, Debug)]
pub struct ComponentRegistry {
    capacity: usize,

    // =========================================================================
    // Component Storages - one per kind
    // =========================================================================
    sprites: SpriteStorage,
    colors: ComponentStorage<Color>,
    positions: ComponentStorage<Position>,
    velocities: ComponentStorage<Velocity>,
    rotations: ComponentStorage<Rotation>,
    physics: ComponentStorage<Physics>,
    collisions: ComponentStorage<Collision>,
    inputs: ComponentStorage<Input>,
    attacks: ComponentStorage<Attack>,
    scores: ComponentStorage<Score>,
    pathings: ComponentStorage<Pathing>,
    animations: ComponentStorage<Animation>,
    stores: ComponentStorage<Store>,
    distortions: ComponentStorage<Distortion>,
    player: ComponentStorage<Player>,
}

impl ComponentRegistry {
    /// Creates every array with `capacity` empty slots; the player array
    /// has exactly one.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            sprites: SpriteStorage::new(capacity),
            colors: ComponentStorage::new(capacity),
            positions: ComponentStorage::new(capacity),
            velocities: ComponentStorage::new(capacity),
            rotations: ComponentStorage::new(capacity),
            physics: ComponentStorage::new(capacity),
            collisions: ComponentStorage::new(capacity),
            inputs: ComponentStorage::new(capacity),
            attacks: ComponentStorage::new(capacity),
            scores: ComponentStorage::new(capacity),
            pathings: ComponentStorage::new(capacity),
            animations: ComponentStorage::new(capacity),
            stores: ComponentStorage::new(capacity),
            distortions: ComponentStorage::new(capacity),
            player: ComponentStorage::new(1),
        }
    }

    /// Number of slots per array.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// The typed array for component `T`.
    #[inline]
    #[must_use]
    pub fn components<T: Component>(&self) -> &ComponentStorage<T> {
        T::storage(self)
    }

    /// The typed array for component `T`, mutably.
    #[inline]
    pub fn components_mut<T: Component>(&mut self) -> &mut ComponentStorage<T> {
        T::storage_mut(self)
    }

    /// The indirect sprite array.
    #[inline]
    #[must_use]
    pub fn sprites(&self) -> &SpriteStorage {
        &self.sprites
    }

    /// The indirect sprite array, mutably.
    #[inline]
    pub fn sprites_mut(&mut self) -> &mut SpriteStorage {
        &mut self.sprites
    }

    /// The singleton player record.
    #[inline]
    #[must_use]
    pub fn player(&self) -> &Player {
        self.player.slot(EntityId::NULL)
    }

    /// The singleton player record, mutably.
    #[inline]
    pub fn player_mut(&mut self) -> &mut Player {
        self.player.slot_mut(EntityId::NULL)
    }

    /// Deinitializes the slot of `kind` owned by `id`.
    ///
    /// For the indirect sprite kind this resets the referenced sub-array
    /// slot as well as the reference. The player singleton is not
    /// per-entity and is left untouched.
    pub fn reset(&mut self, kind: ComponentKind, id: EntityId) {
        let index = id.index();
        match kind {
            ComponentKind::Sprite => self.sprites.reset(id),
            ComponentKind::Color => self.colors.reset(index),
            ComponentKind::Position => self.positions.reset(index),
            ComponentKind::Velocity => self.velocities.reset(index),
            ComponentKind::Rotation => self.rotations.reset(index),
            ComponentKind::Physics => self.physics.reset(index),
            ComponentKind::Collision => self.collisions.reset(index),
            ComponentKind::Input => self.inputs.reset(index),
            ComponentKind::Attack => self.attacks.reset(index),
            ComponentKind::Score => self.scores.reset(index),
            ComponentKind::Pathing => self.pathings.reset(index),
            ComponentKind::Animation => self.animations.reset(index),
            ComponentKind::Store => self.stores.reset(index),
            ComponentKind::Distortion => self.distortions.reset(index),
            ComponentKind::Player => {}
        }
    }
}

macro_rules! register_components {
    ($($ty:ty => $kind:ident, $field:ident;)*) => {
        $(
            impl Component for $ty {
                const KIND: ComponentKind = ComponentKind::$kind;

                #[inline]
                fn storage(registry: &ComponentRegistry) -> &ComponentStorage<Self> {
                    &registry.$field
                }

                #[inline]
                fn storage_mut(registry: &mut ComponentRegistry) -> &mut ComponentStorage<Self> {
                    &mut registry.$field
                }
            }
        )*
    };
}

register_components! {
    Color => Color, colors;
    Position => Position, positions;
    Velocity => Velocity, velocities;
    Rotation => Rotation, rotations;
    Physics => Physics, physics;
    Collision => Collision, collisions;
    Input => Input, inputs;
    Attack => Attack, attacks;
    Score => Score, scores;
    Pathing => Pathing, pathings;
    Animation => Animation, animations;
    Store => Store, stores;
    Distortion => Distortion, distortions;
    Player => Player, player;
}
