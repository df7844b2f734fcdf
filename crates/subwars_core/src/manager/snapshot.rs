//! Save/restore of the in-flight entities.
//!
//! A snapshot records which identifiers were live bombs, submarines, fish,
//! torpedoes and missiles, plus dense copies of the position, velocity,
//! rotation, physics, score, collision and attack arrays. Explosions, smoke,
//! boat missiles and store icons are transient and not saved.

use super::collections::{LiveCollection, SubmarineType, Tracked};
use super::EntityManager;
use crate::ecs::{
    Attack, Collision, Component, Direction, Entity, EntityId, Physics, Position,
    Rotation, Score, Velocity,
};
use crate::error::{SnapshotError, SnapshotResult, SpawnError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Saved state of the in-flight entities.
///
/// Encoding is left to the caller; the type is plain serde data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaveSnapshot {
    /// Capacity of the manager the snapshot was taken from.
    pub capacity: usize,
    /// Identifier of the player boat.
    pub boat_id: EntityId,
    /// Live submarines, per type I, II, III.
    pub submarines: [BTreeSet<EntityId>; 3],
    /// Live fish.
    pub fishes: BTreeSet<EntityId>,
    /// Live bombs.
    pub bombs: BTreeSet<EntityId>,
    /// Live torpedoes.
    pub torpedoes: BTreeSet<EntityId>,
    /// Live enemy missiles.
    pub missiles: BTreeSet<EntityId>,
    /// Every position slot.
    pub positions: Vec<Position>,
    /// Every velocity slot.
    pub velocities: Vec<Velocity>,
    /// Every rotation slot.
    pub rotations: Vec<Rotation>,
    /// Every physics slot.
    pub physics: Vec<Physics>,
    /// Every score slot.
    pub scores: Vec<Score>,
    /// Every collision slot.
    pub collisions: Vec<Collision>,
    /// Every attack slot.
    pub attacks: Vec<Attack>,
}

impl SaveSnapshot {
    /// Checks that every array and identifier fits a manager of `capacity`.
    ///
    /// # Errors
    ///
    /// [`SnapshotError::CapacityMismatch`] if the capacity or an array
    /// length differs, [`SnapshotError::IdentifierUnavailable`] for a null or
    /// out-of-range identifier.
    pub fn validate(&self, capacity: usize) -> SnapshotResult<()> {
        let lengths = [
            self.capacity,
            self.positions.len(),
            self.velocities.len(),
            self.rotations.len(),
            self.physics.len(),
            self.scores.len(),
            self.collisions.len(),
            self.attacks.len(),
        ];
        if let Some(&found) = lengths.iter().find(|&&len| len != capacity) {
            return Err(SnapshotError::CapacityMismatch {
                expected: capacity,
                found,
            });
        }

        let out_of_range = |id: EntityId| id.is_null() || id.index() >= capacity;
        if let Some(&id) = self.saved_ids().find(|&&id| out_of_range(id)) {
            return Err(SnapshotError::IdentifierUnavailable(id));
        }
        if !self.boat_id.is_null() && self.boat_id.index() >= capacity {
            return Err(SnapshotError::IdentifierUnavailable(self.boat_id));
        }
        Ok(())
    }

    /// Every saved in-flight identifier.
    pub fn saved_ids(&self) -> impl Iterator<Item = &EntityId> {
        self.submarines
            .iter()
            .flatten()
            .chain(&self.fishes)
            .chain(&self.bombs)
            .chain(&self.torpedoes)
            .chain(&self.missiles)
    }

    /// Number of saved in-flight entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.saved_ids().count()
    }
}

fn id_set<H: Tracked>(collection: &LiveCollection<H>) -> BTreeSet<EntityId> {
    collection.ids().collect()
}

impl EntityManager {
    /// Captures the in-flight entities.
    #[must_use]
    pub fn save_game(&self) -> SaveSnapshot {
        let snapshot = SaveSnapshot {
            capacity: self.capacity(),
            boat_id: self.boat.id(),
            submarines: SubmarineType::ALL.map(|sub_type| id_set(&self.submarines[sub_type.index()])),
            fishes: id_set(&self.fishes),
            bombs: id_set(&self.bombs),
            torpedoes: id_set(&self.torpedoes),
            missiles: id_set(&self.missiles),
            positions: self.components::<Position>().as_slice().to_vec(),
            velocities: self.components::<Velocity>().as_slice().to_vec(),
            rotations: self.components::<Rotation>().as_slice().to_vec(),
            physics: self.components::<Physics>().as_slice().to_vec(),
            scores: self.components::<Score>().as_slice().to_vec(),
            collisions: self.components::<Collision>().as_slice().to_vec(),
            attacks: self.components::<Attack>().as_slice().to_vec(),
        };

        tracing::info!(entities = snapshot.entity_count(), "game saved");
        snapshot
    }

    /// Replaces the in-flight entities with those of `snapshot`.
    ///
    /// Every spawnable entity is removed first and the boat is moved back to
    /// its saved position. Bombs, submarines, fish, torpedoes and missiles
    /// are then rebuilt under freshly allocated identifiers and carry their
    /// saved component values. Each restored bomb counts against the
    /// player's available bombs.
    ///
    /// # Returns
    ///
    /// The identifier each saved entity was restored under, keyed by its
    /// saved identifier.
    ///
    /// # Errors
    ///
    /// Validation, submarine placement and pool size are checked before
    /// anything changes. A sprite failure while rebuilding leaves the
    /// entities restored so far in place.
    pub fn load_game(&mut self, snapshot: &SaveSnapshot) -> SnapshotResult<BTreeMap<EntityId, EntityId>> {
        snapshot.validate(self.capacity())?;
        for sub_type in SubmarineType::ALL {
            for &id in &snapshot.submarines[sub_type.index()] {
                self.check_submarine_depth(sub_type, snapshot.positions[id.index()])?;
            }
        }
        let free_after_clear = self.available_identifiers() + self.spawned_count();
        if snapshot.entity_count() > free_after_clear {
            tracing::warn!(
                saved = snapshot.entity_count(),
                free = free_after_clear,
                "not enough identifiers to restore the snapshot"
            );
            return Err(SnapshotError::Spawn(SpawnError::PoolExhausted));
        }

        self.remove_all_entities();

        if self.boat.is_initialized() && !snapshot.boat_id.is_null() {
            let saved = snapshot.positions[snapshot.boat_id.index()];
            *self.registry.components_mut::<Position>().slot_mut(self.boat.id()) = saved;
        }

        let mut restored = BTreeMap::new();

        for &saved in &snapshot.bombs {
            let id = self.allocate_id()?;
            let bomb = self.build_bomb(id, snapshot.positions[saved.index()], snapshot.velocities[saved.index()])?;
            let bomb = self.restore_saved(bomb, saved, snapshot);
            self.add_bomb(bomb);
            let player = self.player_mut();
            player.available_bombs = player.available_bombs.saturating_sub(1);
            restored.insert(saved, id);
        }

        for sub_type in SubmarineType::ALL {
            for &saved in &snapshot.submarines[sub_type.index()] {
                let id = self.allocate_id()?;
                let vx = snapshot.velocities[saved.index()].vx;
                let direction = if vx < 0.0 { Direction::Left } else { Direction::Right };
                let radar = match sub_type {
                    SubmarineType::I => None,
                    SubmarineType::II | SubmarineType::III => Some(snapshot.attacks[saved.index()].radius),
                };
                let mut submarine = self.build_submarine(
                    id,
                    snapshot.positions[saved.index()],
                    direction,
                    vx.abs(),
                    sub_type,
                    snapshot.scores[saved.index()].score,
                    radar,
                )?;
                submarine.entity = self.restore_saved(submarine.entity, saved, snapshot);
                self.add_submarine(submarine);
                restored.insert(saved, id);
            }
        }

        for &saved in &snapshot.fishes {
            let id = self.allocate_id()?;
            let vx = snapshot.velocities[saved.index()].vx;
            let direction = if vx < 0.0 { Direction::Left } else { Direction::Right };
            let fish = self.build_fish(id, snapshot.positions[saved.index()], direction, vx.abs())?;
            let fish = self.restore_saved(fish, saved, snapshot);
            self.add_fish(fish);
            restored.insert(saved, id);
        }

        for &saved in &snapshot.torpedoes {
            let id = self.allocate_id()?;
            let torpedo =
                self.build_torpedo(id, snapshot.positions[saved.index()], snapshot.velocities[saved.index()])?;
            let torpedo = self.restore_saved(torpedo, saved, snapshot);
            self.add_torpedo(torpedo);
            restored.insert(saved, id);
        }

        for &saved in &snapshot.missiles {
            let id = self.allocate_id()?;
            let missile = self.build_missile(id, snapshot.positions[saved.index()])?;
            let missile = self.restore_saved(missile, saved, snapshot);
            self.add_missile(missile);
            restored.insert(saved, id);
        }

        tracing::info!(entities = restored.len(), "game loaded");
        Ok(restored)
    }

    /// Copies the saved value of every snapshot kind the entity carries from
    /// slot `saved`.
    fn restore_saved(&mut self, entity: Entity, saved: EntityId, snapshot: &SaveSnapshot) -> Entity {
        let index = saved.index();
        self.restore_kind(&entity, &snapshot.positions[index]);
        self.restore_kind(&entity, &snapshot.velocities[index]);
        self.restore_kind(&entity, &snapshot.rotations[index]);
        self.restore_kind(&entity, &snapshot.physics[index]);
        self.restore_kind(&entity, &snapshot.scores[index]);
        self.restore_kind(&entity, &snapshot.attacks[index]);

        // Grid cells and ignore lists name identifiers of the saved scene.
        let collision = Collision {
            kind: snapshot.collisions[index].kind,
            ..Collision::default()
        };
        self.restore_kind(&entity, &collision);
        entity
    }

    fn restore_kind<C: Component>(&mut self, entity: &Entity, saved: &C) {
        if entity.has_component(C::KIND) {
            *self.registry.components_mut::<C>().slot_mut(entity.id()) = saved.clone();
        }
    }
}
