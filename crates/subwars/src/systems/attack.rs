//! # Attack System
//!
//! Lets armed submarines shoot at the boat. A submarine fires once its
//! reload time has run out and the boat is inside its radar radius:
//!
//! | Submarine | Weapon  | Shot                                   |
//! |-----------|---------|----------------------------------------|
//! | II        | torpedo | straight up from the submarine         |
//! | III       | missile | curved path to where the boat is now   |
//!
//! [`AttackSystem::step`] only aims. Launching a shot broadcasts did-add to
//! every delegate, this system included, so the caller hands the returned
//! shots to [`fire`] once the system is no longer borrowed.

use std::collections::BTreeMap;

use subwars_core::ecs::{Attack, ComponentRegistry, Position, Velocity, Weapon};
use subwars_core::{ComponentKind, Entity, EntityId, EntityManager, EntityManagerDelegate, SpawnResult};

/// Seconds an armed submarine waits between two shots, and after it
/// appears before its first.
pub const RELOAD_TIME: f32 = 2.0;

/// Launch speed of a torpedo, in pixels per second.
pub const TORPEDO_SPEED: f32 = 60.0;

/// One shot an armed submarine wants to take.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Shot {
    /// Submarine that fires.
    pub submarine: EntityId,
    /// What it fires.
    pub weapon: Weapon,
    /// Launch point.
    pub from: Position,
}

/// Radar and reload clock for armed submarines.
#[derive(Debug)]
pub struct AttackSystem {
    reload_time: f32,
    /// Seconds since each armed submarine last fired or appeared.
    armed: BTreeMap<EntityId, f32>,
}

impl Default for AttackSystem {
    fn default() -> Self {
        Self::new(RELOAD_TIME)
    }
}

impl AttackSystem {
    /// Creates a system tracking nothing, reloading in `reload_time` seconds.
    #[must_use]
    pub fn new(reload_time: f32) -> Self {
        Self {
            reload_time,
            armed: BTreeMap::new(),
        }
    }

    /// Whether `id` is an armed submarine this system aims for.
    #[must_use]
    pub fn tracks(&self, id: EntityId) -> bool {
        self.armed.contains_key(&id)
    }

    /// Advances every reload clock by `dt` seconds and aims.
    ///
    /// Nothing fires while the boat is down or after game over; reload
    /// clocks keep running meanwhile.
    ///
    /// # Returns
    ///
    /// The shots to launch this frame, in submarine identifier order.
    pub fn step(&mut self, manager: &EntityManager, dt: f32) -> Vec<Shot> {
        let boat = manager.boat();
        let positions = manager.components::<Position>();
        let target = (boat.is_initialized() && !manager.player().boat_destroyed && !manager.is_game_over())
            .then(|| *positions.slot(boat.id()));

        let attacks = manager.components::<Attack>();
        let mut shots = Vec::new();
        for (&id, elapsed) in &mut self.armed {
            *elapsed += dt;
            let Some(target) = target else {
                continue;
            };
            if *elapsed < self.reload_time {
                continue;
            }

            let attack = attacks.slot(id);
            let from = *positions.slot(id);
            if attack.weapon == Weapon::None || from.distance_squared(target) > attack.radius * attack.radius {
                continue;
            }

            *elapsed = 0.0;
            shots.push(Shot {
                submarine: id,
                weapon: attack.weapon,
                from,
            });
        }
        shots
    }
}

/// Launches `shot` into the scene.
///
/// # Returns
///
/// The projectile, or `None` for an unarmed shot.
///
/// # Errors
///
/// [`SpawnError`](subwars_core::SpawnError) if the projectile cannot be made.
pub fn fire(manager: &mut EntityManager, shot: Shot) -> SpawnResult<Option<EntityId>> {
    let projectile = match shot.weapon {
        Weapon::None => return Ok(None),
        Weapon::Torpedo => {
            let torpedo = manager.make_torpedo(shot.from, Velocity::new(0.0, -TORPEDO_SPEED))?;
            manager.add_torpedo(torpedo);
            torpedo.id()
        }
        Weapon::Missile => {
            let missile = manager.make_missile(shot.from)?;
            manager.add_missile(missile);
            missile.id()
        }
    };
    tracing::debug!(submarine = %shot.submarine, projectile = %projectile, weapon = ?shot.weapon, "submarine fired");
    Ok(Some(projectile))
}

impl EntityManagerDelegate for AttackSystem {
    fn did_add_entity(&mut self, entity: &Entity, _components: &ComponentRegistry) {
        if entity.has_component(ComponentKind::Attack) {
            self.armed.insert(entity.id(), 0.0);
        }
    }

    fn will_remove_entity(&mut self, entity: &Entity, _components: &ComponentRegistry) {
        self.armed.remove(&entity.id());
    }

    fn did_update_entity(&mut self, entity: &Entity, _components: &ComponentRegistry) {
        if entity.has_component(ComponentKind::Attack) {
            self.armed.entry(entity.id()).or_insert(0.0);
        } else {
            self.armed.remove(&entity.id());
        }
    }
}
