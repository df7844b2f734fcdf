//! # Motion System
//!
//! Moves every entity that has both a velocity and physics:
//!
//! - free bodies integrate with explicit Euler, `v += (force / mass) dt`
//!   then `p += v dt`
//! - path followers advance their progress by one increment per step and
//!   are placed on the path; they face the direction they travel
//! - the boat also drifts with the stage's water current
//!
//! The system learns which entities to move from the manager's lifecycle
//! broadcasts.

use std::collections::BTreeMap;

use subwars_core::ecs::{ComponentRegistry, Pathing, Physics, Position, Rotation, Velocity};
use subwars_core::{ComponentKind, Entity, EntityId, EntityManager, EntityManagerDelegate};

/// Euler integrator for the live scene.
#[derive(Debug, Default)]
pub struct MotionSystem {
    tracked: BTreeMap<EntityId, Entity>,
}

impl MotionSystem {
    /// Creates a system tracking nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entities being moved.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    /// Whether nothing is being moved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }

    /// Whether `id` is being moved.
    #[must_use]
    pub fn tracks(&self, id: EntityId) -> bool {
        self.tracked.contains_key(&id)
    }

    fn moves(entity: &Entity) -> bool {
        entity.has_component(ComponentKind::Velocity) && entity.has_component(ComponentKind::Physics)
    }

    /// Advances every tracked entity by `dt` seconds. `current` is the
    /// horizontal drift, in pixels per second, applied to the boat.
    pub fn step(&mut self, manager: &mut EntityManager, dt: f32, current: f32) {
        for (&id, entity) in &self.tracked {
            if entity.has_component(ComponentKind::Pathing) {
                Self::follow_path(manager, id);
                continue;
            }

            let physics = *manager.components::<Physics>().slot(id);
            let velocity = manager.components_mut::<Velocity>().slot_mut(id);
            velocity.vx += physics.force[0] / physics.mass * dt;
            velocity.vy += physics.force[1] / physics.mass * dt;
            let mut delta = [velocity.vx * dt, velocity.vy * dt];

            if entity.has_component(ComponentKind::Input) {
                delta[0] += current * dt;
            }

            let position = manager.components_mut::<Position>().slot_mut(id);
            position.x += delta[0];
            position.y += delta[1];
        }
    }

    fn follow_path(manager: &mut EntityManager, id: EntityId) {
        let pathing = manager.components_mut::<Pathing>().slot_mut(id);
        pathing.progress = (pathing.progress + pathing.increment).min(1.0);
        let path = *pathing;

        let next = path_point(&path, path.progress);
        let position = manager.components_mut::<Position>().slot_mut(id);
        let (dx, dy) = (next.x - position.x, next.y - position.y);
        *position = next;

        if dx != 0.0 || dy != 0.0 {
            manager.components_mut::<Rotation>().slot_mut(id).radians = dy.atan2(dx);
        }
    }
}

/// Point at `t` along `path`.
///
/// Curved paths are quadratic Béziers whose control point sits above the
/// target at the start's height, so the projectile climbs first and then
/// swings in.
#[must_use]
pub fn path_point(path: &Pathing, t: f32) -> Position {
    let (start, target) = (path.start, path.target);
    if !path.bezier {
        return Position::new(
            start.x + (target.x - start.x) * t,
            start.y + (target.y - start.y) * t,
        );
    }

    let control = Position::new(start.x, target.y);
    let u = 1.0 - t;
    Position::new(
        u * u * start.x + 2.0 * u * t * control.x + t * t * target.x,
        u * u * start.y + 2.0 * u * t * control.y + t * t * target.y,
    )
}

impl EntityManagerDelegate for MotionSystem {
    fn did_add_entity(&mut self, entity: &Entity, _components: &ComponentRegistry) {
        if Self::moves(entity) {
            self.tracked.insert(entity.id(), *entity);
        }
    }

    fn will_remove_entity(&mut self, entity: &Entity, _components: &ComponentRegistry) {
        self.tracked.remove(&entity.id());
    }

    fn did_update_entity(&mut self, entity: &Entity, _components: &ComponentRegistry) {
        if Self::moves(entity) {
            self.tracked.insert(entity.id(), *entity);
        } else {
            self.tracked.remove(&entity.id());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use subwars_core::ecs::Direction;
    use subwars_core::GameConfig;

    fn setup() -> (EntityManager, Rc<RefCell<MotionSystem>>) {
        let mut manager = EntityManager::headless(GameConfig::default());
        let motion = Rc::new(RefCell::new(MotionSystem::new()));
        manager.register_delegate(&motion);
        (manager, motion)
    }

    #[test]
    fn test_tracks_through_lifecycle() {
        let (mut manager, motion) = setup();
        let fish = manager.make_fish(Position::new(0.0, 300.0), Direction::Right, 10.0).unwrap();
        assert!(motion.borrow().is_empty(), "made, not added");

        manager.add_fish(fish);
        assert!(motion.borrow().tracks(fish.id()));

        manager.remove_fish(fish.id());
        assert!(motion.borrow().is_empty());
    }

    #[test]
    fn test_euler_step() {
        let (mut manager, motion) = setup();
        let bomb = manager.make_bomb(Position::new(100.0, 100.0), Velocity::new(10.0, 0.0)).unwrap();
        manager.add_bomb(bomb);

        let config = manager.config().physics.clone();
        motion.borrow_mut().step(&mut manager, 0.5, 0.0);

        let expected_vy = config.gravity / config.bomb_mass * 0.5;
        let velocity = *manager.components::<Velocity>().slot(bomb.id());
        assert!((velocity.vx - 10.0).abs() < 1e-4);
        assert!((velocity.vy - expected_vy).abs() < 1e-3);

        let position = *manager.components::<Position>().slot(bomb.id());
        assert!((position.x - 105.0).abs() < 1e-4);
        assert!((position.y - (100.0 + expected_vy * 0.5)).abs() < 1e-3);
    }

    #[test]
    fn test_current_moves_only_the_boat() {
        let (mut manager, motion) = setup();
        manager.reset_boat().unwrap();
        let boat = manager.boat().id();
        let fish = manager.make_fish(Position::new(0.0, 300.0), Direction::Right, 0.0).unwrap();
        manager.add_fish(fish);
        manager.components_mut::<Physics>().slot_mut(fish.id()).force = [0.0, 0.0];

        let before = *manager.components::<Position>().slot(boat);
        motion.borrow_mut().step(&mut manager, 1.0, 3.0);

        let after = *manager.components::<Position>().slot(boat);
        assert!((after.x - before.x - 3.0).abs() < 1e-4);
        assert_eq!(*manager.components::<Position>().slot(fish.id()), Position::new(0.0, 300.0));
    }

    #[test]
    fn test_boat_missile_reaches_target() {
        let (mut manager, motion) = setup();
        manager.reset_boat().unwrap();
        let target = Position::new(400.0, 500.0);
        let missile = manager.make_boat_missile(Position::new(640.0, 155.0), target).unwrap();
        manager.add_boat_missile(missile);

        for _ in 0..100 {
            motion.borrow_mut().step(&mut manager, 0.016, 0.0);
        }

        let pathing = *manager.components::<Pathing>().slot(missile.id());
        assert!((pathing.progress - 1.0).abs() < f32::EPSILON);
        assert_eq!(*manager.components::<Position>().slot(missile.id()), target);
    }

    #[test]
    fn test_bezier_endpoints() {
        let path = Pathing {
            start: Position::new(0.0, 600.0),
            target: Position::new(300.0, 150.0),
            bezier: true,
            ..Pathing::default()
        };
        assert_eq!(path_point(&path, 0.0), path.start);
        assert_eq!(path_point(&path, 1.0), path.target);

        let middle = path_point(&path, 0.5);
        assert!(middle.x < 150.0, "curved paths bow away from the straight line");
    }
}
