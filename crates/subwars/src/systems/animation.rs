//! # Animation System
//!
//! Advances the frame of every animated entity. Autoterminating animations
//! that pass their last frame are returned from [`AnimationSystem::step`];
//! the caller hands them to [`EntityManager::animation_did_finish`] once the
//! system is no longer borrowed, so the resulting will-remove broadcast
//! reaches this system too.

use std::collections::BTreeSet;

use subwars_core::ecs::{Animation, ComponentRegistry};
use subwars_core::{ComponentKind, Entity, EntityId, EntityManager, EntityManagerDelegate};

/// Frame clock for animated entities.
#[derive(Debug, Default)]
pub struct AnimationSystem {
    tracked: BTreeSet<EntityId>,
}

impl AnimationSystem {
    /// Creates a system tracking nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `id` is being animated.
    #[must_use]
    pub fn tracks(&self, id: EntityId) -> bool {
        self.tracked.contains(&id)
    }

    /// Advances every tracked animation by `dt` seconds.
    ///
    /// # Returns
    ///
    /// Entities whose autoterminating animation finished on this step.
    pub fn step(&mut self, manager: &mut EntityManager, dt: f32) -> Vec<EntityId> {
        let animations = manager.components_mut::<Animation>();
        self.tracked
            .iter()
            .copied()
            .filter(|&id| animations.slot_mut(id).advance(dt))
            .collect()
    }
}

impl EntityManagerDelegate for AnimationSystem {
    fn did_add_entity(&mut self, entity: &Entity, _components: &ComponentRegistry) {
        if entity.has_component(ComponentKind::Animation) {
            self.tracked.insert(entity.id());
        }
    }

    fn will_remove_entity(&mut self, entity: &Entity, _components: &ComponentRegistry) {
        self.tracked.remove(&entity.id());
    }

    fn did_update_entity(&mut self, entity: &Entity, _components: &ComponentRegistry) {
        if entity.has_component(ComponentKind::Animation) {
            self.tracked.insert(entity.id());
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
    use subwars_core::ecs::Position;
    use subwars_core::GameConfig;

    #[test]
    fn test_explosion_plays_once_then_goes() {
        let mut manager = EntityManager::headless(GameConfig::default());
        let animation = Rc::new(RefCell::new(AnimationSystem::new()));
        manager.register_delegate(&animation);

        let explosion = manager.make_explosion(Position::new(50.0, 50.0)).unwrap();
        manager.add_explosion(explosion);
        let id = explosion.id();
        let frame_time = manager.components::<Animation>().slot(id).frame_time;
        let frames = manager.components::<Animation>().slot(id).frame_count;

        let mut finished = Vec::new();
        for _ in 0..frames - 1 {
            finished = animation.borrow_mut().step(&mut manager, frame_time * 1.01);
            assert!(finished.is_empty());
        }
        finished.extend(animation.borrow_mut().step(&mut manager, frame_time * 1.01));
        assert_eq!(finished, vec![id]);

        for id in finished {
            assert!(manager.animation_did_finish(id));
        }
        assert!(manager.explosions().is_empty());
        assert!(!animation.borrow().tracks(id));
    }

    #[test]
    fn test_loopback_never_finishes() {
        let mut manager = EntityManager::headless(GameConfig::default());
        let animation = Rc::new(RefCell::new(AnimationSystem::new()));
        manager.register_delegate(&animation);
        manager.reset_boat().unwrap();

        for _ in 0..200 {
            assert!(animation.borrow_mut().step(&mut manager, 0.05).is_empty());
        }
        assert!(animation.borrow().tracks(manager.boat().id()));
    }
}
