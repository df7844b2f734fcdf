//! # Entity Lifecycle Verification
//!
//! End-to-end checks of the manager's public surface:
//!
//! 1. **Identifiers**: never zero, unique while live, FIFO reuse
//! 2. **Factories**: components populated, nothing published until added
//! 3. **Removal**: idempotent, every slot reset, delegates notified first
//! 4. **Bitmask**: matches the populated slots through runtime attach/detach
//!
//! Run with: cargo test -p subwars_core --test entity_lifecycle

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use subwars_core::ecs::{
    Collision, CollisionKind, ComponentRegistry, Direction, Distortion, Position, Score, Velocity,
};
use subwars_core::{
    ComponentKind, Entity, EntityId, EntityManager, EntityManagerDelegate, GameConfig, SpawnError,
    SubmarineType,
};

fn manager(capacity: usize) -> EntityManager {
    EntityManager::headless(GameConfig {
        capacity,
        ..GameConfig::default()
    })
}

#[derive(Default)]
struct Journal {
    events: Vec<(&'static str, EntityId)>,
}

impl EntityManagerDelegate for Journal {
    fn did_add_entity(&mut self, entity: &Entity, _components: &ComponentRegistry) {
        self.events.push(("add", entity.id()));
    }

    fn will_remove_entity(&mut self, entity: &Entity, components: &ComponentRegistry) {
        assert!(components.sprites().get(entity.id()).is_some(), "torn down before notification");
        self.events.push(("remove", entity.id()));
    }

    fn did_update_entity(&mut self, entity: &Entity, _components: &ComponentRegistry) {
        self.events.push(("update", entity.id()));
    }
}

// ============================================================================
// IDENTIFIERS
// ============================================================================

#[test]
fn test_bomb_lifecycle_with_identifier_reuse() {
    // Capacity 3 leaves identifiers 1 and 2.
    let mut manager = manager(3);
    let journal = Rc::new(RefCell::new(Journal::default()));
    manager.register_delegate(&journal);

    let bomb = manager
        .make_bomb(Position::new(100.0, 50.0), Velocity::new(0.0, 5.0))
        .unwrap();
    let id = bomb.id();
    assert_eq!(id, EntityId::new(1));
    assert!(journal.borrow().events.is_empty(), "make must not publish");

    manager.add_bomb(bomb);
    assert!(manager.bombs().contains(id));
    assert_eq!(*manager.components::<Position>().slot(id), Position::new(100.0, 50.0));
    assert_eq!(*manager.components::<Velocity>().slot(id), Velocity::new(0.0, 5.0));

    assert!(manager.remove_bomb(id));
    assert!(!manager.bombs().contains(id));
    assert_eq!(journal.borrow().events, vec![("add", id), ("remove", id)]);

    // FIFO: identifier 2 was free before 1 was released.
    let second = manager.make_bomb(Position::new(0.0, 0.0), Velocity::ZERO).unwrap();
    let third = manager.make_bomb(Position::new(0.0, 0.0), Velocity::ZERO).unwrap();
    assert_eq!(second.id(), EntityId::new(2));
    assert_eq!(third.id(), id);
}

#[test]
fn test_pool_exhaustion_reports_and_leaves_state_alone() {
    let mut manager = manager(3);
    let a = manager.make_fish(Position::new(0.0, 300.0), Direction::Right, 1.0).unwrap();
    let b = manager.make_fish(Position::new(0.0, 300.0), Direction::Right, 1.0).unwrap();
    manager.add_fish(a);
    manager.add_fish(b);

    let err = manager.make_fish(Position::new(0.0, 300.0), Direction::Right, 1.0).unwrap_err();
    assert_eq!(err, SpawnError::PoolExhausted);
    assert_eq!(manager.fishes().len(), 2);
    assert_eq!(manager.available_identifiers(), 0);
}

#[test]
fn test_identifiers_unique_while_live() {
    let mut manager = manager(64);
    let mut seen = HashSet::new();

    for i in 0..20 {
        let fish = manager
            .make_fish(Position::new(i as f32, 300.0), Direction::Left, 1.0)
            .unwrap();
        assert!(!fish.id().is_null());
        assert!(seen.insert(fish.id()));
        manager.add_fish(fish);
    }
    assert_eq!(manager.available_identifiers(), 63 - 20);
}

// ============================================================================
// REMOVAL
// ============================================================================

#[test]
fn test_remove_is_idempotent() {
    let mut manager = manager(16);
    let journal = Rc::new(RefCell::new(Journal::default()));
    manager.register_delegate(&journal);

    let torpedo = manager.make_torpedo(Position::new(10.0, 500.0), Velocity::ZERO).unwrap();
    manager.add_torpedo(torpedo);
    let available = manager.available_identifiers();

    assert!(manager.remove_torpedo(torpedo.id()));
    assert!(!manager.remove_torpedo(torpedo.id()));

    assert_eq!(manager.available_identifiers(), available + 1);
    let removals = journal.borrow().events.iter().filter(|(event, _)| *event == "remove").count();
    assert_eq!(removals, 1);
}

#[test]
fn test_removal_resets_every_populated_slot() {
    let mut manager = manager(16);
    let sub = manager
        .make_submarine(Position::new(10.0, 400.0), Direction::Right, 30.0, SubmarineType::III, 40, Some(100.0))
        .unwrap();
    manager.add_submarine(sub);
    let id = sub.entity.id();

    assert!(manager.remove_submarine(id));

    assert!(manager.sprites().get(id).is_none());
    assert_eq!(*manager.components::<Position>().slot(id), Position::default());
    assert_eq!(*manager.components::<Score>().slot(id), Score::default());
    assert_eq!(*manager.components::<Collision>().slot(id), Collision::default());
    assert_eq!(*manager.components::<Distortion>().slot(id), Distortion::default());
}

#[test]
fn test_add_twice_keeps_one_member() {
    let mut manager = manager(16);
    let fish = manager.make_fish(Position::new(0.0, 300.0), Direction::Right, 1.0).unwrap();
    manager.add_fish(fish);
    manager.add_fish(fish);

    assert_eq!(manager.fishes().len(), 1);
    assert!(manager.remove_fish(fish.id()));
    assert!(manager.fishes().is_empty());
}

// ============================================================================
// BITMASK CONSISTENCY
// ============================================================================

#[test]
fn test_bitmask_tracks_runtime_changes() {
    let mut manager = manager(16);
    let journal = Rc::new(RefCell::new(Journal::default()));
    manager.register_delegate(&journal);

    let mut bomb = manager.make_bomb(Position::new(1.0, 1.0), Velocity::ZERO).unwrap();
    manager.add_bomb(bomb);

    manager.on_component_added(&mut bomb, Score { score: 3 });
    assert!(bomb.has_component(ComponentKind::Score));
    assert!(manager.bombs().get(bomb.id()).unwrap().has_component(ComponentKind::Score));

    manager.on_component_removed(&mut bomb, ComponentKind::Collision);
    assert!(!bomb.has_component(ComponentKind::Collision));
    assert_eq!(manager.components::<Collision>().slot(bomb.id()).kind, CollisionKind::None);

    let updates = journal.borrow().events.iter().filter(|(event, _)| *event == "update").count();
    assert_eq!(updates, 2);

    // Removal walks the refreshed mask; the late Score slot must be reset too.
    assert!(manager.remove_bomb(bomb.id()));
    assert_eq!(*manager.components::<Score>().slot(bomb.id()), Score::default());
}

#[test]
fn test_remove_all_entities_empties_every_collection() {
    let mut manager = manager(64);
    manager.reset_boat().unwrap();

    let fish = manager.make_fish(Position::new(0.0, 300.0), Direction::Right, 1.0).unwrap();
    manager.add_fish(fish);
    let sub = manager
        .make_submarine(Position::new(0.0, 300.0), Direction::Right, 1.0, SubmarineType::I, 5, None)
        .unwrap();
    manager.add_submarine(sub);
    let smoke = manager.make_smoke().unwrap();
    manager.add_smoke(smoke);
    let explosion = manager.make_explosion(Position::new(5.0, 5.0)).unwrap();
    manager.add_explosion(explosion);

    manager.remove_all_entities();

    assert_eq!(manager.spawned_count(), 0);
    assert!(manager.boat().is_initialized(), "the boat is not a spawnable");
    assert_eq!(manager.available_identifiers(), 63 - 1);
}

// ============================================================================
// DELEGATES
// ============================================================================

struct Tagged {
    tag: &'static str,
    log: Rc<RefCell<Vec<&'static str>>>,
}

impl EntityManagerDelegate for Tagged {
    fn did_add_entity(&mut self, _entity: &Entity, _components: &ComponentRegistry) {
        self.log.borrow_mut().push(self.tag);
    }
}

#[test]
fn test_registered_sequence_fans_out_in_order() {
    let mut manager = manager(16);
    let log = Rc::new(RefCell::new(Vec::new()));
    let tagged = |tag| -> Rc<RefCell<dyn EntityManagerDelegate>> {
        Rc::new(RefCell::new(Tagged { tag, log: Rc::clone(&log) }))
    };

    let first = Rc::new(RefCell::new(Tagged { tag: "first", log: Rc::clone(&log) }));
    manager.register_delegate(&first);
    let systems = [tagged("motion"), tagged("animation"), tagged("render")];
    manager.register_delegates(&systems);
    assert_eq!(manager.delegate_count(), 4);

    let fish = manager.make_fish(Position::new(0.0, 300.0), Direction::Left, 1.0).unwrap();
    manager.add_fish(fish);
    assert_eq!(*log.borrow(), ["first", "motion", "animation", "render"]);

    // Dropping a system unregisters it without disturbing the others.
    let [motion, animation, render] = systems;
    drop(animation);
    log.borrow_mut().clear();
    let bomb = manager.make_bomb(Position::new(0.0, 0.0), Velocity::ZERO).unwrap();
    manager.add_bomb(bomb);
    assert_eq!(*log.borrow(), ["first", "motion", "render"]);
    drop((motion, render));
}
