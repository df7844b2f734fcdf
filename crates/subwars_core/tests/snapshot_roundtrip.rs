//! # Snapshot Round-Trip Verification
//!
//! Saves a mixed scene, encodes it as JSON, restores it into a fresh manager
//! and compares every saved slot.
//!
//! Run with: cargo test -p subwars_core --test snapshot_roundtrip

use subwars_core::ecs::{Collision, Direction, Physics, Position, Score, Velocity};
use subwars_core::{EntityId, EntityManager, GameConfig, SaveSnapshot, SubmarineType};

const EPSILON: f32 = 1e-6;

fn manager() -> EntityManager {
    EntityManager::headless(GameConfig {
        capacity: 128,
        ..GameConfig::default()
    })
}

fn assert_close(a: f32, b: f32) {
    assert!((a - b).abs() <= EPSILON, "{a} != {b}");
}

fn populate(manager: &mut EntityManager) -> Vec<EntityId> {
    manager.reset_boat().unwrap();
    let mut ids = Vec::new();

    for (i, sub_type) in SubmarineType::ALL.into_iter().enumerate() {
        let direction = if i % 2 == 0 { Direction::Left } else { Direction::Right };
        let sub = manager
            .make_submarine(
                Position::new(100.0 * i as f32, 250.0 + 40.0 * i as f32),
                direction,
                20.0 + i as f32,
                sub_type,
                10 * (i as u32 + 1),
                Some(300.0),
            )
            .unwrap();
        ids.push(sub.entity.id());
        manager.add_submarine(sub);
    }

    for x in [12.5, 600.25] {
        let fish = manager.make_fish(Position::new(x, 480.0), Direction::Left, 3.5).unwrap();
        ids.push(fish.id());
        manager.add_fish(fish);
    }

    let bomb = manager
        .make_bomb(Position::new(320.0, 200.0), Velocity::new(0.0, 5.0))
        .unwrap();
    ids.push(bomb.id());
    manager.add_bomb(bomb);

    // Let the scene drift away from factory defaults.
    for &id in &ids {
        let position = manager.components_mut::<Position>().slot_mut(id);
        position.x += 0.125;
        position.y += 0.5;
    }
    ids
}

#[test]
fn test_json_round_trip_restores_every_saved_slot() {
    let mut source = manager();
    let ids = populate(&mut source);
    let snapshot = source.save_game();

    let json = serde_json::to_string(&snapshot).unwrap();
    let decoded: SaveSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, snapshot);

    let mut target = manager();
    target.reset_boat().unwrap();
    let restored = target.load_game(&decoded).unwrap();

    for sub_type in SubmarineType::ALL {
        let mut expected: Vec<_> = snapshot.submarines[sub_type.index()].iter().map(|id| restored[id]).collect();
        let mut live: Vec<_> = target.submarines(sub_type).ids().collect();
        expected.sort();
        live.sort();
        assert_eq!(expected, live);
    }
    assert_eq!(target.fishes().len(), 2);
    assert_eq!(target.bombs().len(), 1);

    for id in ids {
        let new_id = restored[&id];
        let (a, b) = (
            source.components::<Position>().slot(id),
            target.components::<Position>().slot(new_id),
        );
        assert_close(a.x, b.x);
        assert_close(a.y, b.y);

        let (a, b) = (
            source.components::<Velocity>().slot(id),
            target.components::<Velocity>().slot(new_id),
        );
        assert_close(a.vx, b.vx);
        assert_close(a.vy, b.vy);

        let (a, b) = (
            source.components::<Physics>().slot(id),
            target.components::<Physics>().slot(new_id),
        );
        assert_close(a.mass, b.mass);
        assert_eq!(a.scale, b.scale);

        assert_eq!(source.components::<Score>().slot(id), target.components::<Score>().slot(new_id));
        assert_eq!(
            source.components::<Collision>().slot(id).kind,
            target.components::<Collision>().slot(new_id).kind
        );
    }
}

#[test]
fn test_load_replaces_existing_scene() {
    let mut source = manager();
    populate(&mut source);
    let snapshot = source.save_game();

    let mut target = manager();
    target.reset_boat().unwrap();
    for _ in 0..5 {
        let torpedo = target
            .make_torpedo(Position::new(0.0, 600.0), Velocity::new(0.0, -40.0))
            .unwrap();
        target.add_torpedo(torpedo);
    }

    // The torpedoes are cleared before any saved entity is rebuilt.
    target.load_game(&snapshot).unwrap();
    assert!(target.torpedoes().is_empty());
    assert_eq!(target.spawned_count(), snapshot.entity_count());
}
