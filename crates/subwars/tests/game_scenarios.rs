//! # Game Scenarios
//!
//! Full ticks through the public `Game` surface:
//!
//! 1. **Deferred removal**: a submarine leaving the screen is gone after
//!    the tick's bracket, and counts toward clearing the stage
//! 2. **Bomb chain**: bomb hits submarine, explosion destroys it, score is
//!    credited and the bomb returned
//! 3. **Game over**: the last life lost clears the scene and freezes spawns
//! 4. **Save games**: JSON round trip into a fresh game
//! 5. **Enemy fire**: an armed submarine in radar range costs the boat a
//!    life, one out of range holds fire
//!
//! Run with: cargo test -p subwars --test game_scenarios

use subwars::systems::attack::RELOAD_TIME;
use subwars::{Game, SaveGame, StagePlan, StageTable};
use subwars::stage::SubmarineWave;
use subwars_core::ecs::{Direction, Position, Velocity};
use subwars_core::{GameConfig, SubmarineType};

const FRAME: f32 = 1.0 / 60.0;

fn table(submarines: u32) -> StageTable {
    let mut plan = StagePlan::default();
    plan.submarines.one = SubmarineWave {
        count: submarines,
        speed: [40.0, 40.0],
        depth: [500.0, 600.0],
        radar: [0.0, 0.0],
        score: 10,
    };
    StageTable { stages: vec![plan] }
}

fn started(submarines: u32) -> Game {
    let mut game = Game::headless(GameConfig::default(), table(submarines), 11).unwrap();
    game.start().unwrap();
    game
}

#[test]
fn test_submarine_leaving_screen_clears_stage() {
    let mut game = started(1);

    let mut spawned = None;
    for _ in 0..200 {
        game.tick(FRAME).unwrap();
        spawned = game.manager().submarines(SubmarineType::I).any_id();
        if spawned.is_some() {
            break;
        }
    }
    let id = spawned.expect("the stage spawns its submarine");

    {
        let manager = game.manager_mut();
        *manager.components_mut::<Position>().slot_mut(id) = Position::new(5000.0, 500.0);
        *manager.components_mut::<Velocity>().slot_mut(id) = Velocity::new(40.0, 0.0);
    }

    game.tick(FRAME).unwrap();
    assert!(!game.manager().submarines(SubmarineType::I).contains(id));
    assert_eq!(game.stage().submarines_destroyed(), 1);

    // Clearing the only stage ends the campaign.
    game.tick(FRAME).unwrap();
    assert!(game.manager().is_game_over());
}

#[test]
fn test_bomb_chain_destroys_submarine() {
    let mut game = started(3);
    let boat = game.manager().boat().id();
    let boat_position = *game.manager().components::<Position>().slot(boat);

    let target = {
        let manager = game.manager_mut();
        let sub = manager
            .make_submarine(
                Position::new(boat_position.x, boat_position.y + 150.0),
                Direction::Right,
                0.0,
                SubmarineType::I,
                77,
                None,
            )
            .unwrap();
        manager.add_submarine(sub);
        sub.entity.id()
    };
    let bombs = game.manager().player().available_bombs;

    let bomb = game.drop_bomb().unwrap().expect("a bomb is available");
    assert_eq!(game.manager().player().available_bombs, bombs - 1);

    for _ in 0..120 {
        game.tick(FRAME).unwrap();
        if !game.manager().submarines(SubmarineType::I).contains(target) {
            break;
        }
    }

    let manager = game.manager();
    assert!(!manager.submarines(SubmarineType::I).contains(target));
    assert!(!manager.bombs().contains(bomb));
    assert!(manager.player().score >= 77);
    assert_eq!(manager.player().available_bombs, bombs);
}

#[test]
fn test_last_life_ends_game() {
    let mut game = started(3);
    game.manager_mut().player_mut().lives = 1;

    let boat = game.manager().boat().id();
    let at = *game.manager().components::<Position>().slot(boat);
    {
        let manager = game.manager_mut();
        let torpedo = manager.make_torpedo(at, Velocity::ZERO).unwrap();
        manager.add_torpedo(torpedo);
    }

    game.tick(FRAME).unwrap();
    assert!(game.manager().is_game_over());
    assert_eq!(game.manager().player().lives, 0);
    assert_eq!(game.manager().spawned_count(), 0);

    for _ in 0..120 {
        let stats = game.tick(FRAME).unwrap();
        assert_eq!(stats.entities, 0, "nothing spawns after game over");
    }
}

#[test]
fn test_save_game_round_trip() {
    let mut game = Game::headless(GameConfig::default(), StageTable::campaign(), 5).unwrap();
    game.start().unwrap();
    for _ in 0..150 {
        game.tick(FRAME).unwrap();
    }
    game.manager_mut().player_mut().score = 340;

    let save = game.save();
    let json = serde_json::to_string(&save).unwrap();
    let decoded: SaveGame = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, save);

    let mut restored = Game::headless(GameConfig::default(), StageTable::campaign(), 99).unwrap();
    restored.start().unwrap();
    restored.load(&decoded).unwrap();

    assert_eq!(restored.stage().save_progress(restored.manager()), save.progress);
    for sub_type in SubmarineType::ALL {
        assert_eq!(
            restored.manager().submarines(sub_type).len(),
            save.scene.submarines[sub_type.index()].len()
        );
    }
    assert_eq!(restored.manager().player().score, 340);
    assert!(!restored.manager().is_game_over());

    // The restored scene is live: systems track it and ticks keep running.
    let moving = restored.manager().fishes().any_id();
    if let Some(fish) = moving {
        assert!(restored.motion().borrow().tracks(fish));
    }
    restored.tick(FRAME).unwrap();
}

fn armed_submarine(game: &mut Game, sub_type: SubmarineType, below_boat: f32, radar: Option<f32>) {
    let boat = game.manager().boat().id();
    let boat_position = *game.manager().components::<Position>().slot(boat);
    let manager = game.manager_mut();
    let sub = manager
        .make_submarine(
            Position::new(boat_position.x, boat_position.y + below_boat),
            Direction::Right,
            0.0,
            sub_type,
            10,
            radar,
        )
        .unwrap();
    manager.add_submarine(sub);
    assert!(game.attack().borrow().tracks(sub.entity.id()));
}

#[test]
fn test_submarine_missile_costs_a_life() {
    let mut game = started(3);
    let lives = game.manager().player().lives;
    armed_submarine(&mut game, SubmarineType::III, 300.0, None);

    let mut fired = 0;
    for _ in 0..600 {
        fired += game.tick(FRAME).unwrap().shots_fired;
        if game.manager().player().lives < lives {
            break;
        }
    }

    assert!(fired >= 1);
    assert_eq!(game.manager().player().lives, lives - 1);
}

#[test]
fn test_submarine_out_of_radar_holds_fire() {
    let mut game = started(3);
    armed_submarine(&mut game, SubmarineType::II, 500.0, Some(100.0));

    let ticks = (RELOAD_TIME * 3.0 / FRAME) as usize;
    for _ in 0..ticks {
        assert_eq!(game.tick(FRAME).unwrap().shots_fired, 0);
    }
    assert!(game.manager().torpedoes().is_empty());
}
