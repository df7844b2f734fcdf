//! # Stage Controller
//!
//! Drives the campaign on top of the entity manager:
//!
//! - spawns the submarines and fish each normal stage allows, on a timer
//! - runs the store between fights
//! - turns collision outcomes into score, purchases, lost lives and removals
//!
//! Spawning draws from a seeded `ChaCha8Rng`, so two controllers with the
//! same seed and the same inputs play the same game.

mod outcomes;
mod plan;

pub use plan::{StageKind, StagePlan, StageTable, SubmarineWave, SubmarineWaves};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use subwars_core::ecs::{Direction, Position, StoreRole, Velocity, Weapon};
use subwars_core::manager::NumberLabelKind;
use subwars_core::{EntityId, EntityManager, SpawnResult, SubmarineType};

use crate::error::StageResult;
use outcomes::PendingOutcomes;

/// Seconds between two spawn rounds.
pub const SPAWN_INTERVAL: f32 = 1.0;

/// Seconds between two smoke puffs from the boat.
pub const SMOKE_INTERVAL: f32 = 0.5;

/// Fish swim at this absolute speed.
pub const FISH_SPEED: f32 = 30.0;

/// Vertical range fish are released in.
pub const FISH_DEPTH: [f32; 2] = [200.0, 700.0];

/// Store icons, left to right: buy a life, buy a missile, leave.
const STORE_ROLES: [StoreRole; 3] = [StoreRole::Life, StoreRole::BoatMissile, StoreRole::End];
const STORE_ICONS: [[f32; 2]; 3] = [[320.0, 360.0], [640.0, 360.0], [960.0, 360.0]];

/// Stage progress that survives a save.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StageProgress {
    /// One-based stage number.
    pub stage: u32,
    /// Submarines removed so far this stage.
    pub submarines_destroyed: u32,
    /// Submarines still to spawn, per type.
    pub remaining: [u32; 3],
    /// Fish still to spawn.
    pub fish_remaining: u32,
    /// Player score.
    pub score: u64,
    /// Player money.
    pub money: u64,
    /// Boat lives left.
    pub lives: u32,
    /// Boat missiles left.
    pub missiles: u32,
}

/// Campaign state plus the collision delegate for the running stage.
#[derive(Debug)]
pub struct StageController {
    table: StageTable,
    rng: ChaCha8Rng,
    /// One-based; 0 before [`start`](Self::start).
    stage: u32,
    plan: StagePlan,
    remaining: [u32; 3],
    fish_remaining: u32,
    fish_on_screen: u32,
    submarines_destroyed: u32,
    since_spawn: f32,
    since_smoke: f32,
    store_open: bool,
    store_ended: bool,
    pending: PendingOutcomes,
}

impl StageController {
    /// Creates a controller over `table`, seeding spawns with `seed`.
    ///
    /// # Errors
    ///
    /// [`StageError::Invalid`](crate::StageError::Invalid) if the table
    /// fails [`StageTable::validate`].
    pub fn new(table: StageTable, seed: u64) -> StageResult<Self> {
        table.validate()?;
        Ok(Self {
            table,
            rng: ChaCha8Rng::seed_from_u64(seed),
            stage: 0,
            plan: StagePlan::default(),
            remaining: [0; 3],
            fish_remaining: 0,
            fish_on_screen: 0,
            submarines_destroyed: 0,
            since_spawn: 0.0,
            since_smoke: 0.0,
            store_open: false,
            store_ended: false,
            pending: PendingOutcomes::default(),
        })
    }

    /// Resets the player, sets up the boat and enters the first stage.
    ///
    /// # Errors
    ///
    /// [`StageError::Invalid`](crate::StageError::Invalid) if a wave would
    /// spawn above the minimum submarine depth, or
    /// [`StageError::Spawn`](crate::StageError::Spawn) if the boat or a
    /// label glyph cannot be made.
    pub fn start(&mut self, manager: &mut EntityManager) -> StageResult<()> {
        self.table
            .check_depths(manager.config().layout.minimum_submarine_depth)?;

        manager.remove_all_entities();
        manager.reset_game()?;
        manager.reset_boat()?;
        manager.signal_game_over(false);

        self.stage = 0;
        self.pending.clear();
        self.next_stage(manager)
    }

    // =========================================================================
    // Per-frame update
    // =========================================================================

    /// Advances the stage by `dt` seconds.
    ///
    /// # Errors
    ///
    /// [`StageError::Spawn`](crate::StageError::Spawn) if the boat cannot be
    /// respawned. Enemy, fish and smoke spawn failures are logged and
    /// skipped; a submarine that fails to spawn is retried next round.
    pub fn update(&mut self, manager: &mut EntityManager, dt: f32) -> StageResult<()> {
        if manager.is_game_over() || self.stage == 0 {
            return Ok(());
        }

        let player = manager.player();
        if player.boat_destroyed && player.lives > 0 {
            manager.reset_boat()?;
        }

        match self.plan.kind {
            StageKind::Normal => self.update_normal(manager, dt),
            StageKind::Store => self.update_store(manager),
        }
    }

    fn update_normal(&mut self, manager: &mut EntityManager, dt: f32) -> StageResult<()> {
        self.since_spawn += dt;
        if self.since_spawn >= SPAWN_INTERVAL {
            self.since_spawn = 0.0;
            for sub_type in SubmarineType::ALL {
                // A failed spawn keeps its quota for the next round.
                if self.remaining[sub_type.index()] > 0 && self.spawn_submarine(manager, sub_type) {
                    self.remaining[sub_type.index()] -= 1;
                }
            }
            if self.fish_remaining > 0 {
                self.fish_remaining -= 1;
                self.spawn_fish(manager);
            }
        }

        self.since_smoke += dt;
        if self.since_smoke >= SMOKE_INTERVAL && manager.is_game_running() {
            self.since_smoke = 0.0;
            self.spawn_smoke(manager);
        }

        if self.is_stage_clear() {
            self.next_stage(manager)?;
        }
        Ok(())
    }

    fn update_store(&mut self, manager: &mut EntityManager) -> StageResult<()> {
        if !self.store_open {
            manager.remove_all_entities();
            for (role, [x, y]) in STORE_ROLES.into_iter().zip(STORE_ICONS) {
                let icon = manager.make_store_icon(Position::new(x, y), role)?;
                manager.add_store_icon(icon);
            }
            self.store_open = true;
            tracing::info!(stage = self.stage, "store opened");
        }

        if self.store_ended {
            manager.remove_all_entities();
            self.next_stage(manager)?;
        }
        Ok(())
    }

    // =========================================================================
    // Stage flow
    // =========================================================================

    /// Whether every submarine of the current normal stage is gone.
    #[must_use]
    pub fn is_stage_clear(&self) -> bool {
        self.plan.kind == StageKind::Normal && self.submarines_destroyed >= self.plan.total_submarines()
    }

    /// Whether the table has a stage after the current one.
    #[must_use]
    pub fn has_next_stage(&self) -> bool {
        (self.stage as usize) < self.table.len()
    }

    /// Enters the next stage, or ends the game once the table is exhausted.
    ///
    /// # Errors
    ///
    /// [`StageError::Spawn`](crate::StageError::Spawn) if the stage label
    /// cannot be updated.
    pub fn next_stage(&mut self, manager: &mut EntityManager) -> StageResult<()> {
        if !self.has_next_stage() {
            tracing::info!(stage = self.stage, score = manager.player().score, "campaign cleared");
            manager.signal_game_over(true);
            return Ok(());
        }

        let number = self.stage + 1;
        let Some(plan) = self.table.stage(number).cloned() else {
            return Err(crate::StageError::NoNextStage(self.stage));
        };
        self.enter(number, plan);
        manager.update_number_label(NumberLabelKind::Stage, u64::from(number))?;

        tracing::info!(
            stage = number,
            kind = ?self.plan.kind,
            submarines = self.plan.total_submarines(),
            fish = self.plan.fish,
            "stage entered"
        );
        Ok(())
    }

    fn enter(&mut self, number: u32, plan: StagePlan) {
        self.stage = number;
        self.remaining = SubmarineType::ALL.map(|sub_type| plan.submarines.get(sub_type).count);
        self.fish_remaining = plan.fish;
        self.fish_on_screen = 0;
        self.submarines_destroyed = 0;
        self.since_spawn = 0.0;
        self.since_smoke = 0.0;
        self.store_open = false;
        self.store_ended = false;
        self.plan = plan;
    }

    // =========================================================================
    // Spawning
    // =========================================================================

    fn random_side(&mut self, screen_width: f32) -> (Direction, f32) {
        if self.rng.gen_bool(0.5) {
            (Direction::Left, screen_width)
        } else {
            (Direction::Right, 0.0)
        }
    }

    fn draw(&mut self, [low, high]: [f32; 2]) -> f32 {
        self.rng.gen_range(low..=high)
    }

    fn spawn_submarine(&mut self, manager: &mut EntityManager, sub_type: SubmarineType) -> bool {
        let wave = self.plan.submarines.get(sub_type).clone();
        let (direction, x) = self.random_side(manager.config().layout.screen_width);
        let y = self.draw(wave.depth);
        let speed = self.draw(wave.speed);
        let radar = if sub_type.weapon() == Weapon::None {
            None
        } else {
            Some(self.draw(wave.radar))
        };

        match manager.make_submarine(Position::new(x, y), direction, speed, sub_type, wave.score, radar) {
            Ok(submarine) => {
                manager.add_submarine(submarine);
                true
            }
            Err(err) => {
                tracing::warn!(?sub_type, error = %err, "failed to spawn a submarine, retrying next round");
                false
            }
        }
    }

    fn spawn_fish(&mut self, manager: &mut EntityManager) {
        let (direction, x) = self.random_side(manager.config().layout.screen_width);
        let y = self.draw(FISH_DEPTH);

        match manager.make_fish(Position::new(x, y), direction, FISH_SPEED) {
            Ok(fish) => {
                manager.add_fish(fish);
                self.fish_on_screen += 1;
            }
            Err(err) => tracing::warn!(error = %err, "failed to spawn a fish"),
        }
    }

    fn spawn_smoke(&mut self, manager: &mut EntityManager) {
        if !manager.boat().is_initialized() || manager.player().boat_destroyed {
            return;
        }
        match manager.make_smoke() {
            Ok(smoke) => manager.add_smoke(smoke),
            Err(err) => tracing::debug!(error = %err, "no smoke this time"),
        }
    }

    // =========================================================================
    // Player actions
    // =========================================================================

    /// Drops a bomb from the boat, inheriting the boat's velocity.
    ///
    /// # Returns
    ///
    /// The bomb's identifier, or `None` if the player has no bomb left.
    ///
    /// # Errors
    ///
    /// [`SpawnError`](subwars_core::SpawnError) if the bomb cannot be made.
    pub fn drop_bomb(&mut self, manager: &mut EntityManager) -> SpawnResult<Option<EntityId>> {
        if manager.player().available_bombs == 0 {
            tracing::debug!("no bomb available");
            return Ok(None);
        }

        let boat = manager.boat().id();
        let position = *manager.components::<Position>().slot(boat);
        let velocity = *manager.components::<Velocity>().slot(boat);
        let bomb = manager.make_bomb(position, velocity)?;
        manager.add_bomb(bomb);
        manager.player_mut().available_bombs -= 1;
        Ok(Some(bomb.id()))
    }

    /// Fires a boat missile at `target`.
    ///
    /// # Returns
    ///
    /// The missile's identifier, or `None` if the player has none left.
    ///
    /// # Errors
    ///
    /// [`SpawnError`](subwars_core::SpawnError) if the missile or the label
    /// update fails. The missile is spent either way.
    pub fn fire_boat_missile(&mut self, manager: &mut EntityManager, target: Position) -> SpawnResult<Option<EntityId>> {
        if manager.player().missiles == 0 {
            tracing::debug!("no boat missile available");
            return Ok(None);
        }

        manager.player_mut().missiles -= 1;
        let missiles = u64::from(manager.player().missiles);
        manager.update_number_label(NumberLabelKind::Missiles, missiles)?;

        let position = *manager.components::<Position>().slot(manager.boat().id());
        let missile = manager.make_boat_missile(position, target)?;
        manager.add_boat_missile(missile);
        Ok(Some(missile.id()))
    }

    pub(crate) fn buy_life(&mut self, manager: &mut EntityManager) {
        let price = manager.config().player.life_price;
        if !manager.player_mut().spend_money(price) {
            tracing::debug!(price, money = manager.player().money, "cannot afford a life");
            return;
        }
        manager.player_mut().lives += 1;
        tracing::info!(lives = manager.player().lives, "life bought");
    }

    pub(crate) fn buy_missile(&mut self, manager: &mut EntityManager) {
        let price = manager.config().player.missile_price;
        if !manager.player_mut().spend_money(price) {
            tracing::debug!(price, money = manager.player().money, "cannot afford a missile");
            return;
        }
        manager.player_mut().missiles += 1;
        tracing::info!(missiles = manager.player().missiles, "missile bought");
    }

    pub(crate) fn exit_store(&mut self) {
        self.store_ended = true;
    }

    // =========================================================================
    // Save / load
    // =========================================================================

    /// Captures the campaign position and the player's tallies.
    #[must_use]
    pub fn save_progress(&self, manager: &EntityManager) -> StageProgress {
        let player = manager.player();
        StageProgress {
            stage: self.stage,
            submarines_destroyed: self.submarines_destroyed,
            remaining: self.remaining,
            fish_remaining: self.fish_remaining,
            score: player.score,
            money: player.money,
            lives: player.lives,
            missiles: player.missiles,
        }
    }

    /// Restores a saved campaign position.
    ///
    /// # Errors
    ///
    /// [`StageError::NoNextStage`](crate::StageError::NoNextStage) if the
    /// saved stage is not in the table, or a label update failure.
    pub fn load_progress(&mut self, manager: &mut EntityManager, progress: &StageProgress) -> StageResult<()> {
        let Some(plan) = self.table.stage(progress.stage).cloned() else {
            return Err(crate::StageError::NoNextStage(progress.stage.saturating_sub(1)));
        };
        self.enter(progress.stage, plan);
        self.submarines_destroyed = progress.submarines_destroyed;
        self.remaining = progress.remaining;
        self.fish_remaining = progress.fish_remaining;
        self.fish_on_screen = u32::try_from(manager.fishes().len()).unwrap_or(u32::MAX);
        self.pending.clear();

        let player = manager.player_mut();
        player.score = progress.score;
        player.money = progress.money;
        player.lives = progress.lives;
        player.missiles = progress.missiles;

        manager.sync_player_labels()?;
        manager.update_number_label(NumberLabelKind::Stage, u64::from(progress.stage))?;
        tracing::info!(stage = progress.stage, "stage progress loaded");
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// One-based current stage, 0 before [`start`](Self::start).
    #[must_use]
    pub fn stage(&self) -> u32 {
        self.stage
    }

    /// The plan being played.
    #[must_use]
    pub fn plan(&self) -> &StagePlan {
        &self.plan
    }

    /// Submarines removed this stage.
    #[must_use]
    pub fn submarines_destroyed(&self) -> u32 {
        self.submarines_destroyed
    }

    /// Fish spawned this stage and not yet removed.
    #[must_use]
    pub fn fish_on_screen(&self) -> u32 {
        self.fish_on_screen
    }

    /// Horizontal drift the motion system applies to the boat.
    #[must_use]
    pub fn water_current(&self) -> f32 {
        self.plan.water_current
    }

    /// Whether the player has chosen to leave the store.
    #[must_use]
    pub fn store_ended(&self) -> bool {
        self.store_ended
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use subwars_core::ecs::{EntityType, HeadlessTextureLoader, SpriteSource, TextureInfo, TextureLoader};
    use subwars_core::{GameConfig, TextureError};
    use crate::StageError;

    /// Fails type I submarine sprites while `broken` is set.
    struct FlakyLoader {
        broken: Rc<Cell<bool>>,
        inner: HeadlessTextureLoader,
    }

    impl TextureLoader for FlakyLoader {
        fn load(&mut self, source: &SpriteSource) -> Result<TextureInfo, TextureError> {
            if self.broken.get() && *source == SpriteSource::Entity(EntityType::SubmarineI) {
                return Err(TextureError {
                    asset: "submarine I".into(),
                    reason: "device lost".into(),
                });
            }
            self.inner.load(source)
        }
    }

    fn single_stage(count: u32) -> StageTable {
        let mut plan = StagePlan::default();
        plan.submarines.one = SubmarineWave {
            count,
            speed: [40.0, 40.0],
            depth: [300.0, 300.0],
            radar: [0.0, 0.0],
            score: 10,
        };
        StageTable { stages: vec![plan] }
    }

    fn started(table: StageTable) -> (EntityManager, StageController) {
        let mut manager = EntityManager::headless(GameConfig::default());
        let mut stage = StageController::new(table, 7).unwrap();
        stage.start(&mut manager).unwrap();
        (manager, stage)
    }

    #[test]
    fn test_start_enters_first_stage() {
        let (manager, stage) = started(StageTable::campaign());
        assert_eq!(stage.stage(), 1);
        assert!(manager.boat().is_initialized());
        assert!(!manager.is_game_over());
        assert_eq!(manager.number_label(NumberLabelKind::Stage).value(), 1);
    }

    #[test]
    fn test_spawns_one_round_per_interval() {
        let (mut manager, mut stage) = started(single_stage(3));

        stage.update(&mut manager, SPAWN_INTERVAL / 2.0).unwrap();
        assert!(manager.submarines(SubmarineType::I).is_empty());

        stage.update(&mut manager, SPAWN_INTERVAL / 2.0).unwrap();
        assert_eq!(manager.submarines(SubmarineType::I).len(), 1);

        for _ in 0..5 {
            stage.update(&mut manager, SPAWN_INTERVAL).unwrap();
        }
        assert_eq!(manager.submarines(SubmarineType::I).len(), 3, "capped by the plan");
    }

    #[test]
    fn test_same_seed_same_spawns() {
        let positions = |seed| {
            let mut manager = EntityManager::headless(GameConfig::default());
            let mut stage = StageController::new(StageTable::campaign(), seed).unwrap();
            stage.start(&mut manager).unwrap();
            stage.update(&mut manager, SPAWN_INTERVAL).unwrap();
            let mut out: Vec<_> = manager
                .submarines(SubmarineType::I)
                .ids()
                .map(|id| *manager.components::<Position>().slot(id))
                .map(|p| (p.x.to_bits(), p.y.to_bits()))
                .collect();
            out.sort_unstable();
            out
        };

        assert_eq!(positions(42), positions(42));
    }

    #[test]
    fn test_drop_bomb_spends_a_bomb() {
        let (mut manager, mut stage) = started(single_stage(1));
        let bombs = manager.player().available_bombs;

        let id = stage.drop_bomb(&mut manager).unwrap().unwrap();
        assert!(manager.bombs().contains(id));
        assert_eq!(manager.player().available_bombs, bombs - 1);

        manager.player_mut().available_bombs = 0;
        assert_eq!(stage.drop_bomb(&mut manager).unwrap(), None);
    }

    #[test]
    fn test_fire_boat_missile_needs_stock() {
        let (mut manager, mut stage) = started(single_stage(1));
        manager.player_mut().missiles = 1;

        let target = Position::new(600.0, 500.0);
        assert!(stage.fire_boat_missile(&mut manager, target).unwrap().is_some());
        assert_eq!(manager.player().missiles, 0);
        assert_eq!(stage.fire_boat_missile(&mut manager, target).unwrap(), None);
        assert_eq!(manager.boat_missiles().len(), 1);
    }

    #[test]
    fn test_purchases_respect_money() {
        let (mut manager, mut stage) = started(single_stage(1));
        let price = manager.config().player.life_price;
        manager.player_mut().money = price;
        let lives = manager.player().lives;

        stage.buy_life(&mut manager);
        stage.buy_life(&mut manager);

        assert_eq!(manager.player().lives, lives + 1);
        assert_eq!(manager.player().money, 0);
    }

    #[test]
    fn test_last_stage_cleared_ends_game() {
        let (mut manager, mut stage) = started(single_stage(0));
        stage.update(&mut manager, 0.016).unwrap();
        assert!(manager.is_game_over());
    }

    #[test]
    fn test_progress_round_trip() {
        let (mut manager, mut stage) = started(StageTable::campaign());
        stage.update(&mut manager, SPAWN_INTERVAL).unwrap();
        manager.player_mut().score = 120;
        let saved = stage.save_progress(&manager);

        let (mut other_manager, mut other) = started(StageTable::campaign());
        other.load_progress(&mut other_manager, &saved).unwrap();

        assert_eq!(other.save_progress(&other_manager), saved);
    }

    #[test]
    fn test_failed_spawn_keeps_quota() {
        let broken = Rc::new(Cell::new(true));
        let loader = FlakyLoader { broken: Rc::clone(&broken), inner: HeadlessTextureLoader::new() };
        let mut manager = EntityManager::new(GameConfig::default(), Box::new(loader));
        let mut stage = StageController::new(single_stage(2), 7).unwrap();
        stage.start(&mut manager).unwrap();

        for _ in 0..4 {
            stage.update(&mut manager, SPAWN_INTERVAL).unwrap();
        }
        assert_eq!(stage.remaining, [2, 0, 0]);
        assert!(manager.submarines(SubmarineType::I).is_empty());
        assert!(!manager.is_game_over(), "stage must not clear with submarines owed");

        broken.set(false);
        for _ in 0..3 {
            stage.update(&mut manager, SPAWN_INTERVAL).unwrap();
        }
        assert_eq!(manager.submarines(SubmarineType::I).len(), 2);
        assert_eq!(stage.remaining, [0, 0, 0]);
    }

    #[test]
    fn test_rejects_inverted_range() {
        let mut table = single_stage(1);
        table.stages[0].submarines.one.speed = [60.0, 20.0];
        assert!(matches!(StageController::new(table, 7), Err(StageError::Invalid { stage: 1, .. })));
    }

    #[test]
    fn test_start_rejects_shallow_wave() {
        let mut table = single_stage(1);
        table.stages[0].submarines.one.depth = [5.0, 10.0];
        let mut manager = EntityManager::headless(GameConfig::default());
        let mut stage = StageController::new(table, 7).unwrap();

        assert!(matches!(stage.start(&mut manager), Err(StageError::Invalid { stage: 1, .. })));
        assert!(!manager.boat().is_initialized(), "scene untouched");
    }
}
