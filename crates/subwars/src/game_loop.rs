//! # Game Loop
//!
//! One tick, in order:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ 1. STAGE      spawn timers, store, stage transitions         │
//! │ 2. MOTION     Euler step / path following                    │
//! │ 3. COLLISION  begin_updates ─ outcomes ─ end_updates         │
//! │               (removals, explosions, score happen here)      │
//! │ 4. ATTACK     armed submarines fire at the boat in range     │
//! │ 5. ANIMATION  frame clock; finished explosions are removed   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rendering, audio and input polling live outside; they read the manager
//! between ticks.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use subwars_core::ecs::Position;
use subwars_core::{EntityId, EntityManager, GameConfig, SaveSnapshot, SpawnResult};

use crate::error::StageResult;
use crate::stage::{StageController, StageProgress, StageTable};
use crate::systems::{attack, AnimationSystem, AttackSystem, CollisionDetector, GridCollisionSystem, MotionSystem};

/// Longest step a single tick simulates, in seconds.
pub const MAX_DELTA: f32 = 0.1;

/// Counters for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Tick number, starting at 1.
    pub frame: u64,
    /// Spawnable entities alive after the tick.
    pub entities: usize,
    /// Projectiles armed submarines launched.
    pub shots_fired: usize,
    /// Entities removed when their animation finished.
    pub animations_finished: usize,
}

/// Everything needed to resume a game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaveGame {
    /// Live entities.
    pub scene: SaveSnapshot,
    /// Campaign position and player tallies.
    pub progress: StageProgress,
}

/// Owns the scene, the stage and the systems, and runs them in order.
pub struct Game {
    manager: EntityManager,
    stage: StageController,
    motion: Rc<RefCell<MotionSystem>>,
    animation: Rc<RefCell<AnimationSystem>>,
    attack: Rc<RefCell<AttackSystem>>,
    detector: Box<dyn CollisionDetector>,
    frame: u64,
}

impl Game {
    /// Wires the systems to `manager`.
    ///
    /// The motion, animation and attack systems are registered as
    /// lifecycle delegates in that order.
    #[must_use]
    pub fn new(mut manager: EntityManager, stage: StageController, detector: Box<dyn CollisionDetector>) -> Self {
        let motion = Rc::new(RefCell::new(MotionSystem::new()));
        let animation = Rc::new(RefCell::new(AnimationSystem::new()));
        let attack = Rc::new(RefCell::new(AttackSystem::default()));
        manager.register_delegate(&motion);
        manager.register_delegate(&animation);
        manager.register_delegate(&attack);

        Self {
            manager,
            stage,
            motion,
            animation,
            attack,
            detector,
            frame: 0,
        }
    }

    /// A game with placeholder textures and the grid collision system.
    ///
    /// # Errors
    ///
    /// [`StageError::Invalid`](crate::StageError::Invalid) if `table` does
    /// not validate.
    pub fn headless(config: GameConfig, table: StageTable, seed: u64) -> StageResult<Self> {
        Ok(Self::new(
            EntityManager::headless(config),
            StageController::new(table, seed)?,
            Box::new(GridCollisionSystem::default()),
        ))
    }

    /// Starts a new game from the first stage.
    ///
    /// # Errors
    ///
    /// See [`StageController::start`].
    pub fn start(&mut self) -> StageResult<()> {
        self.frame = 0;
        self.stage.start(&mut self.manager)
    }

    /// Simulates `dt` seconds, clamped to [`MAX_DELTA`].
    ///
    /// # Errors
    ///
    /// See [`StageController::update`].
    pub fn tick(&mut self, dt: f32) -> StageResult<FrameStats> {
        let dt = dt.clamp(0.0, MAX_DELTA);

        self.stage.update(&mut self.manager, dt)?;

        self.motion
            .borrow_mut()
            .step(&mut self.manager, dt, self.stage.water_current());

        self.detector.detect(&mut self.manager, &mut self.stage);

        let shots = self.attack.borrow_mut().step(&self.manager, dt);
        let mut shots_fired = 0;
        for shot in shots {
            match attack::fire(&mut self.manager, shot) {
                Ok(Some(_)) => shots_fired += 1,
                Ok(None) => {}
                Err(err) => tracing::warn!(submarine = %shot.submarine, error = %err, "failed to launch a shot"),
            }
        }

        let finished = self.animation.borrow_mut().step(&mut self.manager, dt);
        let animations_finished = finished
            .into_iter()
            .filter(|&id| self.manager.animation_did_finish(id))
            .count();

        self.frame += 1;
        let stats = FrameStats {
            frame: self.frame,
            entities: self.manager.spawned_count(),
            shots_fired,
            animations_finished,
        };
        tracing::trace!(?stats, "tick");
        Ok(stats)
    }

    /// Drops a bomb from the boat. See [`StageController::drop_bomb`].
    ///
    /// # Errors
    ///
    /// [`SpawnError`](subwars_core::SpawnError) if the bomb cannot be made.
    pub fn drop_bomb(&mut self) -> SpawnResult<Option<EntityId>> {
        self.stage.drop_bomb(&mut self.manager)
    }

    /// Fires a boat missile. See [`StageController::fire_boat_missile`].
    ///
    /// # Errors
    ///
    /// [`SpawnError`](subwars_core::SpawnError) if the missile cannot be
    /// made.
    pub fn fire_boat_missile(&mut self, target: Position) -> SpawnResult<Option<EntityId>> {
        self.stage.fire_boat_missile(&mut self.manager, target)
    }

    /// Captures the scene and the campaign position.
    #[must_use]
    pub fn save(&self) -> SaveGame {
        SaveGame {
            scene: self.manager.save_game(),
            progress: self.stage.save_progress(&self.manager),
        }
    }

    /// Replaces the running game with `save`.
    ///
    /// # Errors
    ///
    /// [`StageError::Snapshot`](crate::StageError::Snapshot) if the scene
    /// does not fit this manager, or a stage error if the saved stage is not
    /// in the table.
    pub fn load(&mut self, save: &SaveGame) -> StageResult<()> {
        self.manager.load_game(&save.scene)?;
        self.stage.load_progress(&mut self.manager, &save.progress)?;
        self.manager.signal_game_over(false);
        tracing::info!(stage = save.progress.stage, entities = save.scene.entity_count(), "game loaded");
        Ok(())
    }

    /// The scene.
    #[must_use]
    pub fn manager(&self) -> &EntityManager {
        &self.manager
    }

    /// The scene, mutably.
    pub fn manager_mut(&mut self) -> &mut EntityManager {
        &mut self.manager
    }

    /// The stage controller.
    #[must_use]
    pub fn stage(&self) -> &StageController {
        &self.stage
    }

    /// The motion system.
    #[must_use]
    pub fn motion(&self) -> &Rc<RefCell<MotionSystem>> {
        &self.motion
    }

    /// The attack system.
    #[must_use]
    pub fn attack(&self) -> &Rc<RefCell<AttackSystem>> {
        &self.attack
    }

    /// Ticks run since [`start`](Self::start).
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame
    }
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("manager", &self.manager)
            .field("stage", &self.stage.stage())
            .field("frame", &self.frame)
            .finish_non_exhaustive()
    }
}
