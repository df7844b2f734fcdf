//! # SubmarineWars
//!
//! The game crate, integrating the entity core with stage logic and the
//! per-frame systems.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                             Game                                 │
//! │                                                                  │
//! │  ┌──────────────────┐   outcomes   ┌──────────────────────────┐  │
//! │  │ GridCollision    │─────────────>│ StageController          │  │
//! │  │ System           │              │ (CollisionDelegate)      │  │
//! │  └────────┬─────────┘              └────────────┬─────────────┘  │
//! │           │ reads                 end_updates   │ mutates        │
//! │           v                                     v                │
//! │  ┌────────────────────────────────────────────────────────────┐  │
//! │  │ EntityManager (subwars_core)                               │  │
//! │  └──────────────┬─────────────────────────────────────────────┘  │
//! │                 │ did-add / will-remove / did-update             │
//! │                 v                                                │
//! │        MotionSystem, AttackSystem, AnimationSystem               │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `stage`: campaign tables, spawning, collision outcomes
//! - `systems`: motion, collision detection, submarine attacks and
//!   animation
//! - `game_loop`: tick order and save games

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod game_loop;
pub mod stage;
pub mod systems;

pub use error::{StageError, StageResult};
pub use game_loop::{FrameStats, Game, SaveGame, MAX_DELTA};
pub use stage::{StageController, StageKind, StagePlan, StageProgress, StageTable};
pub use systems::{AnimationSystem, AttackSystem, CollisionDetector, GridCollisionSystem, MotionSystem};
