//! # SubmarineWars Core
//!
//! Fixed-capacity Entity Component System for a 2D arcade game:
//! - Every component array is allocated once, at construction
//! - Identifiers come from a FIFO free list; 0 means "no entity"
//! - Systems observe entity lifecycle through delegates
//!
//! ## Architecture Rules
//!
//! 1. **Factories never add** - `make_*` builds, `add_*` publishes
//! 2. **Structural changes are deferred** - collision outcomes are recorded
//!    during a bracket and applied in `end_updates`
//! 3. **Single-threaded** - the manager is neither `Send` nor shared
//!
//! ## Example
//!
//! ```rust,ignore
//! use subwars_core::{EntityManager, GameConfig};
//! use subwars_core::ecs::{Position, Velocity};
//!
//! let mut manager = EntityManager::headless(GameConfig::default());
//! let bomb = manager.make_bomb(Position::new(100.0, 50.0), Velocity::new(0.0, 5.0))?;
//! manager.add_bomb(bomb);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;
pub mod manager;

pub use config::{GameConfig, MAX_ENTITIES};
pub use ecs::{
    CollisionDelegate, Component, ComponentKind, Entity, EntityId, EntityManagerDelegate,
    HeadlessTextureLoader, TextureLoader,
};
pub use error::{ConfigError, SnapshotError, SpawnError, SpawnResult, TextureError};
pub use manager::{EntityManager, SaveSnapshot, StringLabel, Submarine, SubmarineType};
