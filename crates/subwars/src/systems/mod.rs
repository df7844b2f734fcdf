//! Per-frame systems.
//!
//! Motion, animation and attack observe the entity lifecycle through the
//! manager's delegate broadcasts; collision reads the live collections
//! directly and reports to a [`CollisionDelegate`](subwars_core::CollisionDelegate).

pub mod animation;
pub mod attack;
pub mod collision;
pub mod motion;

pub use animation::AnimationSystem;
pub use attack::{AttackSystem, Shot};
pub use collision::{CollisionDetector, GridCollisionSystem};
pub use motion::MotionSystem;
