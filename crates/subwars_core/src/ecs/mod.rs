//! # Entity Component System
//!
//! Fixed-capacity structure-of-arrays ECS.
//!
//! ## Design Philosophy
//!
//! - All storage is pre-allocated when the manager is built
//! - Component slot `i` belongs to entity `i` in every array
//! - Identifier 0 is reserved and never allocated
//! - The kind catalogue is closed; lookups are resolved at compile time

mod component;
mod delegate;
mod entity;
mod free_list;
mod registry;
mod sprite;
mod storage;

pub use component::{
    Animation, AnimationMode, Attack, Collision, CollisionKind, Color, Component, ComponentKind,
    Distortion, Input, OnFinish, Pathing, Physics, Player, Position, Rotation, Score, Store,
    StoreRole, Velocity, Weapon,
};
pub use delegate::{CollisionDelegate, DelegateEvent, DelegateList, EntityManagerDelegate};
pub use entity::{ComponentMask, Direction, Entity, EntityId, EntityType};
pub use free_list::FreeList;
pub use registry::ComponentRegistry;
pub use sprite::{
    AnimatedSprite, Font, GlyphKey, HeadlessTextureLoader, Sprite, SpriteCache, SpriteRef,
    SpriteSource, SpriteStorage, StaticSprite, TextureHandle, TextureInfo, TextureLoader,
};
pub use storage::ComponentStorage;
