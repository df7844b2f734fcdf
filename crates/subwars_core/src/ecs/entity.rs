//! # Entity Handles
//!
//! Entities are lightweight values consisting of:
//! - An identifier, which is also the index into every component array
//! - A bitmask recording which component kinds are attached
//!
//! Copying a handle copies the identifier and mask only. Component data lives
//! in the manager's storage and is never touched by the handle.

use super::component::ComponentKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an entity.
///
/// The same value indexes every component array. Identifier 0 means
/// "no entity" and is never allocated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct EntityId(u32);

impl EntityId {
    /// Null/invalid entity ID.
    pub const NULL: Self = Self(0);

    /// Wraps a raw identifier.
    #[inline]
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns the slot index in every component array.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Checks if this entity ID is null/invalid.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One bit per [`ComponentKind`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ComponentMask(u32);

impl ComponentMask {
    /// The empty mask.
    pub const EMPTY: Self = Self(0);

    /// Builds a mask from a list of kinds.
    #[must_use]
    pub const fn of(kinds: &[ComponentKind]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < kinds.len() {
            bits |= kinds[i].bit();
            i += 1;
        }
        Self(bits)
    }

    /// Returns the raw bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Checks whether `kind` is set.
    #[inline]
    #[must_use]
    pub const fn contains(self, kind: ComponentKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// Sets the bit for `kind`.
    #[inline]
    pub fn insert(&mut self, kind: ComponentKind) {
        self.0 |= kind.bit();
    }

    /// Clears the bit for `kind`.
    #[inline]
    pub fn remove(&mut self, kind: ComponentKind) {
        self.0 &= !kind.bit();
    }

    /// Checks whether no bit is set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of attached kinds.
    #[inline]
    #[must_use]
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    /// Iterates the attached kinds in bit order.
    pub fn iter(self) -> impl Iterator<Item = ComponentKind> {
        ComponentKind::ALL
            .into_iter()
            .filter(move |&kind| self.contains(kind))
    }
}

/// An entity: identifier plus attached-component bitmask.
///
/// Every concrete game object (boat, submarine, bomb, glyph, ...) is this
/// same handle; the kinds differ only in the components their factory
/// attaches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Entity {
    /// The identifier, or [`EntityId::NULL`] before initialization.
    id: EntityId,
    /// Bitmask of attached components.
    components: ComponentMask,
}

impl Entity {
    /// Creates an uninitialized handle.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            id: EntityId::NULL,
            components: ComponentMask::EMPTY,
        }
    }

    /// Establishes the handle's identity.
    ///
    /// Called once per allocation, before any component is registered.
    #[inline]
    pub fn initialize(&mut self, id: EntityId, components: ComponentMask) {
        self.id = id;
        self.components = components;
    }

    /// Returns the identifier.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Checks whether [`Entity::initialize`] has been called.
    #[inline]
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        !self.id.is_null()
    }

    /// Records that the slot for `kind` now holds live data.
    ///
    /// The slot must already be populated; this only flips the bit.
    #[inline]
    pub fn register_component(&mut self, kind: ComponentKind) {
        self.components.insert(kind);
    }

    /// Records that the slot for `kind` has been reset.
    #[inline]
    pub fn unregister_component(&mut self, kind: ComponentKind) {
        self.components.remove(kind);
    }

    /// Checks whether `kind` is attached.
    #[inline]
    #[must_use]
    pub const fn has_component(&self, kind: ComponentKind) -> bool {
        self.components.contains(kind)
    }

    /// Returns the attached-component bitmask.
    #[inline]
    #[must_use]
    pub const fn components(&self) -> ComponentMask {
        self.components
    }
}

/// Every kind of game object the manager can construct.
///
/// Doubles as the key under which an entity's texture is cached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    /// The player boat.
    Boat,
    /// Submarine without weapons.
    SubmarineI,
    /// Submarine firing torpedoes.
    SubmarineII,
    /// Submarine firing homing missiles.
    SubmarineIII,
    /// Fish.
    Fish,
    /// Bomb dropped by the boat.
    Bomb,
    /// Torpedo fired by a submarine.
    Torpedo,
    /// Missile fired by a submarine, homing on the boat.
    Missile,
    /// Missile fired by the boat.
    BoatMissile,
    /// Explosion.
    Explosion,
    /// Smoke particle rising from the boat.
    Smoke,
    /// Background ocean.
    Ocean,
    /// Store icon selling a life.
    BuyLives,
    /// Store icon selling a boat missile.
    BuyMissiles,
    /// Store icon leaving the store.
    EndStore,
    /// Boat lives indicator icon.
    BoatLivesIndicator,
    /// Boat missiles indicator icon.
    BoatMissilesIndicator,
    /// Intro screen panel.
    IntroPanel,
    /// Outro screen panel.
    OutroPanel,
    /// A single text glyph.
    Character,
}

impl EntityType {
    /// Number of animation frames in the entity's texture strip.
    #[must_use]
    pub const fn frame_count(self) -> u32 {
        match self {
            Self::Boat => 24,
            Self::Explosion => 15,
            Self::BoatMissile => 12,
            _ => 1,
        }
    }

    /// Asset name passed to the texture loader.
    #[must_use]
    pub const fn asset_name(self) -> &'static str {
        match self {
            Self::Boat => "boat",
            Self::SubmarineI => "submarine1",
            Self::SubmarineII => "submarine2",
            Self::SubmarineIII => "submarine3",
            Self::Fish => "fish",
            Self::Bomb => "bomb",
            Self::Torpedo => "torpedo",
            Self::Missile => "missile",
            Self::BoatMissile => "boat_missile",
            Self::Explosion => "explosion",
            Self::Smoke => "smoke",
            Self::Ocean => "ocean",
            Self::BuyLives => "buy_lives",
            Self::BuyMissiles => "buy_missiles",
            Self::EndStore => "end_store",
            Self::BoatLivesIndicator => "boat_lives",
            Self::BoatMissilesIndicator => "boat_missiles",
            Self::IntroPanel => "intro",
            Self::OutroPanel => "outro",
            Self::Character => "glyph",
        }
    }
}

/// Horizontal heading of a spawned entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Moving towards negative x.
    Left,
    /// Moving towards positive x.
    #[default]
    Right,
}

impl Direction {
    /// Returns -1 for left and +1 for right.
    #[inline]
    #[must_use]
    pub const fn sign(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }
}
