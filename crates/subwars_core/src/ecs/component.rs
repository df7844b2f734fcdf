//! # Component Catalogue
//!
//! Components are pure data containers with no behavior beyond small
//! helpers. The catalogue is closed: [`ComponentKind`] lists every kind and
//! the [`Component`] trait ties each direct kind to its backing array.
//!
//! Position, velocity, rotation and color are plain-old-data so their arrays
//! can be handed to a renderer as raw bytes.

use super::entity::EntityId;
use super::registry::ComponentRegistry;
use super::storage::ComponentStorage;
use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Every component kind, in bitmask order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ComponentKind {
    /// Visual representation (indirect: static or animated sprite).
    Sprite = 0,
    /// Tint.
    Color,
    /// Position on screen.
    Position,
    /// Velocity.
    Velocity,
    /// Rotation.
    Rotation,
    /// Mass, external force and scale.
    Physics,
    /// Collision metadata.
    Collision,
    /// Player input state.
    Input,
    /// Attack and radar parameters.
    Attack,
    /// Score awarded on destruction.
    Score,
    /// Path-following state.
    Pathing,
    /// Frame animation state.
    Animation,
    /// Store-icon role.
    Store,
    /// Visual distortion flag.
    Distortion,
    /// The single player record.
    Player,
}

impl ComponentKind {
    /// All kinds in bit order.
    pub const ALL: [Self; 15] = [
        Self::Sprite,
        Self::Color,
        Self::Position,
        Self::Velocity,
        Self::Rotation,
        Self::Physics,
        Self::Collision,
        Self::Input,
        Self::Attack,
        Self::Score,
        Self::Pathing,
        Self::Animation,
        Self::Store,
        Self::Distortion,
        Self::Player,
    ];

    /// The kind's bit in a [`ComponentMask`](super::ComponentMask).
    #[inline]
    #[must_use]
    pub const fn bit(self) -> u32 {
        1 << self as u32
    }

    /// Whether the array slot holds a reference into a sub-array rather
    /// than the value itself.
    #[inline]
    #[must_use]
    pub const fn is_indirect(self) -> bool {
        matches!(self, Self::Sprite)
    }

    /// Whether the kind has a single slot instead of one per entity.
    #[inline]
    #[must_use]
    pub const fn is_singleton(self) -> bool {
        matches!(self, Self::Player)
    }

    /// Whether attaching the kind sets a bit in the entity's bitmask.
    ///
    /// The player singleton and the distortion flag are untracked; the
    /// flag is cleared on every removal instead.
    #[inline]
    #[must_use]
    pub const fn is_tracked(self) -> bool {
        !self.is_singleton() && !matches!(self, Self::Distortion)
    }
}

/// A direct component kind with a typed backing array in the
/// [`ComponentRegistry`].
///
/// Implemented only by the registry, so fetching the array of a kind that
/// does not exist is a compile error rather than a runtime failure.
///
/// # Example
///
/// ```rust,ignore
/// let positions = Position::storage(manager.registry());
/// let boat = positions.get(boat_id.index());
/// ```
pub trait Component: Clone + Default + 'static {
    /// The kind tag of this component.
    const KIND: ComponentKind;

    /// Returns the backing array.
    fn storage(registry: &ComponentRegistry) -> &ComponentStorage<Self>;

    /// Returns the backing array mutably.
    fn storage_mut(registry: &mut ComponentRegistry) -> &mut ComponentStorage<Self>;
}

// ============================================================================
// PLAIN-OLD-DATA COMPONENTS
// ============================================================================

/// RGBA tint, each channel in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Color {
    /// Red channel.
    pub r: f32,
    /// Green channel.
    pub g: f32,
    /// Blue channel.
    pub b: f32,
    /// Alpha channel.
    pub a: f32,
}

impl Color {
    /// Opaque white; leaves textures untinted.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    /// Opaque black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Creates a color.
    #[inline]
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Position in screen space (pixels, y grows downwards).
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
#[repr(C)]
pub struct Position {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl Position {
    /// Creates a new position.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the squared distance to another position.
    #[inline]
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// Velocity in pixels per second.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
#[repr(C)]
pub struct Velocity {
    /// Horizontal speed.
    pub vx: f32,
    /// Vertical speed.
    pub vy: f32,
}

impl Velocity {
    /// Creates a new velocity.
    #[inline]
    #[must_use]
    pub const fn new(vx: f32, vy: f32) -> Self {
        Self { vx, vy }
    }

    /// The zero velocity.
    pub const ZERO: Self = Self::new(0.0, 0.0);
}

/// Rotation around the sprite center.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
#[repr(C)]
pub struct Rotation {
    /// Angle in radians.
    pub radians: f32,
}

// ============================================================================
// GAMEPLAY COMPONENTS
// ============================================================================

/// Mass, constant external force and render scale.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Physics {
    /// Mass; large values make ambient forces negligible.
    pub mass: f32,
    /// Constant force applied every frame.
    pub force: [f32; 2],
    /// Render scale; a negative x mirrors the sprite.
    pub scale: [f32; 2],
}

impl Default for Physics {
    fn default() -> Self {
        Self {
            mass: 1.0,
            force: [0.0, 0.0],
            scale: [1.0, 1.0],
        }
    }
}

/// What an entity is, as far as collision resolution cares.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollisionKind {
    /// Not collidable.
    #[default]
    None,
    /// The player boat.
    Boat,
    /// A bomb.
    Bomb,
    /// A submarine of any type.
    Submarine,
    /// A fish.
    Fish,
    /// A torpedo.
    Torpedo,
    /// An enemy missile.
    Missile,
    /// A boat missile.
    BoatMissile,
    /// An explosion.
    Explosion,
    /// A smoke particle.
    Smoke,
    /// A store icon.
    StoreIcon,
}

/// Collision metadata maintained by the collision system.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Collision {
    /// Collision layer.
    pub kind: CollisionKind,
    /// Spatial-grid cells the entity occupied last frame.
    pub grid_cells: Vec<(i32, i32)>,
    /// Entities this one must not collide with.
    pub ignore: Vec<EntityId>,
    /// Cell count from the previous frame; -1 before the first scan.
    pub prev_cell_count: i32,
}

impl Collision {
    /// Fresh metadata for a newly constructed entity.
    #[must_use]
    pub fn new(kind: CollisionKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }
}

impl Default for Collision {
    fn default() -> Self {
        Self {
            kind: CollisionKind::None,
            grid_cells: Vec::new(),
            ignore: Vec::new(),
            prev_cell_count: -1,
        }
    }
}

/// Player input state, written by the input system.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Input {
    /// Steering left.
    pub left: bool,
    /// Steering right.
    pub right: bool,
    /// Bomb trigger.
    pub fire_bomb: bool,
    /// Boat missile trigger.
    pub fire_missile: bool,
}

/// Weapon carried by an attacking submarine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weapon {
    /// Unarmed.
    #[default]
    None,
    /// Fires torpedoes straight up.
    Torpedo,
    /// Fires missiles homing on the boat.
    Missile,
}

/// Attack and radar parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Attack {
    /// Weapon fired when the boat is in range.
    pub weapon: Weapon,
    /// Radar radius within which the boat is detected.
    pub radius: f32,
}

/// Score awarded when the entity is destroyed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    /// Points.
    pub score: u32,
}

/// Path-following state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pathing {
    /// Start of the path.
    pub start: Position,
    /// End of the path.
    pub target: Position,
    /// Follow a curved path instead of a straight line.
    pub bezier: bool,
    /// Progress added per step, in `(0, 1]`.
    pub increment: f32,
    /// Progress along the path, in `[0, 1]`.
    pub progress: f32,
}

impl Default for Pathing {
    fn default() -> Self {
        Self {
            start: Position::default(),
            target: Position::default(),
            bezier: false,
            increment: 0.01,
            progress: 0.0,
        }
    }
}

/// How an animation behaves after its last frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AnimationMode {
    /// Wrap around to the first frame.
    #[default]
    Loopback,
    /// Stop and report completion.
    Autoterminating,
}

/// Action the manager takes when an autoterminating animation finishes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OnFinish {
    /// Leave the entity alone.
    #[default]
    Nothing,
    /// Remove the entity from the explosion collection.
    RemoveExplosion,
}

/// Frame animation state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Animation {
    /// Playback mode.
    pub mode: AnimationMode,
    /// Current frame.
    pub frame: u32,
    /// Frames in the strip.
    pub frame_count: u32,
    /// Seconds per frame.
    pub frame_time: f32,
    /// Seconds spent on the current frame.
    pub elapsed: f32,
    /// Completion action for autoterminating playback.
    pub on_finish: OnFinish,
}

impl Default for Animation {
    fn default() -> Self {
        Self {
            mode: AnimationMode::Loopback,
            frame: 0,
            frame_count: 1,
            frame_time: 1.0 / 24.0,
            elapsed: 0.0,
            on_finish: OnFinish::Nothing,
        }
    }
}

impl Animation {
    /// Creates an animation starting at frame 0.
    #[must_use]
    pub fn new(mode: AnimationMode, frame_count: u32, on_finish: OnFinish) -> Self {
        Self {
            mode,
            frame_count: frame_count.max(1),
            on_finish,
            ..Self::default()
        }
    }

    /// Advances playback by `dt` seconds.
    ///
    /// # Returns
    ///
    /// `true` exactly once, on the step an autoterminating animation passes
    /// its last frame.
    ///
    /// A non-positive `frame_time` shows one frame per call.
    pub fn advance(&mut self, dt: f32) -> bool {
        if self.frame >= self.frame_count {
            return false;
        }

        if self.frame_time <= 0.0 {
            self.elapsed = 0.0;
            return self.next_frame();
        }

        self.elapsed += dt;
        while self.elapsed >= self.frame_time {
            self.elapsed -= self.frame_time;
            if self.next_frame() {
                return true;
            }
        }
        false
    }

    fn next_frame(&mut self) -> bool {
        self.frame += 1;
        if self.frame >= self.frame_count {
            match self.mode {
                AnimationMode::Loopback => self.frame = 0,
                AnimationMode::Autoterminating => return true,
            }
        }
        false
    }
}

/// What a store icon sells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StoreRole {
    /// Not a store icon.
    #[default]
    None,
    /// Sells one life.
    Life,
    /// Sells one boat missile.
    BoatMissile,
    /// Leaves the store.
    End,
}

/// Store-icon role.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Store {
    /// What the icon does when shot.
    pub role: StoreRole,
}

/// Visual distortion hint for the renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Distortion {
    /// Render the entity through the water distortion pass.
    pub distort: bool,
}

/// The single player record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Player {
    /// Identifier of the player boat.
    pub pid: EntityId,
    /// Money available in the store.
    pub money: u64,
    /// Accumulated score.
    pub score: u64,
    /// Lives left.
    pub lives: u32,
    /// Boat missiles left.
    pub missiles: u32,
    /// Bombs that may still be dropped.
    pub available_bombs: u32,
    /// Set when a projectile hits the boat, cleared on respawn.
    pub boat_destroyed: bool,
}

impl Player {
    /// Deducts `amount` if the player can afford it.
    ///
    /// # Returns
    ///
    /// `true` if the money was spent.
    pub fn spend_money(&mut self, amount: u64) -> bool {
        match self.money.checked_sub(amount) {
            Some(left) => {
                self.money = left;
                true
            }
            None => false,
        }
    }

    /// Adds a destroyed entity's score, also crediting it as money.
    pub fn award(&mut self, points: u32) {
        self.score += u64::from(points);
        self.money += u64::from(points);
    }
}
