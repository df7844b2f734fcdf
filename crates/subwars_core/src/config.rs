//! # Game Configuration
//!
//! Tunables loaded once at startup from TOML. Every field is optional in the
//! file; missing values fall back to the shipped defaults.
//!
//! ```toml
//! capacity = 1024
//!
//! [physics]
//! gravity = 200.0
//!
//! [player]
//! starting_lives = 5
//! ```

use crate::ecs::Position;
use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default number of entity slots, including the reserved identifier 0.
pub const MAX_ENTITIES: usize = 1024;

/// Top-level configuration for an [`EntityManager`](crate::EntityManager).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Number of slots in every component array. Identifier 0 is reserved,
    /// so at most `capacity - 1` entities are live at once.
    pub capacity: usize,
    /// Masses and forces applied by the factories.
    pub physics: PhysicsConfig,
    /// Player economy.
    pub player: PlayerConfig,
    /// Screen geometry and fixed spawn points.
    pub layout: LayoutConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            capacity: MAX_ENTITIES,
            physics: PhysicsConfig::default(),
            player: PlayerConfig::default(),
            layout: LayoutConfig::default(),
        }
    }
}

/// Physics constants used when constructing entities.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Downward force applied to bombs.
    pub gravity: f32,
    /// Mass of a bomb.
    pub bomb_mass: f32,
    /// Horizontal propulsion of a submarine.
    pub submarine_force: f32,
    /// Horizontal propulsion of a fish.
    pub fish_force: f32,
    /// Vertical force on a torpedo (negative is upwards).
    pub torpedo_force: f32,
    /// Mass given to entities that must ignore ambient forces.
    pub immovable_mass: f32,
    /// Mass of path-following projectiles.
    pub projectile_mass: f32,
    /// Mass of a smoke particle.
    pub smoke_mass: f32,
    /// Mass of the player boat.
    pub boat_mass: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 200.0,
            bomb_mass: 0.25,
            submarine_force: 50.0,
            fish_force: 25.0,
            torpedo_force: -100.0,
            immovable_mass: 999_999.0,
            projectile_mass: 99_999.0,
            smoke_mass: 0.005,
            boat_mass: 0.5,
        }
    }
}

/// Starting values and prices for the player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Money at the start of a game.
    pub starting_money: u64,
    /// Lives at the start of a game.
    pub starting_lives: u32,
    /// Boat missiles at the start of a game.
    pub starting_missiles: u32,
    /// Bombs the boat may have in flight at once.
    pub available_bombs: u32,
    /// Store price of one life.
    pub life_price: u64,
    /// Store price of one boat missile.
    pub missile_price: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            starting_money: 100,
            starting_lives: 5,
            starting_missiles: 1,
            available_bombs: 3,
            life_price: 50,
            missile_price: 50,
        }
    }
}

/// Screen geometry and fixed placements, in pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Screen width.
    pub screen_width: f32,
    /// Screen height.
    pub screen_height: f32,
    /// Vertical position of the ocean surface.
    pub ocean_surface: f32,
    /// Submarines may not be placed above this depth.
    pub minimum_submarine_depth: f32,
    /// Where the boat appears the first time.
    pub boat_spawn: [f32; 2],
    /// Where the boat reappears after losing a life.
    pub boat_respawn: [f32; 2],
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            screen_width: 1280.0,
            screen_height: 720.0,
            ocean_surface: 155.0,
            minimum_submarine_depth: 20.0,
            boat_spawn: [640.0, 155.0],
            boat_respawn: [640.0, 180.0],
        }
    }
}

impl LayoutConfig {
    /// Returns the boat spawn point.
    #[inline]
    #[must_use]
    pub fn boat_spawn_position(&self) -> Position {
        Position::new(self.boat_spawn[0], self.boat_spawn[1])
    }

    /// Returns the boat respawn point.
    #[inline]
    #[must_use]
    pub fn boat_respawn_position(&self) -> Position {
        Position::new(self.boat_respawn[0], self.boat_respawn[1])
    }

    /// Returns the center of the screen.
    #[inline]
    #[must_use]
    pub fn screen_center(&self) -> Position {
        Position::new(self.screen_width / 2.0, self.screen_height / 2.0)
    }
}

impl GameConfig {
    /// Parses and validates a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise the
    /// same errors as [`GameConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!(
            path = %path.as_ref().display(),
            capacity = config.capacity,
            "loaded game config"
        );
        Ok(config)
    }

    /// Checks value ranges the schema cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.capacity < 2 {
            return Err(ConfigError::Invalid {
                field: "capacity",
                reason: format!("must be at least 2, got {}", self.capacity),
            });
        }
        if self.capacity > u32::MAX as usize {
            return Err(ConfigError::Invalid {
                field: "capacity",
                reason: "must fit in a 32-bit identifier".to_string(),
            });
        }

        let masses = [
            ("physics.bomb_mass", self.physics.bomb_mass),
            ("physics.immovable_mass", self.physics.immovable_mass),
            ("physics.projectile_mass", self.physics.projectile_mass),
            ("physics.smoke_mass", self.physics.smoke_mass),
            ("physics.boat_mass", self.physics.boat_mass),
        ];
        for (field, mass) in masses {
            if !(mass.is_finite() && mass > 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("mass must be positive and finite, got {mass}"),
                });
            }
        }

        if self.layout.screen_width <= 0.0 || self.layout.screen_height <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "layout",
                reason: "screen dimensions must be positive".to_string(),
            });
        }

        Ok(())
    }
}
