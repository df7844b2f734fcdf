//! # Core Error Types
//!
//! Recoverable failures of the entity manager. API misuse (an identifier
//! outside the storage capacity, a singleton UI element set up twice) is a
//! programmer error and panics instead.

use crate::ecs::{EntityId, EntityType};
use thiserror::Error;

/// Errors raised by a `make_*` factory call.
///
/// A failed spawn never leaves a component slot populated or a bitmask bit
/// set; the caller simply skips the entity this frame.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpawnError {
    /// Every identifier in the pool is currently in use.
    #[error("identifier pool exhausted")]
    PoolExhausted,

    /// The visual representation for the entity could not be produced.
    #[error("sprite unavailable for {kind:?}: {reason}")]
    SpriteUnavailable {
        /// The entity type being spawned.
        kind: EntityType,
        /// Loader diagnostic.
        reason: String,
    },

    /// The requested placement is outside the area the entity may occupy.
    #[error("invalid placement for {kind:?} at y = {y}")]
    InvalidPlacement {
        /// The entity type being spawned.
        kind: EntityType,
        /// The rejected vertical coordinate.
        y: f32,
    },
}

/// Result type for factory operations.
pub type SpawnResult<T> = Result<T, SpawnError>;

/// Errors raised while loading a [`GameConfig`](crate::GameConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed correctly but is out of range.
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while restoring a [`SaveSnapshot`](crate::SaveSnapshot).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SnapshotError {
    /// The snapshot was taken from a manager with a different capacity.
    #[error("snapshot capacity mismatch: expected {expected}, found {found}")]
    CapacityMismatch {
        /// Capacity of the loading manager.
        expected: usize,
        /// Capacity recorded in the snapshot.
        found: usize,
    },

    /// A saved identifier is null or outside the snapshot's capacity.
    #[error("saved identifier {0} is out of range")]
    IdentifierUnavailable(EntityId),

    /// Rebuilding a saved entity failed.
    #[error("failed to rebuild saved entity: {0}")]
    Spawn(#[from] SpawnError),
}

/// Result type for snapshot restore.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Error reported by a [`TextureLoader`](crate::TextureLoader).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to load texture `{asset}`: {reason}")]
pub struct TextureError {
    /// Asset name that failed.
    pub asset: String,
    /// Loader diagnostic.
    pub reason: String,
}
