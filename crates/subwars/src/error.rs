//! Stage error types.

use std::path::PathBuf;

use subwars_core::{SnapshotError, SpawnError};
use thiserror::Error;

/// Failures while loading a stage table or advancing through it.
#[derive(Debug, Error)]
pub enum StageError {
    /// The stage table file could not be read.
    #[error("failed to read stage table {path}: {source}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The stage table is not valid TOML or does not match the schema.
    #[error("failed to parse stage table: {0}")]
    Parse(#[from] toml::de::Error),

    /// A stage carries a value the controller cannot use.
    #[error("stage {stage}: {reason}")]
    Invalid {
        /// One-based stage number.
        stage: u32,
        /// What is wrong with it.
        reason: String,
    },

    /// The last stage has been cleared.
    #[error("no stage after #{0}")]
    NoNextStage(u32),

    /// An entity the stage needed could not be made.
    #[error(transparent)]
    Spawn(#[from] SpawnError),

    /// A saved scene could not be restored.
    #[error("failed to restore the saved scene: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// Result alias for stage operations.
pub type StageResult<T> = Result<T, StageError>;
