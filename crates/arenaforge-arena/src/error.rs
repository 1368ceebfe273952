//! Error types for the arena layer.

use arenaforge_protocol::{ArenaId, PlayerId};

use crate::ArenaState;

/// Errors that can occur during arena operations.
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    /// No player slots left.
    #[error("arena {0} is full")]
    ArenaFull(ArenaId),

    /// The arena is in a state that doesn't allow this operation.
    /// For example, joining an arena that's already Running.
    #[error("arena {arena_id} is {state}: {reason}")]
    InvalidState {
        arena_id: ArenaId,
        state: ArenaState,
        reason: String,
    },

    /// The arena has reached its terminal state. Nothing can be done with
    /// it anymore.
    #[error("arena {0} has already ended")]
    ArenaEnded(ArenaId),

    /// The player is already a member of this arena.
    #[error("player {0} already in arena {1}")]
    AlreadyMember(PlayerId, ArenaId),

    /// The player is not a member of this arena.
    #[error("player {0} not in arena {1}")]
    NotMember(PlayerId, ArenaId),
}

/// Errors from the schematic registry.
#[derive(Debug, thiserror::Error)]
pub enum SchematicError {
    /// A schematic with this name is already registered.
    #[error("schematic '{0}' is already registered")]
    Duplicate(String),

    /// No schematic with this name is registered.
    #[error("unknown schematic '{0}'")]
    Unknown(String),

    /// Every schematic needs at least one spawn point.
    #[error("schematic '{0}' has no spawn points")]
    NoSpawnPoints(String),
}

/// A configuration value failed validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid arena config: {0}")]
    Invalid(String),
}
