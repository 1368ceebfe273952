//! Unified error type for Arenaforge.

use arenaforge_arena::{ArenaError, ConfigError, SchematicError};
use arenaforge_protocol::{ArenaId, PlayerId, ProtocolError};
use arenaforge_world::WorldError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `arenaforge` crate you deal with this single error type
/// instead of importing errors from each layer. The `#[from]` attribute
/// on the wrapping variants generates `From` impls, so `?` converts layer
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// No live or ended arena has this id.
    #[error("arena {0} not found")]
    ArenaNotFound(ArenaId),

    /// No schematic is registered under this name.
    #[error("schematic '{0}' not found")]
    SchematicNotFound(String),

    /// The player is already a member of another arena.
    #[error("player {0} is already in arena {1}")]
    AlreadyInArena(PlayerId, ArenaId),

    /// An arena-level error (full, invalid state, ended, membership).
    #[error(transparent)]
    Arena(#[from] ArenaError),

    /// A schematic registry error (duplicate name, no spawn points).
    #[error(transparent)]
    Schematic(#[from] SchematicError),

    /// An invalid configuration value.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A placement or container backend error.
    #[error(transparent)]
    World(#[from] WorldError),

    /// A settings document or notification failed to (de)serialize.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl OrchestratorError {
    /// Lifts a registry error, reporting unknown names as
    /// [`SchematicNotFound`](Self::SchematicNotFound).
    pub(crate) fn from_schematic(err: SchematicError) -> Self {
        match err {
            SchematicError::Unknown(name) => Self::SchematicNotFound(name),
            other => Self::Schematic(other),
        }
    }
}
