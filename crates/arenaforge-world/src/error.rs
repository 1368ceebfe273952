//! Error types for the world layer.

use arenaforge_protocol::{ArenaId, WorldId};

use crate::BackendError;

/// Errors that can occur during placement and world teardown.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// No existing world could take the arena and provisioning a new one
    /// failed. Worlds are unbounded in area, so this only ever comes from
    /// the backend.
    #[error("no world available: provisioning '{name}' failed: {source}")]
    PlacementExhausted {
        name: String,
        #[source]
        source: BackendError,
    },

    /// The backend failed to tear a world down. The world stays in the pool.
    #[error("container backend failed for world {world_id}: {source}")]
    ContainerBackend {
        world_id: WorldId,
        #[source]
        source: BackendError,
    },

    /// The world does not exist (or was already removed).
    #[error("world {0} not found")]
    NotFound(WorldId),

    /// The world still hosts arenas, so it was not torn down.
    #[error("world {world_id} still hosts {arenas} arena(s)")]
    Occupied { world_id: WorldId, arenas: usize },

    /// The arena isn't registered in the given world.
    #[error("arena {0} is not in world {1}")]
    ArenaNotInWorld(ArenaId, WorldId),
}
