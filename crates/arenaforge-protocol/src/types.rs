//! Core value types shared by every Arenaforge layer.
//!
//! Identifiers, positions inside a world, and the lifecycle notifications
//! the orchestrator emits.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// This is a "newtype wrapper": a `u64` in a named struct, so a
/// `PlayerId` can never be passed where an `ArenaId` is expected.
///
/// `#[serde(transparent)]` serializes it as the bare number, so
/// `PlayerId(42)` becomes `42` in JSON rather than `{ "0": 42 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for an arena (one game session).
///
/// Arena ids are handed out sequentially by the orchestrator that created
/// the arena and are never reused within that orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArenaId(pub u64);

impl fmt::Display for ArenaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A-{}", self.0)
    }
}

/// A unique identifier for a world (a spatial container hosting arenas).
///
/// Ordering follows creation order, which is the order the placement
/// search visits worlds in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldId(pub u64);

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "W-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// An offset from an arena's origin, as stored in a schematic.
///
/// `yaw` and `pitch` describe which way a player spawned here faces. Both
/// are optional in serialized form and default to 0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RelativeLocation {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default)]
    pub yaw: f32,
    #[serde(default)]
    pub pitch: f32,
}

impl RelativeLocation {
    /// Creates an offset with zero yaw and pitch.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    /// Returns a copy facing the given direction.
    pub fn with_rotation(self, yaw: f32, pitch: f32) -> Self {
        Self { yaw, pitch, ..self }
    }
}

/// A position inside a world, relative to the world's own coordinate
/// system (not to any arena).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default)]
    pub yaw: f32,
    #[serde(default)]
    pub pitch: f32,
}

impl Location {
    /// Creates a location with zero yaw and pitch.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    /// Resolves a schematic offset against this location.
    ///
    /// Coordinates are added; orientation is taken from the offset, since
    /// an arena origin has no meaningful facing of its own.
    pub fn offset(&self, rel: &RelativeLocation) -> Location {
        Location {
            x: self.x + rel.x,
            y: self.y + rel.y,
            z: self.z + rel.z,
            yaw: rel.yaw,
            pitch: rel.pitch,
        }
    }

    /// Straight-line distance in all three axes.
    pub fn distance(&self, other: &Location) -> f64 {
        let dy = self.y - other.y;
        (self.horizontal_distance_squared(other) + dy * dy).sqrt()
    }

    /// Distance in the horizontal (x, z) plane, ignoring height.
    pub fn horizontal_distance(&self, other: &Location) -> f64 {
        self.horizontal_distance_squared(other).sqrt()
    }

    fn horizontal_distance_squared(&self, other: &Location) -> f64 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        dx * dx + dz * dz
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1}, {:.1})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// LifecycleEvent
// ---------------------------------------------------------------------------

/// A notification emitted by the orchestrator after a lifecycle change has
/// committed.
///
/// The orchestrator only *produces* these. Delivering them to listeners is
/// the job of whatever sink the host application plugs in.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON:
/// `{ "type": "ArenaCreated", "arena_id": 1, "world_id": 1 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LifecycleEvent {
    /// A new world was provisioned by the container backend.
    WorldCreated { world_id: WorldId, name: String },

    /// A world was torn down and removed from the pool.
    WorldRemoved { world_id: WorldId },

    /// An arena was placed and is now accepting players.
    ArenaCreated { arena_id: ArenaId, world_id: WorldId },

    /// An arena moved into its running phase.
    ArenaStarted { arena_id: ArenaId, world_id: WorldId },

    /// An arena reached its terminal state and left its world.
    ArenaEnded { arena_id: ArenaId, world_id: WorldId },

    /// A player became a member of an arena.
    PlayerJoined {
        arena_id: ArenaId,
        world_id: WorldId,
        player_id: PlayerId,
    },

    /// A player stopped being a member of an arena.
    PlayerLeft {
        arena_id: ArenaId,
        world_id: WorldId,
        player_id: PlayerId,
    },
}

impl LifecycleEvent {
    /// The world this event concerns. Every event has one.
    pub fn world_id(&self) -> WorldId {
        match self {
            Self::WorldCreated { world_id, .. }
            | Self::WorldRemoved { world_id }
            | Self::ArenaCreated { world_id, .. }
            | Self::ArenaStarted { world_id, .. }
            | Self::ArenaEnded { world_id, .. }
            | Self::PlayerJoined { world_id, .. }
            | Self::PlayerLeft { world_id, .. } => *world_id,
        }
    }

    /// The arena this event concerns, if it is arena-scoped.
    pub fn arena_id(&self) -> Option<ArenaId> {
        match self {
            Self::WorldCreated { .. } | Self::WorldRemoved { .. } => None,
            Self::ArenaCreated { arena_id, .. }
            | Self::ArenaStarted { arena_id, .. }
            | Self::ArenaEnded { arena_id, .. }
            | Self::PlayerJoined { arena_id, .. }
            | Self::PlayerLeft { arena_id, .. } => Some(*arena_id),
        }
    }
}
