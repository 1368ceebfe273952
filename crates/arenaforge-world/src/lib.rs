//! World layer for Arenaforge.
//!
//! Decides which spatial container each arena lives in and where inside
//! it, creates containers when none has room, and tears them down once
//! they empty out.
//!
//! # Key types
//!
//! - [`WorldPool`]: owns every world; placement and teardown
//! - [`ArenaWorld`]: one container and the arenas placed in it
//! - [`ContainerBackend`]: the host's hook for creating/destroying containers
//! - [`MemoryBackend`]: in-memory backend for tests and demos
//! - [`PlacementConfig`]: search budget, anchor, naming, distance metric

mod backend;
mod error;
mod placement;
mod pool;
mod world;

pub use backend::{BackendError, ContainerBackend, MemoryBackend, MemoryHandle};
pub use error::WorldError;
pub use placement::{DistanceMetric, PlacementConfig};
pub use pool::{Detached, Placement, Site, WorldPool};
pub use world::{ArenaHandle, ArenaSlot, ArenaWorld, WorldInfo};
