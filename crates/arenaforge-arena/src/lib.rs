//! Arena layer for Arenaforge.
//!
//! Everything that describes a single arena, independent of where it is
//! placed or who shares it across threads.
//!
//! # Key types
//!
//! - [`ArenaConfig`] / [`ArenaConfigOverrides`]: immutable settings and
//!   per-arena overrides merged on top of them
//! - [`SchematicRegistry`]: named spawn-point templates
//! - [`Arena`]: one session's membership, spawns, and lifecycle
//! - [`ArenaState`]: the lifecycle state machine
//! - [`ArenaExtension`]: caller-supplied data and hooks attached to an arena

mod arena;
mod config;
mod error;
mod extension;
mod schematic;

pub use arena::{Arena, ArenaInfo, JoinOutcome};
pub use config::{ArenaConfig, ArenaConfigOverrides, ArenaState};
pub use error::{ArenaError, ConfigError, SchematicError};
pub use extension::ArenaExtension;
pub use schematic::{SchematicData, SchematicRegistry};
