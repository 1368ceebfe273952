//! # Arenaforge
//!
//! Arena and world lifecycle orchestration for multiplayer game servers.
//!
//! Arenaforge decides where each arena (one isolated game session built
//! from a structure template) goes, creates the worlds that host them on
//! demand, moves players in and out, drives every arena through its
//! lifecycle, and tears worlds down once they empty out. The host plugs in
//! how worlds are actually created through a
//! [`ContainerBackend`](arenaforge_world::ContainerBackend) and listens to
//! what happened through an [`EventSink`].
//!
//! ## Quick Start
//!
//! ```rust
//! use arenaforge::prelude::*;
//!
//! let orchestrator = Orchestrator::new(MemoryBackend::new());
//! orchestrator
//!     .register_schematic("arena_a", vec![RelativeLocation::new(0.0, 64.0, 0.0)])
//!     .unwrap();
//!
//! let overrides = ArenaConfigOverrides::default()
//!     .with_auto_start_arenas(true)
//!     .with_max_players_per_arena(4);
//! let arena = orchestrator.create_arena("arena_a", &overrides).unwrap();
//!
//! orchestrator.join(arena, PlayerId(1)).unwrap();
//! let outcome = orchestrator.join(arena, PlayerId(2)).unwrap();
//! assert!(outcome.started);
//!
//! orchestrator.end(arena).unwrap();
//! assert_eq!(orchestrator.world_count(), 0);
//! ```

mod error;
mod events;
mod orchestrator;
mod settings;

pub use error::OrchestratorError;
pub use events::{EventLog, EventSink};
pub use orchestrator::{Orchestrator, OrchestratorBuilder};
pub use settings::OrchestratorConfig;

/// Convenient re-exports for hosts.
///
/// ```rust
/// use arenaforge::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        EventLog, EventSink, Orchestrator, OrchestratorBuilder, OrchestratorConfig,
        OrchestratorError,
    };
    pub use arenaforge_arena::{
        Arena, ArenaConfig, ArenaConfigOverrides, ArenaError, ArenaExtension, ArenaInfo,
        ArenaState, ConfigError, JoinOutcome, SchematicData, SchematicError,
    };
    pub use arenaforge_protocol::{
        ArenaId, Codec, JsonCodec, LifecycleEvent, Location, PlayerId, ProtocolError,
        RelativeLocation, WorldId,
    };
    pub use arenaforge_world::{
        BackendError, ContainerBackend, DistanceMetric, MemoryBackend, MemoryHandle,
        PlacementConfig, WorldError, WorldInfo,
    };
}
