//! The orchestrator: creates arenas, routes players, and drives arenas
//! through their lifecycle while keeping worlds in step.
//!
//! # Locking
//!
//! Every arena has its own mutex, so operations on different arenas run
//! in parallel. The world pool has one mutex of its own, and there are
//! small indexes (arena ids, player memberships) behind short-lived locks.
//! Whenever more than one is held, the arena lock is taken first. The
//! pool never locks an arena.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arenaforge_arena::{
    Arena, ArenaConfig, ArenaConfigOverrides, ArenaError, ArenaExtension, ArenaInfo,
    JoinOutcome, SchematicData, SchematicRegistry,
};
use arenaforge_protocol::{ArenaId, LifecycleEvent, Location, PlayerId, RelativeLocation, WorldId};
use arenaforge_world::{ArenaHandle, ContainerBackend, PlacementConfig, WorldInfo, WorldPool};
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};

use crate::{EventSink, OrchestratorConfig, OrchestratorError};

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for configuring an [`Orchestrator`].
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use arenaforge::prelude::*;
///
/// let log = Arc::new(EventLog::new());
/// let orchestrator = Orchestrator::builder(MemoryBackend::new())
///     .defaults(ArenaConfig {
///         auto_start_arenas: true,
///         ..ArenaConfig::default()
///     })
///     .sink(Arc::clone(&log))
///     .build()
///     .unwrap();
/// # let _ = orchestrator;
/// ```
pub struct OrchestratorBuilder<B, S> {
    backend: B,
    config: OrchestratorConfig,
    sink: S,
}

impl<B: ContainerBackend> OrchestratorBuilder<B, ()> {
    fn new(backend: B) -> Self {
        Self {
            backend,
            config: OrchestratorConfig::default(),
            sink: (),
        }
    }
}

impl<B: ContainerBackend, S: EventSink> OrchestratorBuilder<B, S> {
    /// Replaces the whole configuration.
    pub fn config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the global arena defaults.
    pub fn defaults(mut self, defaults: ArenaConfig) -> Self {
        self.config.defaults = defaults;
        self
    }

    /// Sets the placement search settings.
    pub fn placement(mut self, placement: PlacementConfig) -> Self {
        self.config.placement = placement;
        self
    }

    /// Sets where lifecycle notifications are sent.
    pub fn sink<S2: EventSink>(self, sink: S2) -> OrchestratorBuilder<B, S2> {
        OrchestratorBuilder {
            backend: self.backend,
            config: self.config,
            sink,
        }
    }

    /// Validates the configuration and builds the orchestrator.
    ///
    /// # Errors
    /// [`OrchestratorError::Config`] if either config section is invalid.
    pub fn build(self) -> Result<Orchestrator<B, S>, OrchestratorError> {
        let config = self.config.validated()?;
        let pool = WorldPool::with_config(self.backend, config.placement)?;
        tracing::debug!(defaults = ?config.defaults, "orchestrator ready");
        Ok(Orchestrator {
            defaults: config.defaults,
            schematics: RwLock::new(SchematicRegistry::new()),
            pool,
            arenas: RwLock::new(IndexMap::new()),
            players: Mutex::new(HashMap::new()),
            next_arena: AtomicU64::new(1),
            sink: self.sink,
        })
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Owns the schematic registry, the world pool, and every live arena.
///
/// All operations take `&self`; share it across threads with an `Arc`.
/// Every operation either commits fully (state change plus notification)
/// or has no effect.
pub struct Orchestrator<B: ContainerBackend, S: EventSink = ()> {
    defaults: ArenaConfig,
    schematics: RwLock<SchematicRegistry>,
    pool: WorldPool<B>,
    /// Live arenas in creation order.
    arenas: RwLock<IndexMap<ArenaId, ArenaHandle>>,
    /// Which arena each player is in. A player is in at most one.
    players: Mutex<HashMap<PlayerId, ArenaId>>,
    /// Next arena id. Ids are handed out in order and never reused, so any
    /// id below this that is missing from `arenas` has ended.
    next_arena: AtomicU64,
    sink: S,
}

impl<B: ContainerBackend> Orchestrator<B, ()> {
    /// Starts building an orchestrator on top of `backend`.
    pub fn builder(backend: B) -> OrchestratorBuilder<B, ()> {
        OrchestratorBuilder::new(backend)
    }

    /// An orchestrator with default settings that discards notifications.
    pub fn new(backend: B) -> Self {
        Self {
            defaults: ArenaConfig::default(),
            schematics: RwLock::new(SchematicRegistry::new()),
            pool: WorldPool::new(backend),
            arenas: RwLock::new(IndexMap::new()),
            players: Mutex::new(HashMap::new()),
            next_arena: AtomicU64::new(1),
            sink: (),
        }
    }
}

impl<B: ContainerBackend, S: EventSink> Orchestrator<B, S> {
    pub fn defaults(&self) -> &ArenaConfig {
        &self.defaults
    }

    pub fn backend(&self) -> &B {
        self.pool.backend()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    // -----------------------------------------------------------------------
    // Schematics
    // -----------------------------------------------------------------------

    /// Registers a schematic.
    ///
    /// # Errors
    /// [`OrchestratorError::Schematic`] if the name is taken or there are
    /// no spawn points.
    pub fn register_schematic(
        &self,
        name: impl Into<String>,
        spawn_points: Vec<RelativeLocation>,
    ) -> Result<(), OrchestratorError> {
        self.schematics
            .write()
            .register(name, spawn_points)
            .map_err(OrchestratorError::from_schematic)
    }

    /// Registers a schematic, replacing any existing one of the same name.
    /// Arenas already created from the old one are unaffected.
    pub fn register_or_replace_schematic(
        &self,
        name: impl Into<String>,
        spawn_points: Vec<RelativeLocation>,
    ) -> Result<Option<SchematicData>, OrchestratorError> {
        self.schematics
            .write()
            .register_or_replace(name, spawn_points)
            .map_err(OrchestratorError::from_schematic)
    }

    /// Appends a spawn point to a registered schematic. Only arenas created
    /// afterwards see it.
    pub fn add_spawn_point(
        &self,
        name: &str,
        location: RelativeLocation,
    ) -> Result<(), OrchestratorError> {
        self.schematics
            .write()
            .add_spawn_point(name, location)
            .map_err(OrchestratorError::from_schematic)
    }

    pub fn remove_schematic(&self, name: &str) -> Result<SchematicData, OrchestratorError> {
        self.schematics
            .write()
            .remove(name)
            .map_err(OrchestratorError::from_schematic)
    }

    /// Registered schematic names, in registration order.
    pub fn schematic_names(&self) -> Vec<String> {
        self.schematics.read().list()
    }

    pub fn schematic(&self, name: &str) -> Result<SchematicData, OrchestratorError> {
        self.schematics
            .read()
            .resolve(name)
            .cloned()
            .map_err(OrchestratorError::from_schematic)
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Creates an arena from a schematic and opens it for players.
    ///
    /// `overrides` are merged on top of the global defaults. The arena is
    /// placed in the oldest world with room for it, or in a freshly
    /// provisioned one. Emits `WorldCreated` (if a world was provisioned)
    /// and then `ArenaCreated`.
    ///
    /// # Errors
    /// - [`OrchestratorError::SchematicNotFound`] for an unknown schematic
    /// - [`OrchestratorError::Config`] if the merged config is invalid
    /// - [`OrchestratorError::World`] if a world was needed and could not
    ///   be provisioned
    pub fn create_arena(
        &self,
        schematic: &str,
        overrides: &ArenaConfigOverrides,
    ) -> Result<ArenaId, OrchestratorError> {
        self.spawn_arena(schematic, overrides, None)
    }

    /// Like [`create_arena`](Self::create_arena), with an extension
    /// attached before the arena opens.
    pub fn create_arena_with(
        &self,
        schematic: &str,
        overrides: &ArenaConfigOverrides,
        extension: Box<dyn ArenaExtension>,
    ) -> Result<ArenaId, OrchestratorError> {
        self.spawn_arena(schematic, overrides, Some(extension))
    }

    fn spawn_arena(
        &self,
        schematic: &str,
        overrides: &ArenaConfigOverrides,
        extension: Option<Box<dyn ArenaExtension>>,
    ) -> Result<ArenaId, OrchestratorError> {
        let data = self.schematic(schematic)?;
        let config = self.defaults.merge(overrides)?;

        let placement = self.pool.place_arena(&config, |site| {
            if let Some(name) = site.created_world {
                self.sink.emit(LifecycleEvent::WorldCreated {
                    world_id: site.world_id,
                    name: name.to_string(),
                });
            }
            let arena_id = ArenaId(self.next_arena.fetch_add(1, Ordering::Relaxed));
            let arena = Arena::new(arena_id, site.world_id, &data, site.origin, config);
            let arena = match extension {
                Some(extension) => arena.with_extension(extension),
                None => arena,
            };
            arena.opened()
        })?;

        let arena = placement.arena.lock();
        let arena_id = arena.id();
        self.arenas
            .write()
            .insert(arena_id, Arc::clone(&placement.arena));

        tracing::info!(
            %arena_id,
            world_id = %placement.world_id,
            schematic,
            origin = %placement.origin,
            "arena created"
        );
        self.sink.emit(LifecycleEvent::ArenaCreated {
            arena_id,
            world_id: placement.world_id,
        });
        Ok(arena_id)
    }

    /// Adds a player to an arena and returns their spawn.
    ///
    /// If this join starts the arena, `PlayerJoined` is followed by
    /// `ArenaStarted`.
    ///
    /// # Errors
    /// - [`OrchestratorError::ArenaNotFound`] for an unknown arena
    /// - [`OrchestratorError::AlreadyInArena`] if the player is in another
    ///   arena
    /// - [`OrchestratorError::Arena`] for ended, non-joinable, or full
    ///   arenas, or a player who is already a member
    pub fn join(
        &self,
        arena_id: ArenaId,
        player_id: PlayerId,
    ) -> Result<JoinOutcome, OrchestratorError> {
        let handle = self.handle(arena_id)?;
        let mut arena = handle.lock();

        let outcome = {
            let mut players = self.players.lock();
            if let Some(&current) = players.get(&player_id) {
                if current != arena_id {
                    tracing::warn!(%player_id, %arena_id, %current, "player already in another arena");
                    return Err(OrchestratorError::AlreadyInArena(player_id, current));
                }
            }
            let outcome = arena.join(player_id)?;
            players.insert(player_id, arena_id);
            outcome
        };

        let world_id = arena.world_id();
        self.sink.emit(LifecycleEvent::PlayerJoined {
            arena_id,
            world_id,
            player_id,
        });
        if outcome.started {
            self.sink
                .emit(LifecycleEvent::ArenaStarted { arena_id, world_id });
        }
        Ok(outcome)
    }

    /// Removes a player from an arena. The arena keeps running even if it
    /// empties out; ending it is up to the caller.
    ///
    /// # Errors
    /// - [`OrchestratorError::ArenaNotFound`] for an unknown arena
    /// - [`OrchestratorError::Arena`] if the arena has ended, is not in a
    ///   state that allows leaving, or the player isn't a member
    pub fn leave(&self, arena_id: ArenaId, player_id: PlayerId) -> Result<(), OrchestratorError> {
        let handle = self.handle(arena_id)?;
        let mut arena = handle.lock();

        arena.leave(player_id)?;
        self.players.lock().remove(&player_id);

        self.sink.emit(LifecycleEvent::PlayerLeft {
            arena_id,
            world_id: arena.world_id(),
            player_id,
        });
        Ok(())
    }

    /// Starts a waiting arena that has enough players.
    ///
    /// # Errors
    /// - [`OrchestratorError::ArenaNotFound`] for an unknown arena
    /// - [`OrchestratorError::Arena`] if the arena has ended, isn't
    ///   waiting, or is short of players
    pub fn start(&self, arena_id: ArenaId) -> Result<(), OrchestratorError> {
        let handle = self.handle(arena_id)?;
        let mut arena = handle.lock();

        arena.start()?;
        self.sink.emit(LifecycleEvent::ArenaStarted {
            arena_id,
            world_id: arena.world_id(),
        });
        Ok(())
    }

    /// Ends an arena, detaches it from its world, and tears the world down
    /// if that left it empty and its config allows it.
    ///
    /// Returns the players who were still inside, in join order. Emits
    /// `ArenaEnded`, then `WorldRemoved` if the world went away.
    ///
    /// # Errors
    /// - [`OrchestratorError::ArenaNotFound`] for an unknown arena
    /// - [`OrchestratorError::Arena`] with [`ArenaError::ArenaEnded`] if it
    ///   has already ended
    /// - [`OrchestratorError::World`] if the world teardown failed; the
    ///   arena is then left exactly as it was
    pub fn end(&self, arena_id: ArenaId) -> Result<Vec<PlayerId>, OrchestratorError> {
        let handle = self.handle(arena_id)?;
        let mut arena = handle.lock();

        let previous = arena.begin_end()?;
        let world_id = arena.world_id();
        let detached = match self.pool.detach_arena(world_id, arena_id) {
            Ok(detached) => detached,
            Err(err) => {
                arena.abort_end(previous);
                return Err(err.into());
            }
        };
        let departed = arena.finish_end();

        {
            let mut players = self.players.lock();
            for player_id in &departed {
                players.remove(player_id);
            }
        }
        self.arenas.write().shift_remove(&arena_id);

        self.sink
            .emit(LifecycleEvent::ArenaEnded { arena_id, world_id });
        if detached.world_removed {
            self.sink.emit(LifecycleEvent::WorldRemoved { world_id });
        }
        Ok(departed)
    }

    /// Ends every live arena, then tears down every world left empty
    /// (including those configured to survive being empty).
    ///
    /// Everything is attempted; the first failure is returned. Arenas
    /// whose end failed are left live, and so are the worlds hosting them,
    /// so a later [`end`](Self::end) can still finish the job.
    pub fn shutdown(&self) -> Result<(), OrchestratorError> {
        let ids: Vec<ArenaId> = self.arenas.read().keys().copied().collect();
        tracing::info!(arenas = ids.len(), "shutting down");

        let mut first_error = None;
        for arena_id in ids {
            match self.end(arena_id) {
                Ok(_) => {}
                // Ended concurrently.
                Err(OrchestratorError::Arena(ArenaError::ArenaEnded(_))) => {}
                Err(err) => {
                    tracing::error!(%arena_id, error = %err, "failed to end arena at shutdown");
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }

        for result in self.pool.shutdown() {
            match result {
                Ok(world_id) => self.sink.emit(LifecycleEvent::WorldRemoved { world_id }),
                Err(err) => {
                    if first_error.is_none() {
                        first_error = Some(err.into());
                    }
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn arena_info(&self, arena_id: ArenaId) -> Result<ArenaInfo, OrchestratorError> {
        Ok(self.handle(arena_id)?.lock().info())
    }

    /// The arena a player is currently in.
    pub fn arena_of(&self, player_id: PlayerId) -> Option<ArenaId> {
        self.players.lock().get(&player_id).copied()
    }

    /// The spawn a player was assigned when they joined.
    ///
    /// # Errors
    /// [`OrchestratorError::Arena`] with [`ArenaError::NotMember`] if the
    /// player isn't in the arena.
    pub fn spawn_for(
        &self,
        arena_id: ArenaId,
        player_id: PlayerId,
    ) -> Result<Location, OrchestratorError> {
        let handle = self.handle(arena_id)?;
        let arena = handle.lock();
        arena
            .spawn_for(player_id)
            .ok_or(ArenaError::NotMember(player_id, arena_id).into())
    }

    /// Snapshots of every live arena, in creation order.
    pub fn list_arenas(&self) -> Vec<ArenaInfo> {
        let handles: Vec<ArenaHandle> = self.arenas.read().values().cloned().collect();
        handles
            .iter()
            .map(|handle| handle.lock().info())
            .filter(|info| !info.state.is_terminal())
            .collect()
    }

    /// Arenas that are waiting and have a free slot.
    pub fn joinable_arenas(&self) -> Vec<ArenaInfo> {
        self.list_arenas()
            .into_iter()
            .filter(|info| info.state.is_joinable() && info.player_count < info.max_players)
            .collect()
    }

    /// Runs `f` with the arena locked. Use it to read the arena, or its
    /// extension via [`Arena::extension`].
    pub fn with_arena<R>(
        &self,
        arena_id: ArenaId,
        f: impl FnOnce(&Arena) -> R,
    ) -> Result<R, OrchestratorError> {
        let handle = self.handle(arena_id)?;
        let arena = handle.lock();
        Ok(f(&arena))
    }

    /// Runs `f` on the arena's extension if it is a `T`. Returns `None`
    /// if the arena has no extension of that type.
    pub fn with_extension_mut<T: ArenaExtension, R>(
        &self,
        arena_id: ArenaId,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<Option<R>, OrchestratorError> {
        let handle = self.handle(arena_id)?;
        let mut arena = handle.lock();
        Ok(arena.extension_mut::<T>().map(f))
    }

    /// Live arenas.
    pub fn arena_count(&self) -> usize {
        self.arenas.read().len()
    }

    /// World ids in creation order.
    pub fn world_ids(&self) -> Vec<WorldId> {
        self.pool.world_ids()
    }

    pub fn world_count(&self) -> usize {
        self.pool.world_count()
    }

    pub fn world_info(&self, world_id: WorldId) -> Option<WorldInfo> {
        self.pool.world_info(world_id)
    }

    pub fn worlds(&self) -> Vec<WorldInfo> {
        self.pool.worlds()
    }

    fn handle(&self, arena_id: ArenaId) -> Result<ArenaHandle, OrchestratorError> {
        if let Some(handle) = self.arenas.read().get(&arena_id) {
            return Ok(Arc::clone(handle));
        }
        // Ids are published only after insertion into `arenas`.
        if arena_id.0 < self.next_arena.load(Ordering::Relaxed) {
            return Err(ArenaError::ArenaEnded(arena_id).into());
        }
        tracing::warn!(%arena_id, "unknown arena");
        Err(OrchestratorError::ArenaNotFound(arena_id))
    }
}
