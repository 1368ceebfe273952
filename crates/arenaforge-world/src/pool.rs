//! World pool: owns every world, finds room for new arenas, and reclaims
//! worlds that empty out.
//!
//! # Concurrency note
//!
//! All pool state sits behind one mutex, held for the whole of a
//! placement (search, provisioning, insert) and the whole of a teardown
//! (emptiness check, backend destroy, removal). That is what keeps two
//! placements from breaking the separation invariant in the same world,
//! keeps two provisioning calls from racing, and keeps a teardown from
//! removing a world a placement is about to use.
//!
//! The pool never locks an arena. Callers may hold an arena lock while
//! calling into the pool, never the other way around.

use std::sync::Arc;

use arenaforge_arena::{Arena, ArenaConfig, ConfigError};
use arenaforge_protocol::{ArenaId, Location, WorldId};
use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::placement::spiral;
use crate::{
    ArenaHandle, ArenaSlot, ArenaWorld, ContainerBackend, PlacementConfig, WorldError, WorldInfo,
};

/// Where a new arena ended up.
#[derive(Debug, Clone)]
pub struct Placement {
    pub world_id: WorldId,
    pub origin: Location,
    /// Name of the world provisioned for this arena, if a new one was
    /// needed.
    pub created_world: Option<String>,
    /// The arena, already registered in its world.
    pub arena: ArenaHandle,
}

/// The spot the pool picked, as seen by the arena builder.
#[derive(Debug, Clone, Copy)]
pub struct Site<'a> {
    pub world_id: WorldId,
    pub origin: Location,
    /// Name of the world, if it was provisioned for this arena.
    pub created_world: Option<&'a str>,
}

/// Result of taking an arena out of its world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detached {
    /// `true` if the world was torn down because it became empty.
    pub world_removed: bool,
}

/// The set of worlds, in creation order.
pub struct WorldPool<B: ContainerBackend> {
    backend: B,
    config: PlacementConfig,
    inner: Mutex<PoolInner<B::Handle>>,
}

struct PoolInner<H> {
    worlds: IndexMap<WorldId, ArenaWorld<H>>,
    /// Index of the next world to provision. Only advances on success so
    /// names stay gapless.
    next_index: u64,
}

impl<B: ContainerBackend> WorldPool<B> {
    /// Creates an empty pool with default placement settings.
    pub fn new(backend: B) -> Self {
        Self::build(backend, PlacementConfig::default())
    }

    /// Creates an empty pool with custom placement settings.
    ///
    /// # Errors
    /// [`ConfigError::Invalid`] if `config` fails validation.
    pub fn with_config(backend: B, config: PlacementConfig) -> Result<Self, ConfigError> {
        Ok(Self::build(backend, config.validated()?))
    }

    fn build(backend: B, config: PlacementConfig) -> Self {
        Self {
            backend,
            config,
            inner: Mutex::new(PoolInner {
                worlds: IndexMap::new(),
                next_index: 1,
            }),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Placement
    // -----------------------------------------------------------------------

    /// Finds a world and origin for a new arena, builds the arena there, and
    /// registers it.
    ///
    /// Worlds are tried oldest first. In each, a bounded spiral search looks
    /// for an origin far enough from every existing arena. If no world has
    /// room, a new one is provisioned and the arena goes at the anchor.
    ///
    /// `build` receives the chosen [`Site`] and must return the arena to
    /// register. It runs under the pool lock, before any other placement
    /// can see the world, and must not call back into the pool.
    ///
    /// # Errors
    /// [`WorldError::PlacementExhausted`] if a new world was needed and the
    /// backend failed to create it. Nothing is registered in that case.
    pub fn place_arena(
        &self,
        request: &ArenaConfig,
        build: impl FnOnce(&Site<'_>) -> Arena,
    ) -> Result<Placement, WorldError> {
        let mut inner = self.inner.lock();

        let found = inner
            .worlds
            .values()
            .find_map(|world| self.search(world, request).map(|origin| (world.id(), origin)));

        let (world_id, origin, created_world) = match found {
            Some((world_id, origin)) => (world_id, origin, None),
            None => {
                let (world_id, name) = self.provision(&mut inner, request)?;
                (world_id, self.config.anchor, Some(name))
            }
        };

        let world = inner
            .worlds
            .get_mut(&world_id)
            .ok_or(WorldError::NotFound(world_id))?;
        let built = build(&Site {
            world_id,
            origin,
            created_world: created_world.as_deref(),
        });
        let arena_id = built.id();
        let arena: ArenaHandle = Arc::new(Mutex::new(built));
        world.insert(
            arena_id,
            ArenaSlot {
                origin,
                arena: Arc::clone(&arena),
            },
        );

        tracing::info!(
            %arena_id,
            %world_id,
            %origin,
            arenas = world.arena_count(),
            "arena placed"
        );

        Ok(Placement {
            world_id,
            origin,
            created_world,
            arena,
        })
    }

    /// Bounded origin search inside one world.
    fn search(&self, world: &ArenaWorld<B::Handle>, request: &ArenaConfig) -> Option<Location> {
        if !world.has_capacity_for(request) {
            return None;
        }
        let separation = world.separation_for(request);
        let found = spiral(self.config.anchor, separation.max(1.0))
            .take(self.config.max_attempts)
            .find(|candidate| world.is_clear(candidate, separation, self.config.metric));
        if found.is_none() {
            tracing::debug!(
                world_id = %world.id(),
                attempts = self.config.max_attempts,
                "no free origin within attempt budget"
            );
        }
        found
    }

    fn provision(
        &self,
        inner: &mut PoolInner<B::Handle>,
        request: &ArenaConfig,
    ) -> Result<(WorldId, String), WorldError> {
        let index = inner.next_index;
        let name = format!("{}{}", self.config.world_name_prefix, index);

        let handle = match self.backend.create_container(&name) {
            Ok(handle) => handle,
            Err(source) => {
                tracing::error!(world = %name, error = %source, "container creation failed");
                return Err(WorldError::PlacementExhausted { name, source });
            }
        };

        inner.next_index += 1;
        let world_id = WorldId(index);
        inner
            .worlds
            .insert(world_id, ArenaWorld::new(world_id, name.clone(), *request, handle));
        tracing::info!(%world_id, world = %name, "world created");
        Ok((world_id, name))
    }

    // -----------------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------------

    /// Removes an arena from its world and, if that leaves the world empty
    /// and its config allows it, tears the world down.
    ///
    /// Both steps happen under one lock. If the teardown fails the arena is
    /// put back, so the pool is left exactly as it was.
    ///
    /// # Errors
    /// - [`WorldError::NotFound`] if the world doesn't exist
    /// - [`WorldError::ArenaNotInWorld`] if the arena isn't in it
    /// - [`WorldError::ContainerBackend`] if the teardown failed
    pub fn detach_arena(
        &self,
        world_id: WorldId,
        arena_id: ArenaId,
    ) -> Result<Detached, WorldError> {
        let mut inner = self.inner.lock();
        let world = inner
            .worlds
            .get_mut(&world_id)
            .ok_or(WorldError::NotFound(world_id))?;
        let slot = world
            .remove(arena_id)
            .ok_or(WorldError::ArenaNotInWorld(arena_id, world_id))?;

        match self.destroy_if_empty_locked(&mut inner, world_id) {
            Ok(world_removed) => {
                tracing::debug!(%arena_id, %world_id, world_removed, "arena detached");
                Ok(Detached { world_removed })
            }
            Err(err) => {
                if let Some(world) = inner.worlds.get_mut(&world_id) {
                    world.insert(arena_id, slot);
                }
                Err(err)
            }
        }
    }

    /// Tears a world down if it has no arenas and its config says empty
    /// worlds should go. Returns `true` if it was removed.
    ///
    /// # Errors
    /// - [`WorldError::NotFound`] if the world doesn't exist
    /// - [`WorldError::ContainerBackend`] if the teardown failed
    pub fn destroy_if_empty(&self, world_id: WorldId) -> Result<bool, WorldError> {
        let mut inner = self.inner.lock();
        self.destroy_if_empty_locked(&mut inner, world_id)
    }

    fn destroy_if_empty_locked(
        &self,
        inner: &mut PoolInner<B::Handle>,
        world_id: WorldId,
    ) -> Result<bool, WorldError> {
        let world = inner
            .worlds
            .get(&world_id)
            .ok_or(WorldError::NotFound(world_id))?;
        if !world.is_empty() || !world.config().remove_world_when_empty {
            return Ok(false);
        }

        if let Err(source) = self.backend.destroy_container(world.handle()) {
            tracing::error!(%world_id, error = %source, "container teardown failed");
            return Err(WorldError::ContainerBackend { world_id, source });
        }
        inner.worlds.shift_remove(&world_id);
        tracing::info!(%world_id, "world removed");
        Ok(true)
    }

    /// Tears down every world that no longer hosts arenas, including those
    /// configured to survive being empty.
    ///
    /// Each world is attempted once; the result for each is returned in
    /// creation order. Worlds that still hold arenas are left alone and
    /// reported as [`WorldError::Occupied`]. Worlds whose teardown failed
    /// stay in the pool.
    pub fn shutdown(&self) -> Vec<Result<WorldId, WorldError>> {
        let mut inner = self.inner.lock();
        let ids: Vec<WorldId> = inner.worlds.keys().copied().collect();
        let mut results = Vec::with_capacity(ids.len());

        for world_id in ids {
            let Some(world) = inner.worlds.get(&world_id) else {
                continue;
            };
            if !world.is_empty() {
                let arenas = world.arena_count();
                tracing::warn!(%world_id, arenas, "world still occupied at shutdown");
                results.push(Err(WorldError::Occupied { world_id, arenas }));
                continue;
            }
            match self.backend.destroy_container(world.handle()) {
                Ok(()) => {
                    inner.worlds.shift_remove(&world_id);
                    tracing::info!(%world_id, "world removed at shutdown");
                    results.push(Ok(world_id));
                }
                Err(source) => {
                    tracing::error!(%world_id, error = %source, "container teardown failed at shutdown");
                    results.push(Err(WorldError::ContainerBackend { world_id, source }));
                }
            }
        }
        results
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// World ids in creation order.
    pub fn world_ids(&self) -> Vec<WorldId> {
        self.inner.lock().worlds.keys().copied().collect()
    }

    pub fn world_count(&self) -> usize {
        self.inner.lock().worlds.len()
    }

    pub fn world_info(&self, world_id: WorldId) -> Option<WorldInfo> {
        self.inner.lock().worlds.get(&world_id).map(ArenaWorld::info)
    }

    /// Snapshots of every world, in creation order.
    pub fn worlds(&self) -> Vec<WorldInfo> {
        self.inner.lock().worlds.values().map(ArenaWorld::info).collect()
    }

    /// Origins of the arenas currently in a world.
    pub fn arena_origins(&self, world_id: WorldId) -> Option<Vec<(ArenaId, Location)>> {
        let inner = self.inner.lock();
        let world = inner.worlds.get(&world_id)?;
        let mut origins: Vec<_> = world.origins().collect();
        origins.sort_by_key(|(id, _)| *id);
        Some(origins)
    }

    /// The handle of an arena registered in a world.
    pub fn arena(&self, world_id: WorldId, arena_id: ArenaId) -> Option<ArenaHandle> {
        self.inner
            .lock()
            .worlds
            .get(&world_id)?
            .arena(arena_id)
            .cloned()
    }
}
