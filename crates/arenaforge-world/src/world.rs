//! One spatial container and the arenas placed in it.

use std::collections::HashMap;
use std::sync::Arc;

use arenaforge_arena::{Arena, ArenaConfig};
use arenaforge_protocol::{ArenaId, Location, WorldId};
use parking_lot::Mutex;

use crate::DistanceMetric;

/// Shared, lockable handle to a live arena.
pub type ArenaHandle = Arc<Mutex<Arena>>;

/// An arena's entry in its world.
///
/// The origin is copied out of the arena so placement can check
/// separation without locking any arena.
#[derive(Debug, Clone)]
pub struct ArenaSlot {
    pub origin: Location,
    pub arena: ArenaHandle,
}

/// A snapshot of world metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldInfo {
    pub world_id: WorldId,
    pub name: String,
    pub arena_count: usize,
    pub max_arenas: usize,
    pub remove_when_empty: bool,
}

/// A container hosting zero or more arenas.
///
/// Governed by the config of the arena that caused it to be created.
#[derive(Debug)]
pub struct ArenaWorld<H> {
    id: WorldId,
    name: String,
    config: ArenaConfig,
    handle: H,
    arenas: HashMap<ArenaId, ArenaSlot>,
}

impl<H> ArenaWorld<H> {
    pub(crate) fn new(id: WorldId, name: String, config: ArenaConfig, handle: H) -> Self {
        Self {
            id,
            name,
            config,
            handle,
            arenas: HashMap::new(),
        }
    }

    pub fn id(&self) -> WorldId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    pub fn arena_count(&self) -> usize {
        self.arenas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arenas.is_empty()
    }

    pub fn arena(&self, arena_id: ArenaId) -> Option<&ArenaHandle> {
        self.arenas.get(&arena_id).map(|slot| &slot.arena)
    }

    /// Origins of every arena in the world, keyed by arena.
    pub fn origins(&self) -> impl Iterator<Item = (ArenaId, Location)> + '_ {
        self.arenas.iter().map(|(id, slot)| (*id, slot.origin))
    }

    /// Room for one more arena under both this world's limit and the
    /// requester's.
    pub fn has_capacity_for(&self, request: &ArenaConfig) -> bool {
        let count = self.arenas.len();
        count < self.config.max_arenas_per_world && count < request.max_arenas_per_world
    }

    /// Separation a new arena must keep in this world: the stricter of the
    /// world's and the requester's.
    pub fn separation_for(&self, request: &ArenaConfig) -> f64 {
        self.config
            .min_distance_between_arenas
            .max(request.min_distance_between_arenas)
    }

    /// `true` if `candidate` is at least `separation` from every origin.
    pub fn is_clear(&self, candidate: &Location, separation: f64, metric: DistanceMetric) -> bool {
        self.arenas
            .values()
            .all(|slot| metric.distance(candidate, &slot.origin) >= separation)
    }

    pub fn info(&self) -> WorldInfo {
        WorldInfo {
            world_id: self.id,
            name: self.name.clone(),
            arena_count: self.arenas.len(),
            max_arenas: self.config.max_arenas_per_world,
            remove_when_empty: self.config.remove_world_when_empty,
        }
    }

    pub(crate) fn insert(&mut self, arena_id: ArenaId, slot: ArenaSlot) {
        self.arenas.insert(arena_id, slot);
    }

    pub(crate) fn remove(&mut self, arena_id: ArenaId) -> Option<ArenaSlot> {
        self.arenas.remove(&arena_id)
    }
}
