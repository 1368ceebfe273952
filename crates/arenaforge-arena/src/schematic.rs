//! Named structure templates and their spawn offsets.
//!
//! The registry never reads template files. Whatever loads the actual
//! structure hands over the spawn offsets, and the registry keeps them
//! keyed by name.

use arenaforge_protocol::RelativeLocation;
use indexmap::IndexMap;
use serde::Serialize;

use crate::SchematicError;

/// A registered template: its name and the spawn offsets inside it.
///
/// Always holds at least one spawn point; the registry refuses to store one
/// that doesn't.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchematicData {
    name: String,
    spawn_points: Vec<RelativeLocation>,
}

impl SchematicData {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Spawn offsets in registration order.
    pub fn spawn_points(&self) -> &[RelativeLocation] {
        &self.spawn_points
    }
}

/// Stores schematics by unique name, remembering registration order.
#[derive(Debug, Default)]
pub struct SchematicRegistry {
    schematics: IndexMap<String, SchematicData>,
}

impl SchematicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new schematic.
    ///
    /// # Errors
    /// - [`SchematicError::Duplicate`] if the name is taken
    /// - [`SchematicError::NoSpawnPoints`] if `spawn_points` is empty
    pub fn register(
        &mut self,
        name: impl Into<String>,
        spawn_points: Vec<RelativeLocation>,
    ) -> Result<(), SchematicError> {
        let name = name.into();
        if self.schematics.contains_key(&name) {
            return Err(SchematicError::Duplicate(name));
        }
        let data = build(name, spawn_points)?;
        tracing::debug!(
            schematic = %data.name,
            spawns = data.spawn_points.len(),
            "schematic registered"
        );
        self.schematics.insert(data.name.clone(), data);
        Ok(())
    }

    /// Registers a schematic, replacing any existing one with the same name.
    ///
    /// Returns the replaced schematic, if there was one. A replaced entry
    /// keeps its original position in [`list`](Self::list).
    ///
    /// # Errors
    /// [`SchematicError::NoSpawnPoints`] if `spawn_points` is empty.
    pub fn register_or_replace(
        &mut self,
        name: impl Into<String>,
        spawn_points: Vec<RelativeLocation>,
    ) -> Result<Option<SchematicData>, SchematicError> {
        let data = build(name.into(), spawn_points)?;
        Ok(self.schematics.insert(data.name.clone(), data))
    }

    /// Appends a spawn point to an existing schematic.
    ///
    /// # Errors
    /// [`SchematicError::Unknown`] if no schematic has this name.
    pub fn add_spawn_point(
        &mut self,
        name: &str,
        location: RelativeLocation,
    ) -> Result<(), SchematicError> {
        let data = self
            .schematics
            .get_mut(name)
            .ok_or_else(|| SchematicError::Unknown(name.to_string()))?;
        data.spawn_points.push(location);
        Ok(())
    }

    /// Looks up a schematic by name.
    ///
    /// # Errors
    /// [`SchematicError::Unknown`] if no schematic has this name.
    pub fn resolve(&self, name: &str) -> Result<&SchematicData, SchematicError> {
        self.schematics
            .get(name)
            .ok_or_else(|| SchematicError::Unknown(name.to_string()))
    }

    /// Removes a schematic. Arenas already built from it keep their
    /// resolved spawns.
    ///
    /// # Errors
    /// [`SchematicError::Unknown`] if no schematic has this name.
    pub fn remove(&mut self, name: &str) -> Result<SchematicData, SchematicError> {
        self.schematics
            .shift_remove(name)
            .ok_or_else(|| SchematicError::Unknown(name.to_string()))
    }

    /// Registered names in registration order.
    pub fn list(&self) -> Vec<String> {
        self.schematics.keys().cloned().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schematics.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.schematics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schematics.is_empty()
    }
}

fn build(
    name: String,
    spawn_points: Vec<RelativeLocation>,
) -> Result<SchematicData, SchematicError> {
    if spawn_points.is_empty() {
        return Err(SchematicError::NoSpawnPoints(name));
    }
    Ok(SchematicData { name, spawn_points })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn(x: f64, y: f64, z: f64) -> RelativeLocation {
        RelativeLocation::new(x, y, z)
    }

    #[test]
    fn test_register_then_resolve() {
        let mut registry = SchematicRegistry::new();
        registry.register("arena_a", vec![spawn(0.0, 64.0, 0.0)]).unwrap();

        let data = registry.resolve("arena_a").unwrap();
        assert_eq!(data.name(), "arena_a");
        assert_eq!(data.spawn_points(), &[spawn(0.0, 64.0, 0.0)]);
    }

    #[test]
    fn test_register_duplicate_returns_error() {
        let mut registry = SchematicRegistry::new();
        registry.register("arena_a", vec![spawn(0.0, 64.0, 0.0)]).unwrap();

        let result = registry.register("arena_a", vec![spawn(1.0, 64.0, 1.0)]);

        assert!(matches!(result, Err(SchematicError::Duplicate(n)) if n == "arena_a"));
        // The original is untouched.
        assert_eq!(registry.resolve("arena_a").unwrap().spawn_points().len(), 1);
        assert_eq!(registry.resolve("arena_a").unwrap().spawn_points()[0].x, 0.0);
    }

    #[test]
    fn test_register_without_spawns_returns_error() {
        let mut registry = SchematicRegistry::new();
        let result = registry.register("empty", Vec::new());
        assert!(matches!(result, Err(SchematicError::NoSpawnPoints(_))));
        assert!(!registry.contains("empty"));
    }

    #[test]
    fn test_register_or_replace_overwrites() {
        let mut registry = SchematicRegistry::new();
        registry.register("arena_a", vec![spawn(0.0, 64.0, 0.0)]).unwrap();
        registry.register("arena_b", vec![spawn(0.0, 64.0, 0.0)]).unwrap();

        let old = registry
            .register_or_replace("arena_a", vec![spawn(5.0, 70.0, 5.0)])
            .unwrap();

        assert!(old.is_some());
        assert_eq!(registry.resolve("arena_a").unwrap().spawn_points()[0].x, 5.0);
        assert_eq!(registry.list(), vec!["arena_a", "arena_b"]);
    }

    #[test]
    fn test_add_spawn_point_appends() {
        let mut registry = SchematicRegistry::new();
        registry.register("arena_a", vec![spawn(0.0, 64.0, 0.0)]).unwrap();

        registry.add_spawn_point("arena_a", spawn(10.0, 64.0, 0.0)).unwrap();

        let spawns = registry.resolve("arena_a").unwrap().spawn_points();
        assert_eq!(spawns.len(), 2);
        assert_eq!(spawns[1].x, 10.0);
    }

    #[test]
    fn test_add_spawn_point_unknown_returns_error() {
        let mut registry = SchematicRegistry::new();
        let result = registry.add_spawn_point("nope", spawn(0.0, 0.0, 0.0));
        assert!(matches!(result, Err(SchematicError::Unknown(n)) if n == "nope"));
    }

    #[test]
    fn test_resolve_unknown_returns_error() {
        let registry = SchematicRegistry::new();
        assert!(matches!(registry.resolve("nope"), Err(SchematicError::Unknown(_))));
    }

    #[test]
    fn test_list_preserves_registration_order() {
        let mut registry = SchematicRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry.register(name, vec![spawn(0.0, 0.0, 0.0)]).unwrap();
        }
        assert_eq!(registry.list(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_remove() {
        let mut registry = SchematicRegistry::new();
        registry.register("a", vec![spawn(0.0, 0.0, 0.0)]).unwrap();
        registry.register("b", vec![spawn(0.0, 0.0, 0.0)]).unwrap();

        registry.remove("a").unwrap();

        assert_eq!(registry.list(), vec!["b"]);
        assert!(matches!(registry.remove("a"), Err(SchematicError::Unknown(_))));
    }
}
