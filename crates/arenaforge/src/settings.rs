//! Orchestrator settings.

use arenaforge_arena::{ArenaConfig, ConfigError};
use arenaforge_protocol::{Codec, JsonCodec};
use arenaforge_world::PlacementConfig;
use serde::{Deserialize, Serialize};

use crate::OrchestratorError;

/// Everything an [`Orchestrator`](crate::Orchestrator) is configured with.
///
/// Deserializes from a document where every section and field is
/// optional:
///
/// ```json
/// {
///   "defaults": { "max_arenas_per_world": 4, "auto_start_arenas": true },
///   "placement": { "world_name_prefix": "pvp_", "metric": "horizontal" }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrchestratorConfig {
    /// Global arena defaults. Per-arena overrides are merged on top.
    pub defaults: ArenaConfig,
    pub placement: PlacementConfig,
}

impl OrchestratorConfig {
    /// Parses and validates a JSON settings document.
    ///
    /// # Errors
    /// - [`OrchestratorError::Protocol`] if the document is malformed or
    ///   names an unknown field
    /// - [`OrchestratorError::Config`] if a value is out of range
    pub fn from_json_str(json: &str) -> Result<Self, OrchestratorError> {
        let config: Self = JsonCodec.decode(json.as_bytes())?;
        Ok(config.validated()?)
    }

    /// Returns `self` if both sections are valid.
    ///
    /// # Errors
    /// [`ConfigError::Invalid`] naming the first offending field.
    pub fn validated(self) -> Result<Self, ConfigError> {
        Ok(Self {
            defaults: self.defaults.validated()?,
            placement: self.placement.validated()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use arenaforge_world::DistanceMetric;

    use super::*;

    #[test]
    fn test_from_json_str_partial_document() {
        let json = r#"{
            "defaults": { "max_arenas_per_world": 4, "auto_start_arenas": true },
            "placement": { "world_name_prefix": "pvp_", "metric": "horizontal" }
        }"#;
        let config = OrchestratorConfig::from_json_str(json).unwrap();

        assert_eq!(config.defaults.max_arenas_per_world, 4);
        assert!(config.defaults.auto_start_arenas);
        assert_eq!(config.defaults.min_distance_between_arenas, 100.0);
        assert_eq!(config.placement.world_name_prefix, "pvp_");
        assert_eq!(config.placement.metric, DistanceMetric::Horizontal);
        assert_eq!(config.placement.max_attempts, 256);
    }

    #[test]
    fn test_from_json_str_empty_document_is_default() {
        let config = OrchestratorConfig::from_json_str("{}").unwrap();
        assert_eq!(config, OrchestratorConfig::default());
    }

    #[test]
    fn test_from_json_str_rejects_unknown_field() {
        let err = OrchestratorConfig::from_json_str(r#"{ "defaults": { "max_arena": 3 } }"#)
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::Protocol(_)));
    }

    #[test]
    fn test_from_json_str_rejects_invalid_value() {
        let err = OrchestratorConfig::from_json_str(
            r#"{ "defaults": { "min_players_to_start": 5, "max_players_per_arena": 2 } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, OrchestratorError::Config(_)));
    }
}
