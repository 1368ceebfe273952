//! Arena configuration and state machine.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

// ---------------------------------------------------------------------------
// ArenaConfig
// ---------------------------------------------------------------------------

/// Configuration governing an arena and the world it is placed in.
///
/// This is a plain immutable value. Per-arena settings are produced by
/// [`merge`](Self::merge)-ing an [`ArenaConfigOverrides`] on top of the
/// global default; the default itself is never touched.
///
/// Missing fields take their defaults when deserialized, so a settings file
/// only has to mention what it changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArenaConfig {
    /// Maximum number of arenas a single world may host.
    pub max_arenas_per_world: usize,

    /// Minimum distance between the origins of any two arenas sharing a
    /// world.
    pub min_distance_between_arenas: f64,

    /// Tear the world down once its last arena has ended.
    pub remove_world_when_empty: bool,

    /// Start the arena as soon as `min_players_to_start` players have
    /// joined.
    pub auto_start_arenas: bool,

    /// Minimum players required to start.
    pub min_players_to_start: usize,

    /// Maximum players allowed in one arena.
    pub max_players_per_arena: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            max_arenas_per_world: 10,
            min_distance_between_arenas: 100.0,
            remove_world_when_empty: true,
            auto_start_arenas: false,
            min_players_to_start: 2,
            max_players_per_arena: 10,
        }
    }
}

impl ArenaConfig {
    /// Returns `self` if every field is in range.
    ///
    /// # Errors
    /// [`ConfigError::Invalid`] when the distance is negative or not finite,
    /// when either capacity is zero, or when `min_players_to_start` exceeds
    /// `max_players_per_arena`.
    pub fn validated(self) -> Result<Self, ConfigError> {
        if !self.min_distance_between_arenas.is_finite()
            || self.min_distance_between_arenas < 0.0
        {
            return Err(ConfigError::Invalid(format!(
                "min_distance_between_arenas must be a non-negative number, got {}",
                self.min_distance_between_arenas
            )));
        }
        if self.max_arenas_per_world == 0 {
            return Err(ConfigError::Invalid(
                "max_arenas_per_world must be at least 1".into(),
            ));
        }
        if self.max_players_per_arena == 0 {
            return Err(ConfigError::Invalid(
                "max_players_per_arena must be at least 1".into(),
            ));
        }
        if self.min_players_to_start > self.max_players_per_arena {
            return Err(ConfigError::Invalid(format!(
                "min_players_to_start ({}) exceeds max_players_per_arena ({})",
                self.min_players_to_start, self.max_players_per_arena
            )));
        }
        Ok(self)
    }

    /// Produces the effective config for one arena: every field set in
    /// `overrides` wins, everything else is inherited from `self`.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] if the merged result fails
    /// [`validated`](Self::validated).
    pub fn merge(
        &self,
        overrides: &ArenaConfigOverrides,
    ) -> Result<ArenaConfig, ConfigError> {
        ArenaConfig {
            max_arenas_per_world: overrides
                .max_arenas_per_world
                .unwrap_or(self.max_arenas_per_world),
            min_distance_between_arenas: overrides
                .min_distance_between_arenas
                .unwrap_or(self.min_distance_between_arenas),
            remove_world_when_empty: overrides
                .remove_world_when_empty
                .unwrap_or(self.remove_world_when_empty),
            auto_start_arenas: overrides
                .auto_start_arenas
                .unwrap_or(self.auto_start_arenas),
            min_players_to_start: overrides
                .min_players_to_start
                .unwrap_or(self.min_players_to_start),
            max_players_per_arena: overrides
                .max_players_per_arena
                .unwrap_or(self.max_players_per_arena),
        }
        .validated()
    }
}

// ---------------------------------------------------------------------------
// ArenaConfigOverrides
// ---------------------------------------------------------------------------

/// Explicitly-set fields for one arena. `None` means "inherit".
///
/// The `with_*` methods consume and return a new value, so they chain:
///
/// ```rust
/// use arenaforge_arena::{ArenaConfig, ArenaConfigOverrides};
///
/// let overrides = ArenaConfigOverrides::default()
///     .with_auto_start_arenas(true)
///     .with_max_players_per_arena(4);
/// let config = ArenaConfig::default().merge(&overrides).unwrap();
/// assert!(config.auto_start_arenas);
/// assert_eq!(config.max_players_per_arena, 4);
/// assert_eq!(config.min_players_to_start, 2);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArenaConfigOverrides {
    pub max_arenas_per_world: Option<usize>,
    pub min_distance_between_arenas: Option<f64>,
    pub remove_world_when_empty: Option<bool>,
    pub auto_start_arenas: Option<bool>,
    pub min_players_to_start: Option<usize>,
    pub max_players_per_arena: Option<usize>,
}

impl ArenaConfigOverrides {
    pub fn with_max_arenas_per_world(self, value: usize) -> Self {
        Self {
            max_arenas_per_world: Some(value),
            ..self
        }
    }

    pub fn with_min_distance_between_arenas(self, value: f64) -> Self {
        Self {
            min_distance_between_arenas: Some(value),
            ..self
        }
    }

    pub fn with_remove_world_when_empty(self, value: bool) -> Self {
        Self {
            remove_world_when_empty: Some(value),
            ..self
        }
    }

    pub fn with_auto_start_arenas(self, value: bool) -> Self {
        Self {
            auto_start_arenas: Some(value),
            ..self
        }
    }

    pub fn with_min_players_to_start(self, value: usize) -> Self {
        Self {
            min_players_to_start: Some(value),
            ..self
        }
    }

    pub fn with_max_players_per_arena(self, value: usize) -> Self {
        Self {
            max_players_per_arena: Some(value),
            ..self
        }
    }

    /// Stacks `top` over `self`: fields set in `top` win.
    pub fn layer(&self, top: &ArenaConfigOverrides) -> ArenaConfigOverrides {
        ArenaConfigOverrides {
            max_arenas_per_world: top.max_arenas_per_world.or(self.max_arenas_per_world),
            min_distance_between_arenas: top
                .min_distance_between_arenas
                .or(self.min_distance_between_arenas),
            remove_world_when_empty: top
                .remove_world_when_empty
                .or(self.remove_world_when_empty),
            auto_start_arenas: top.auto_start_arenas.or(self.auto_start_arenas),
            min_players_to_start: top.min_players_to_start.or(self.min_players_to_start),
            max_players_per_arena: top
                .max_players_per_arena
                .or(self.max_players_per_arena),
        }
    }

    /// Returns `true` if no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ---------------------------------------------------------------------------
// ArenaState
// ---------------------------------------------------------------------------

/// The lifecycle state of an arena.
///
/// Transitions only move forward:
///
/// ```text
/// Created → Waiting → Starting → Running → Ending → Ended
///              │          │                  ↑
///              └──────────┴──────────────────┘  (end from any live state)
/// ```
///
/// - **Created**: Placed in a world, not yet accepting players.
/// - **Waiting**: Accepting joins.
/// - **Starting**: Start threshold reached, transition in progress.
/// - **Running**: Session is active.
/// - **Ending**: Being detached from its world.
/// - **Ended**: Terminal. The arena no longer occupies its world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArenaState {
    Created,
    Waiting,
    Starting,
    Running,
    Ending,
    Ended,
}

impl ArenaState {
    /// Returns `true` if the arena is accepting new players.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Returns `true` if members may leave in this state.
    pub fn allows_leave(&self) -> bool {
        matches!(self, Self::Waiting | Self::Running)
    }

    /// Returns `true` for the terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ended)
    }

    /// The next state along the normal path, or `None` from `Ended`.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Created => Some(Self::Waiting),
            Self::Waiting => Some(Self::Starting),
            Self::Starting => Some(Self::Running),
            Self::Running => Some(Self::Ending),
            Self::Ending => Some(Self::Ended),
            Self::Ended => None,
        }
    }

    /// Returns `true` if moving to `target` is a legal transition.
    ///
    /// Besides the normal path, any live state may jump to `Ending`.
    pub fn can_transition_to(self, target: Self) -> bool {
        if target == Self::Ending {
            return !matches!(self, Self::Ending | Self::Ended);
        }
        self.next() == Some(target)
    }
}

impl std::fmt::Display for ArenaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "Created"),
            Self::Waiting => write!(f, "Waiting"),
            Self::Starting => write!(f, "Starting"),
            Self::Running => write!(f, "Running"),
            Self::Ending => write!(f, "Ending"),
            Self::Ended => write!(f, "Ended"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_config_default() {
        let config = ArenaConfig::default();
        assert_eq!(config.max_arenas_per_world, 10);
        assert_eq!(config.min_distance_between_arenas, 100.0);
        assert!(config.remove_world_when_empty);
        assert!(!config.auto_start_arenas);
        assert_eq!(config.min_players_to_start, 2);
        assert_eq!(config.max_players_per_arena, 10);
        assert!(config.validated().is_ok());
    }

    #[test]
    fn test_merge_override_wins_and_unset_inherits() {
        let base = ArenaConfig {
            min_distance_between_arenas: 250.0,
            ..ArenaConfig::default()
        };
        let overrides = ArenaConfigOverrides::default().with_max_players_per_arena(4);

        let merged = base.merge(&overrides).unwrap();

        assert_eq!(merged.max_players_per_arena, 4);
        assert_eq!(merged.min_distance_between_arenas, 250.0);
        // The base is a value; merging never changes it.
        assert_eq!(base.max_players_per_arena, 10);
    }

    #[test]
    fn test_merge_rejects_min_above_max() {
        let overrides = ArenaConfigOverrides::default()
            .with_min_players_to_start(5)
            .with_max_players_per_arena(4);
        let result = ArenaConfig::default().merge(&overrides);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validated_rejects_negative_distance() {
        let config = ArenaConfig {
            min_distance_between_arenas: -1.0,
            ..ArenaConfig::default()
        };
        assert!(config.validated().is_err());
    }

    #[test]
    fn test_validated_rejects_nan_distance() {
        let config = ArenaConfig {
            min_distance_between_arenas: f64::NAN,
            ..ArenaConfig::default()
        };
        assert!(config.validated().is_err());
    }

    #[test]
    fn test_validated_rejects_zero_capacities() {
        let no_arenas = ArenaConfig {
            max_arenas_per_world: 0,
            ..ArenaConfig::default()
        };
        assert!(no_arenas.validated().is_err());

        let no_players = ArenaConfig {
            max_players_per_arena: 0,
            min_players_to_start: 0,
            ..ArenaConfig::default()
        };
        assert!(no_players.validated().is_err());
    }

    #[test]
    fn test_layer_top_wins() {
        let bottom = ArenaConfigOverrides::default()
            .with_auto_start_arenas(true)
            .with_max_players_per_arena(6);
        let top = ArenaConfigOverrides::default().with_max_players_per_arena(3);

        let layered = bottom.layer(&top);

        assert_eq!(layered.auto_start_arenas, Some(true));
        assert_eq!(layered.max_players_per_arena, Some(3));
        assert_eq!(layered.min_players_to_start, None);
    }

    #[test]
    fn test_overrides_is_empty() {
        assert!(ArenaConfigOverrides::default().is_empty());
        assert!(!ArenaConfigOverrides::default()
            .with_remove_world_when_empty(false)
            .is_empty());
    }

    #[test]
    fn test_config_deserializes_partial_json() {
        let config: ArenaConfig =
            serde_json::from_str(r#"{"max_players_per_arena": 16}"#).unwrap();
        assert_eq!(config.max_players_per_arena, 16);
        assert_eq!(config.max_arenas_per_world, 10);
    }

    #[test]
    fn test_config_rejects_unknown_fields() {
        let result: Result<ArenaConfig, _> =
            serde_json::from_str(r#"{"max_player": 16}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_arena_state_next_follows_strict_order() {
        assert_eq!(ArenaState::Created.next(), Some(ArenaState::Waiting));
        assert_eq!(ArenaState::Waiting.next(), Some(ArenaState::Starting));
        assert_eq!(ArenaState::Starting.next(), Some(ArenaState::Running));
        assert_eq!(ArenaState::Running.next(), Some(ArenaState::Ending));
        assert_eq!(ArenaState::Ending.next(), Some(ArenaState::Ended));
        assert_eq!(ArenaState::Ended.next(), None);
    }

    #[test]
    fn test_arena_state_can_transition_to() {
        assert!(ArenaState::Waiting.can_transition_to(ArenaState::Starting));
        assert!(ArenaState::Waiting.can_transition_to(ArenaState::Ending));
        assert!(ArenaState::Created.can_transition_to(ArenaState::Ending));
        assert!(!ArenaState::Waiting.can_transition_to(ArenaState::Running));
        assert!(!ArenaState::Running.can_transition_to(ArenaState::Waiting));
        assert!(!ArenaState::Ending.can_transition_to(ArenaState::Ending));
        assert!(!ArenaState::Ended.can_transition_to(ArenaState::Ending));
    }

    #[test]
    fn test_arena_state_predicates() {
        assert!(ArenaState::Waiting.is_joinable());
        assert!(!ArenaState::Running.is_joinable());
        assert!(ArenaState::Running.allows_leave());
        assert!(!ArenaState::Starting.allows_leave());
        assert!(ArenaState::Ended.is_terminal());
        assert!(!ArenaState::Ending.is_terminal());
    }

    #[test]
    fn test_arena_state_display() {
        assert_eq!(ArenaState::Waiting.to_string(), "Waiting");
        assert_eq!(ArenaState::Ended.to_string(), "Ended");
    }
}
