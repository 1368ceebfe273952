//! Placement search settings and the origin probe sequence.

use arenaforge_arena::ConfigError;
use arenaforge_protocol::Location;
use serde::{Deserialize, Serialize};

/// How distance between two arena origins is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Straight-line distance in all three axes.
    #[default]
    Euclidean,
    /// Distance in the (x, z) plane; height is ignored.
    Horizontal,
}

impl DistanceMetric {
    pub fn distance(self, a: &Location, b: &Location) -> f64 {
        match self {
            Self::Euclidean => a.distance(b),
            Self::Horizontal => a.horizontal_distance(b),
        }
    }
}

/// Settings for the world pool's placement search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlacementConfig {
    /// Candidate origins tried per world before moving on to the next
    /// world (or provisioning a new one).
    pub max_attempts: usize,

    /// Center of the search in every world. The first arena in a new
    /// world is always placed here.
    pub anchor: Location,

    /// Container names are this prefix followed by a sequential index.
    pub world_name_prefix: String,

    pub metric: DistanceMetric,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            max_attempts: 256,
            anchor: Location::default(),
            world_name_prefix: "arena_world_".to_string(),
            metric: DistanceMetric::default(),
        }
    }
}

impl PlacementConfig {
    /// Returns `self` if the settings can drive a search.
    ///
    /// # Errors
    /// [`ConfigError::Invalid`] for zero attempts, an empty name prefix, or
    /// a non-finite anchor.
    pub fn validated(self) -> Result<Self, ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_attempts must be at least 1".into(),
            ));
        }
        if self.world_name_prefix.is_empty() {
            return Err(ConfigError::Invalid(
                "world_name_prefix must not be empty".into(),
            ));
        }
        let a = &self.anchor;
        if !(a.x.is_finite() && a.y.is_finite() && a.z.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "anchor must be finite, got {a}"
            )));
        }
        Ok(self)
    }
}

/// Candidate origins around `anchor`, nearest rings first.
///
/// Walks square rings on a horizontal grid with spacing `step`: the anchor
/// itself, then the 8 cells of ring 1, the 16 of ring 2, and so on. Height
/// stays at the anchor's. The sequence is infinite; callers bound it.
pub(crate) fn spiral(anchor: Location, step: f64) -> impl Iterator<Item = Location> {
    (0i64..)
        .flat_map(ring)
        .map(move |(i, j)| {
            Location::new(
                anchor.x + i as f64 * step,
                anchor.y,
                anchor.z + j as f64 * step,
            )
        })
}

/// Grid cells on the perimeter of square ring `r`, clockwise from the
/// top-left corner.
fn ring(r: i64) -> Vec<(i64, i64)> {
    if r == 0 {
        return vec![(0, 0)];
    }
    let mut cells = Vec::with_capacity(8 * r as usize);
    cells.extend((-r..=r).map(|i| (i, -r)));
    cells.extend((-r + 1..=r).map(|j| (r, j)));
    cells.extend((-r..r).rev().map(|i| (i, r)));
    cells.extend((-r + 1..r).rev().map(|j| (-r, j)));
    cells
}
