use serde::Deserialize;

use crate::config::report::{ConfigError, ConfigReport};
use crate::types::MapId;

/// One monster spawn point.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SpawnPointConfig {
    pub spawn_id: u32,
    #[serde(default)]
    pub map_id: MapId,
    pub center_x: i32,
    pub center_y: i32,
    #[serde(default = "default_spawn_radius")]
    pub spawn_radius: i32,
    pub monster_template_id: u32,
    #[serde(default = "default_patrol_radius")]
    pub patrol_radius: i32,
    #[serde(default = "default_respawn_interval")]
    pub respawn_interval_secs: f32,
    #[serde(default = "default_max_count")]
    pub max_count: i32,
    #[serde(default = "default_aggro_range")]
    pub aggro_range: i32,
    #[serde(default = "default_attack_range")]
    pub attack_range: i32,
}

fn default_spawn_radius() -> i32 {
    5
}

fn default_patrol_radius() -> i32 {
    5
}

fn default_respawn_interval() -> f32 {
    30.0
}

fn default_max_count() -> i32 {
    1
}

fn default_aggro_range() -> i32 {
    12
}

fn default_attack_range() -> i32 {
    3
}

#[derive(Deserialize)]
struct SpawnDocument {
    #[serde(default)]
    spawn_points: Vec<serde_yaml::Value>,
}

/// All spawn points, keyed by spawn id.
#[derive(Debug, Default)]
pub struct SpawnTable {
    points: Vec<SpawnPointConfig>,
}

impl SpawnTable {
    pub fn from_points(points: Vec<SpawnPointConfig>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[SpawnPointConfig] {
        &self.points
    }

    /// Parses a spawn-point document. Entries with a missing/zero id or
    /// template, or negative ranges, are rejected individually.
    pub fn load_from_str(yaml: &str) -> Result<ConfigReport<SpawnPointConfig>, ConfigError> {
        let document: SpawnDocument = serde_yaml::from_str(yaml)?;
        let mut report = ConfigReport::new();

        for (index, value) in document.spawn_points.into_iter().enumerate() {
            let point: SpawnPointConfig = match serde_yaml::from_value(value) {
                Ok(point) => point,
                Err(err) => {
                    report.reject(index, err.to_string());
                    continue;
                }
            };
            if point.spawn_id == 0 {
                report.reject(index, "spawn_id must be non-zero");
                continue;
            }
            if point.monster_template_id == 0 {
                report.reject(index, "monster_template_id must be non-zero");
                continue;
            }
            if point.spawn_radius < 0 || point.aggro_range < 0 || point.attack_range < 0 {
                report.reject(index, "ranges must be non-negative");
                continue;
            }
            report.accepted.push(point);
        }

        Ok(report)
    }
}
