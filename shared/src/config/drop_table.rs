use std::collections::HashMap;

use serde::Deserialize;

use crate::config::report::{ConfigError, ConfigReport};

/// One loot roll: an independent chance for `item_id`, with a uniform
/// count in `[min_count, max_count]` when it lands.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct DropEntry {
    pub item_id: u32,
    pub drop_rate: f32,
    #[serde(default = "default_count")]
    pub min_count: i32,
    #[serde(default = "default_count")]
    pub max_count: i32,
}

fn default_count() -> i32 {
    1
}

/// Loot rolls for one monster template.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct DropTable {
    pub monster_template_id: u32,
    #[serde(default)]
    pub items: Vec<DropEntry>,
}

#[derive(Deserialize)]
struct DropDocument {
    #[serde(default)]
    drop_tables: Vec<serde_yaml::Value>,
}

/// Drop tables keyed by monster template id.
#[derive(Debug, Default)]
pub struct DropTableRegistry {
    tables: HashMap<u32, DropTable>,
}

impl DropTableRegistry {
    pub fn from_tables(tables: Vec<DropTable>) -> Self {
        Self {
            tables: tables
                .into_iter()
                .map(|t| (t.monster_template_id, t))
                .collect(),
        }
    }

    pub fn get(&self, monster_template_id: u32) -> Option<&DropTable> {
        self.tables.get(&monster_template_id)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Parses a drop-table document. Rates are clamped to `[0, 1]`;
    /// entries with a zero item id or inverted count range are rejected.
    pub fn load_from_str(yaml: &str) -> Result<ConfigReport<DropTable>, ConfigError> {
        let document: DropDocument = serde_yaml::from_str(yaml)?;
        let mut report = ConfigReport::new();

        for (index, value) in document.drop_tables.into_iter().enumerate() {
            let mut table: DropTable = match serde_yaml::from_value(value) {
                Ok(table) => table,
                Err(err) => {
                    report.reject(index, err.to_string());
                    continue;
                }
            };
            if table.monster_template_id == 0 {
                report.reject(index, "monster_template_id must be non-zero");
                continue;
            }
            let mut bad_entry = None;
            for entry in &mut table.items {
                if entry.item_id == 0 {
                    bad_entry = Some("item_id must be non-zero");
                    break;
                }
                if entry.min_count < 1 || entry.max_count < entry.min_count {
                    bad_entry = Some("count range must satisfy 1 <= min <= max");
                    break;
                }
                entry.drop_rate = entry.drop_rate.clamp(0.0, 1.0);
            }
            if let Some(reason) = bad_entry {
                report.reject(index, reason);
                continue;
            }
            report.accepted.push(table);
        }

        Ok(report)
    }
}
