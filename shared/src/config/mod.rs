//! Typed content configuration loaded from YAML: spawn points, monster
//! templates, drop tables, skill templates, and the UI layout table.
//!
//! Loaders never panic and never poison a live registry: a malformed
//! document is an error the caller can ignore (keeping the previous good
//! registry), and individually invalid entries are collected into the
//! returned [`ConfigReport`] with a reason instead of aborting the load.

mod drop_table;
mod monster;
mod report;
mod skill;
mod spawn;
mod ui_layout;

pub use drop_table::{DropEntry, DropTable, DropTableRegistry};
pub use monster::{MonsterAiKind, MonsterTemplate, MonsterTemplateRegistry};
pub use report::{ConfigError, ConfigReport, RejectedEntry};
pub use skill::{PassiveBonuses, SkillTargetType, SkillTemplate, SkillTemplateRegistry};
pub use spawn::{SpawnPointConfig, SpawnTable};
pub use ui_layout::{UiControlRect, UiLayoutConfig};
