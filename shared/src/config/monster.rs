use std::collections::HashMap;

use serde::Deserialize;

use crate::config::report::{ConfigError, ConfigReport};

/// AI behavior tag assigned by content. Maps one-to-one onto the server's
/// AI specializations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonsterAiKind {
    #[default]
    Normal,
    Ambush,
    Ranged,
    Summoner,
    Explosive,
    Poisonous,
    Guard,
    BossCowKing,
}

/// Static monster definition: appearance, base attributes, AI tag.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MonsterTemplate {
    pub template_id: u32,
    pub name: String,
    #[serde(default)]
    pub race: u16,
    #[serde(default)]
    pub appearance: u16,
    #[serde(default)]
    pub ai: MonsterAiKind,
    #[serde(default = "default_level")]
    pub level: u16,
    #[serde(default = "default_max_hp")]
    pub max_hp: i32,
    #[serde(default)]
    pub max_mp: i32,
    #[serde(default = "default_attack")]
    pub attack: i32,
    #[serde(default)]
    pub defense: i32,
    #[serde(default)]
    pub magic_attack: i32,
    #[serde(default)]
    pub magic_defense: i32,
    #[serde(default = "default_speed")]
    pub speed: i32,
    #[serde(default = "default_attack_cooldown")]
    pub attack_cooldown_secs: f32,
    /// Preferred engagement distance for ranged AI; zero means melee.
    #[serde(default)]
    pub preferred_distance: f32,
    #[serde(default)]
    pub is_boss: bool,
}

fn default_level() -> u16 {
    1
}

fn default_max_hp() -> i32 {
    50
}

fn default_attack() -> i32 {
    5
}

fn default_speed() -> i32 {
    100
}

fn default_attack_cooldown() -> f32 {
    1.0
}

#[derive(Deserialize)]
struct MonsterDocument {
    #[serde(default)]
    monsters: Vec<serde_yaml::Value>,
}

/// Monster templates keyed by template id. Built at bootstrap and passed
/// by reference into the spawn system.
#[derive(Debug, Default)]
pub struct MonsterTemplateRegistry {
    templates: HashMap<u32, MonsterTemplate>,
}

impl MonsterTemplateRegistry {
    pub fn from_templates(templates: Vec<MonsterTemplate>) -> Self {
        Self {
            templates: templates
                .into_iter()
                .map(|t| (t.template_id, t))
                .collect(),
        }
    }

    pub fn get(&self, template_id: u32) -> Option<&MonsterTemplate> {
        self.templates.get(&template_id)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn load_from_str(yaml: &str) -> Result<ConfigReport<MonsterTemplate>, ConfigError> {
        let document: MonsterDocument = serde_yaml::from_str(yaml)?;
        let mut report = ConfigReport::new();

        for (index, value) in document.monsters.into_iter().enumerate() {
            let template: MonsterTemplate = match serde_yaml::from_value(value) {
                Ok(template) => template,
                Err(err) => {
                    report.reject(index, err.to_string());
                    continue;
                }
            };
            if template.template_id == 0 {
                report.reject(index, "template_id must be non-zero");
                continue;
            }
            if template.max_hp <= 0 {
                report.reject(index, "max_hp must be positive");
                continue;
            }
            report.accepted.push(template);
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_templates_with_ai_tags() {
        let yaml = r#"
monsters:
  - template_id: 2001
    name: Bone Archer
    ai: ranged
    max_hp: 80
    preferred_distance: 6.0
  - template_id: 2002
    name: Cow King
    ai: boss_cow_king
    max_hp: 5000
    is_boss: true
"#;
        let report = MonsterTemplateRegistry::load_from_str(yaml).unwrap();
        assert!(report.rejected.is_empty());
        let registry = MonsterTemplateRegistry::from_templates(report.accepted);
        assert_eq!(registry.get(2001).unwrap().ai, MonsterAiKind::Ranged);
        assert!(registry.get(2002).unwrap().is_boss);
    }

    #[test]
    fn zero_hp_template_is_rejected() {
        let yaml = r#"
monsters:
  - template_id: 7
    name: Husk
    max_hp: 0
"#;
        let report = MonsterTemplateRegistry::load_from_str(yaml).unwrap();
        assert!(report.accepted.is_empty());
        assert_eq!(report.rejected.len(), 1);
    }
}
