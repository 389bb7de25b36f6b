use std::collections::HashMap;

use serde::Deserialize;

use crate::config::report::{ConfigError, ConfigReport};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillTargetType {
    #[default]
    Enemy,
    SelfOnly,
    Ground,
}

/// Flat attribute bonuses granted by a passive skill, scaled by level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct PassiveBonuses {
    #[serde(default)]
    pub attack: i32,
    #[serde(default)]
    pub defense: i32,
    #[serde(default)]
    pub magic_attack: i32,
    #[serde(default)]
    pub magic_defense: i32,
    #[serde(default)]
    pub critical_chance: f32,
    #[serde(default)]
    pub hit_rate: i32,
}

/// Static skill definition.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SkillTemplate {
    pub skill_id: u32,
    pub name: String,
    #[serde(default)]
    pub mp_cost: i32,
    #[serde(default)]
    pub cooldown_ms: u32,
    #[serde(default)]
    pub target_type: SkillTargetType,
    #[serde(default = "default_range")]
    pub range: i32,
    #[serde(default = "default_damage_scalar")]
    pub damage_scalar: f32,
    #[serde(default)]
    pub max_level: u8,
    #[serde(default)]
    pub passive: bool,
    /// Per-level bonuses applied while the skill is known (passives only).
    #[serde(default)]
    pub passive_bonuses: PassiveBonuses,
}

fn default_range() -> i32 {
    1
}

fn default_damage_scalar() -> f32 {
    1.0
}

#[derive(Deserialize)]
struct SkillDocument {
    #[serde(default)]
    skills: Vec<serde_yaml::Value>,
}

/// Skill templates keyed by skill id.
#[derive(Debug, Default)]
pub struct SkillTemplateRegistry {
    skills: HashMap<u32, SkillTemplate>,
}

impl SkillTemplateRegistry {
    pub fn from_templates(skills: Vec<SkillTemplate>) -> Self {
        Self {
            skills: skills.into_iter().map(|s| (s.skill_id, s)).collect(),
        }
    }

    pub fn get(&self, skill_id: u32) -> Option<&SkillTemplate> {
        self.skills.get(&skill_id)
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    pub fn load_from_str(yaml: &str) -> Result<ConfigReport<SkillTemplate>, ConfigError> {
        let document: SkillDocument = serde_yaml::from_str(yaml)?;
        let mut report = ConfigReport::new();

        for (index, value) in document.skills.into_iter().enumerate() {
            let template: SkillTemplate = match serde_yaml::from_value(value) {
                Ok(template) => template,
                Err(err) => {
                    report.reject(index, err.to_string());
                    continue;
                }
            };
            if template.skill_id == 0 {
                report.reject(index, "skill_id must be non-zero");
                continue;
            }
            if template.mp_cost < 0 || template.range < 0 {
                report.reject(index, "mp_cost and range must be non-negative");
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
    fn parses_active_and_passive_skills() {
        let yaml = r#"
skills:
  - skill_id: 101
    name: Firebolt
    mp_cost: 8
    cooldown_ms: 1500
    target_type: enemy
    range: 7
    damage_scalar: 1.4
  - skill_id: 501
    name: Iron Skin
    passive: true
    passive_bonuses:
      defense: 3
"#;
        let report = SkillTemplateRegistry::load_from_str(yaml).unwrap();
        assert!(report.rejected.is_empty());
        let registry = SkillTemplateRegistry::from_templates(report.accepted);
        assert_eq!(registry.get(101).unwrap().mp_cost, 8);
        assert!(registry.get(501).unwrap().passive);
        assert_eq!(registry.get(501).unwrap().passive_bonuses.defense, 3);
    }
}
