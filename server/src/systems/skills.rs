//! Skill-list mutations and the passive-bonus recomputation that feeds
//! the combat resolver.

use emberfall_shared::config::SkillTemplateRegistry;

use crate::ecs::{AttributeModifiers, Entity, LearnedSkill, SkillList, World, WorldEvent};
use crate::systems::{System, SystemContext};

/// Teaches a character a skill at `level`. Fails when the skill is
/// already known or the 20-slot list is full.
pub fn learn_skill(
    world: &mut World,
    skills: &SkillTemplateRegistry,
    character: Entity,
    skill_id: u32,
    level: u8,
) -> bool {
    if !world.registry.skills.contains(character) {
        world.registry.skills.insert(character, SkillList::default());
    }
    let level = clamp_level(skills, skill_id, level.max(1));
    let Some(list) = world.registry.skills.get_mut(character) else {
        return false;
    };
    if !list.add(LearnedSkill {
        skill_id,
        level,
        exp: 0,
        hotkey: 0,
    }) {
        return false;
    }

    world.dirty.mark_skills(character);
    world.events.publish(WorldEvent::SkillLearned {
        character,
        skill_id,
        level,
    });
    true
}

/// Raises a known skill by `levels`, clamped to the template's maximum.
pub fn upgrade_skill(
    world: &mut World,
    skills: &SkillTemplateRegistry,
    character: Entity,
    skill_id: u32,
    levels: u8,
) -> bool {
    if levels == 0 {
        return false;
    }
    let Some(list) = world.registry.skills.get_mut(character) else {
        return false;
    };
    let Some(skill) = list.get_mut(skill_id) else {
        return false;
    };
    let old_level = skill.level;
    let new_level = clamp_level(skills, skill_id, old_level.saturating_add(levels));
    if new_level == old_level {
        return false;
    }
    skill.level = new_level;

    world.dirty.mark_skills(character);
    world.events.publish(WorldEvent::SkillUpgraded {
        character,
        skill_id,
        old_level,
        new_level,
    });
    true
}

/// Binds a skill to a hotkey (1..=8); zero unbinds.
pub fn bind_hotkey(world: &mut World, character: Entity, skill_id: u32, hotkey: u8) -> bool {
    if hotkey > 8 {
        return false;
    }
    let Some(list) = world.registry.skills.get_mut(character) else {
        return false;
    };
    let Some(skill) = list.get_mut(skill_id) else {
        return false;
    };
    skill.hotkey = hotkey;
    world.dirty.mark_skills(character);
    true
}

fn clamp_level(skills: &SkillTemplateRegistry, skill_id: u32, level: u8) -> u8 {
    match skills.get(skill_id) {
        Some(template) if template.max_level > 0 => level.min(template.max_level),
        _ => level,
    }
}

/// Folds every known passive skill's per-level bonuses into the derived
/// [`AttributeModifiers`] component.
pub fn recompute_modifiers(
    world: &mut World,
    skills: &SkillTemplateRegistry,
    character: Entity,
) {
    let mut modifiers = AttributeModifiers::default();
    if let Some(list) = world.registry.skills.get(character) {
        for learned in list.iter() {
            let Some(template) = skills.get(learned.skill_id) else {
                continue;
            };
            if !template.passive {
                continue;
            }
            let level = learned.level.max(1) as i32;
            let bonuses = template.passive_bonuses;
            modifiers.attack += bonuses.attack * level;
            modifiers.defense += bonuses.defense * level;
            modifiers.magic_attack += bonuses.magic_attack * level;
            modifiers.magic_defense += bonuses.magic_defense * level;
            modifiers.critical_chance += bonuses.critical_chance * level as f32;
            modifiers.hit_rate += bonuses.hit_rate * level;
        }
    }
    world.registry.modifiers.insert(character, modifiers);
}

/// Schedule member that keeps [`AttributeModifiers`] in step with skill
/// and equipment changes.
pub struct PassiveSkillSystem;

impl PassiveSkillSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PassiveSkillSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for PassiveSkillSystem {
    fn name(&self) -> &'static str {
        "passive_skills"
    }

    fn run(&mut self, _ctx: &mut SystemContext<'_>) {}

    fn handle_event(&mut self, ctx: &mut SystemContext<'_>, event: &WorldEvent) {
        let character = match event {
            WorldEvent::SkillLearned { character, .. }
            | WorldEvent::SkillUpgraded { character, .. }
            | WorldEvent::ItemEquipped { character, .. }
            | WorldEvent::ItemUnequipped { character, .. } => *character,
            _ => return,
        };
        let registries = ctx.registries;
        recompute_modifiers(ctx.world, &registries.skills, character);
    }
}
