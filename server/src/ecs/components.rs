use std::collections::HashMap;

use emberfall_shared::config::MonsterAiKind;
use emberfall_shared::types::{CharacterClass, EquipSlot, Gender, MapId, TilePoint};
use emberfall_shared::{EQUIP_SLOT_COUNT, MAX_SKILLS};

use crate::ecs::entity::Entity;

/// Persistent identity of a player character or monster.
#[derive(Clone, Debug, Default)]
pub struct Identity {
    /// Persistent id (character id, or a snowflake for monsters/items).
    pub persistent_id: u64,
    pub account_id: u64,
    pub name: String,
    pub class: CharacterClass,
    pub gender: Gender,
}

/// Monster-only identity extras used by drop and spawn bookkeeping.
#[derive(Clone, Copy, Debug, Default)]
pub struct MonsterIdentity {
    pub template_id: u32,
    /// Spawn point that created this monster; zero for scripted spawns.
    pub spawn_point_id: u32,
}

/// Tile position, facing, and map binding.
#[derive(Clone, Copy, Debug, Default)]
pub struct Transform {
    pub position: TilePoint,
    pub direction: emberfall_shared::types::Direction,
    pub map_id: MapId,
    pub last_active_ms: u64,
}

/// Primary attribute block. `0 <= hp <= max_hp` and `0 <= mp <= max_mp`
/// always hold; only the combat resolver mutates hp/mp.
#[derive(Clone, Copy, Debug)]
pub struct Attributes {
    pub level: u16,
    pub exp: u64,
    pub hp: i32,
    pub max_hp: i32,
    pub mp: i32,
    pub max_mp: i32,
    pub attack: i32,
    pub defense: i32,
    pub magic_attack: i32,
    pub magic_defense: i32,
    pub speed: i32,
    pub gold: i64,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            level: 1,
            exp: 0,
            hp: 1,
            max_hp: 1,
            mp: 0,
            max_mp: 0,
            attack: 0,
            defense: 0,
            magic_attack: 0,
            magic_defense: 0,
            speed: 100,
            gold: 0,
        }
    }
}

impl Attributes {
    pub fn is_dead(&self) -> bool {
        self.hp <= 0
    }
}

/// Combat tuning attached to entities that can attack or be attacked.
#[derive(Clone, Copy, Debug)]
pub struct Combat {
    pub attack_range: i32,
    pub critical_chance: f32,
    pub evasion_chance: f32,
}

impl Default for Combat {
    fn default() -> Self {
        Self {
            attack_range: 1,
            critical_chance: 0.0,
            evasion_chance: 0.0,
        }
    }
}

/// The 13 equipment slots. Entries are item entity handles.
#[derive(Clone, Copy, Debug, Default)]
pub struct EquipmentSlots {
    slots: [Option<Entity>; EQUIP_SLOT_COUNT],
}

impl EquipmentSlots {
    pub fn get(&self, slot: EquipSlot) -> Option<Entity> {
        self.slots[slot.index()]
    }

    pub fn set(&mut self, slot: EquipSlot, item: Option<Entity>) -> Option<Entity> {
        std::mem::replace(&mut self.slots[slot.index()], item)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EquipSlot, Entity)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.map(|item| (EquipSlot::from_index(index).expect("slot index in range"), item))
        })
    }
}

/// Per-item instance state. Items are standalone entities; ownership
/// lives in [`InventoryOwner`].
#[derive(Clone, Copy, Debug)]
pub struct ItemInstance {
    pub instance_id: u64,
    pub template_id: u32,
    pub count: i32,
    pub durability: i32,
    pub max_durability: i32,
    /// Shape code used for ring special-effect checks.
    pub shape: i32,
    pub enhancement_level: i32,
    pub luck: i32,
    /// Target equipment slot; `None` means not equippable.
    pub equip_slot: Option<EquipSlot>,
    pub bonuses: ItemBonuses,
}

impl Default for ItemInstance {
    fn default() -> Self {
        Self {
            instance_id: 0,
            template_id: 0,
            count: 1,
            durability: 0,
            max_durability: 0,
            shape: 0,
            enhancement_level: 0,
            luck: 0,
            equip_slot: None,
            bonuses: ItemBonuses::default(),
        }
    }
}

/// Attribute bonuses granted by one item while equipped.
#[derive(Clone, Copy, Debug, Default)]
pub struct ItemBonuses {
    pub attack: i32,
    pub defense: i32,
    pub magic_attack: i32,
    pub magic_defense: i32,
    pub hp: i32,
    pub mp: i32,
    pub hit_rate: i32,
    pub dodge: i32,
    pub speed: i32,
    pub lifesteal_percent: i32,
    pub reflect_percent: i32,
    pub elemental_damage: i32,
    pub elemental_type: i32,
}

/// Links an item entity to its owner and bag slot. `slot_index == -1`
/// means equipped (owner set) or lying on the ground (owner `None`).
#[derive(Clone, Copy, Debug)]
pub struct InventoryOwner {
    pub owner: Option<Entity>,
    pub slot_index: i32,
}

impl Default for InventoryOwner {
    fn default() -> Self {
        Self {
            owner: None,
            slot_index: -1,
        }
    }
}

/// One learned skill.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LearnedSkill {
    pub skill_id: u32,
    pub level: u8,
    pub exp: i32,
    /// Hotkey binding: 0 unbound, 1..=8 bound.
    pub hotkey: u8,
}

/// Fixed-capacity skill list with a template-id index and per-skill
/// cooldowns.
#[derive(Clone, Debug, Default)]
pub struct SkillList {
    slots: [Option<LearnedSkill>; MAX_SKILLS],
    index: HashMap<u32, usize>,
    /// skill_id -> ready-at time in milliseconds.
    cooldowns: HashMap<u32, u64>,
}

impl SkillList {
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn has(&self, skill_id: u32) -> bool {
        self.index.contains_key(&skill_id)
    }

    pub fn get(&self, skill_id: u32) -> Option<&LearnedSkill> {
        let slot = *self.index.get(&skill_id)?;
        self.slots[slot].as_ref().filter(|s| s.skill_id == skill_id)
    }

    pub fn get_mut(&mut self, skill_id: u32) -> Option<&mut LearnedSkill> {
        let slot = *self.index.get(&skill_id)?;
        self.slots[slot].as_mut().filter(|s| s.skill_id == skill_id)
    }

    /// Adds a skill into the lowest free slot. Fails when the skill is
    /// already known or the list is full.
    pub fn add(&mut self, skill: LearnedSkill) -> bool {
        if self.has(skill.skill_id) {
            return false;
        }
        for (slot, entry) in self.slots.iter_mut().enumerate() {
            if entry.is_none() {
                self.index.insert(skill.skill_id, slot);
                *entry = Some(skill);
                return true;
            }
        }
        false
    }

    pub fn remove(&mut self, skill_id: u32) -> bool {
        let Some(slot) = self.index.remove(&skill_id) else {
            return false;
        };
        self.slots[slot] = None;
        self.cooldowns.remove(&skill_id);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &LearnedSkill> {
        self.slots.iter().filter_map(|slot| slot.as_ref())
    }

    pub fn is_ready(&self, skill_id: u32, now_ms: u64) -> bool {
        self.cooldowns
            .get(&skill_id)
            .is_none_or(|ready_at| now_ms >= *ready_at)
    }

    pub fn start_cooldown(&mut self, skill_id: u32, duration_ms: u64, now_ms: u64) {
        self.cooldowns.insert(skill_id, now_ms + duration_ms);
    }

    pub fn remaining_cooldown_ms(&self, skill_id: u32, now_ms: u64) -> u64 {
        self.cooldowns
            .get(&skill_id)
            .map_or(0, |ready_at| ready_at.saturating_sub(now_ms))
    }

    pub fn cleanup_expired_cooldowns(&mut self, now_ms: u64) {
        self.cooldowns.retain(|_, ready_at| now_ms < *ready_at);
    }
}

/// Monster AI state machine states.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MonsterState {
    #[default]
    Idle,
    Patrol,
    Chase,
    Attack,
    Return,
    Dead,
}

/// Per-monster AI working state.
#[derive(Clone, Copy, Debug)]
pub struct MonsterAi {
    pub kind: MonsterAiKind,
    pub state: MonsterState,
    pub target: Option<Entity>,
    pub state_timer: f32,
    pub attack_cooldown: f32,
    pub attack_cooldown_timer: f32,
    /// Ambush AI: still lying in wait.
    pub is_hidden: bool,
    /// Ranged AI: distance it tries to keep to the target.
    pub preferred_distance: f32,
    pub return_position: TilePoint,
    /// Accumulates toward the next chase/return step.
    pub move_timer: f32,
    // Boss fields
    pub is_crazy_mode: bool,
    pub crazy_mode_timer: f32,
    pub teleport_cooldown: f32,
}

impl Default for MonsterAi {
    fn default() -> Self {
        Self {
            kind: MonsterAiKind::Normal,
            state: MonsterState::Idle,
            target: None,
            state_timer: 0.0,
            attack_cooldown: 1.0,
            attack_cooldown_timer: 0.0,
            is_hidden: false,
            preferred_distance: 0.0,
            return_position: TilePoint::new(0, 0),
            move_timer: 0.0,
            is_crazy_mode: false,
            crazy_mode_timer: 0.0,
            teleport_cooldown: 0.0,
        }
    }
}

/// Aggro detection ranges and the hate list.
#[derive(Clone, Debug)]
pub struct MonsterAggro {
    pub aggro_range: i32,
    pub attack_range: i32,
    pub hate: HateList,
}

impl Default for MonsterAggro {
    fn default() -> Self {
        Self {
            aggro_range: 12,
            attack_range: 3,
            hate: HateList::default(),
        }
    }
}

/// Threat table: attacker entity -> accumulated hatred. Values are always
/// positive; entries that decay to zero are erased. The top target is
/// cached and re-derived lazily when invalidated.
#[derive(Clone, Debug)]
pub struct HateList {
    entries: HashMap<Entity, i32>,
    cached_top: Option<Entity>,
    decay_rate: f32,
    accumulated_decay: f32,
}

impl Default for HateList {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            cached_top: None,
            decay_rate: 5.0,
            accumulated_decay: 0.0,
        }
    }
}

impl HateList {
    const HATE_PER_DAMAGE: f32 = 1.5;

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, attacker: Entity) -> Option<i32> {
        self.entries.get(&attacker).copied()
    }

    /// Adds `1.5 x damage` hatred toward `attacker`, keeping the cached
    /// top target current without a full scan.
    pub fn add_hatred(&mut self, attacker: Entity, damage: i32) {
        if damage <= 0 {
            return;
        }
        let hatred = (damage as f32 * Self::HATE_PER_DAMAGE) as i32;
        let total = self.entries.entry(attacker).or_insert(0);
        *total += hatred.max(1);
        let total = *total;

        match self.cached_top {
            None => self.cached_top = Some(attacker),
            Some(top) => {
                let top_hatred = self.entries.get(&top).copied().unwrap_or(0);
                if total > top_hatred {
                    self.cached_top = Some(attacker);
                }
            }
        }
    }

    /// The highest-hatred attacker, if any. Re-derives and refreshes the
    /// cache when it was invalidated.
    pub fn top_target(&mut self) -> Option<Entity> {
        if self.entries.is_empty() {
            self.cached_top = None;
            return None;
        }
        if let Some(top) = self.cached_top {
            if self.entries.contains_key(&top) {
                return Some(top);
            }
        }

        let top = self
            .entries
            .iter()
            .max_by_key(|(entity, hatred)| (**hatred, std::cmp::Reverse(**entity)))
            .map(|(entity, _)| *entity);
        self.cached_top = top;
        top
    }

    /// Applies `decay_rate x dt` hatred decay. Fractions accumulate until
    /// a whole unit can be subtracted from every entry.
    pub fn decay(&mut self, dt: f32) {
        if self.entries.is_empty() {
            self.cached_top = None;
            self.accumulated_decay = 0.0;
            return;
        }
        if dt <= 0.0 {
            return;
        }
        self.accumulated_decay += self.decay_rate * dt;
        if self.accumulated_decay < 1.0 {
            return;
        }
        let amount = self.accumulated_decay as i32;
        self.accumulated_decay -= amount as f32;

        self.entries.retain(|_, hatred| {
            *hatred -= amount;
            *hatred > 0
        });
        if let Some(top) = self.cached_top {
            if !self.entries.contains_key(&top) {
                self.cached_top = None;
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cached_top = None;
        self.accumulated_decay = 0.0;
    }

    #[cfg(test)]
    pub fn cached_top_for_test(&self) -> Option<Entity> {
        self.cached_top
    }
}

/// Derived attribute bonuses from passive skills, recomputed whenever the
/// skill list changes. Combat reads these on every attack.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AttributeModifiers {
    pub attack: i32,
    pub defense: i32,
    pub magic_attack: i32,
    pub magic_defense: i32,
    pub critical_chance: f32,
    pub hit_rate: i32,
}

/// A timed status effect on an entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActiveEffect {
    pub kind: EffectKind,
    pub source: Option<Entity>,
    pub remaining_secs: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectKind {
    Stun,
    Poison,
}

/// Timed effects currently applied to an entity.
#[derive(Clone, Debug, Default)]
pub struct EffectList {
    pub effects: Vec<ActiveEffect>,
}

impl EffectList {
    pub fn add(&mut self, effect: ActiveEffect) {
        self.effects.push(effect);
    }

    pub fn has(&self, kind: EffectKind) -> bool {
        self.effects.iter().any(|e| e.kind == kind)
    }

    pub fn tick(&mut self, dt: f32) {
        for effect in &mut self.effects {
            effect.remaining_secs -= dt;
        }
        self.effects.retain(|e| e.remaining_secs > 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(raw: u32) -> Entity {
        Entity::from_bits(raw)
    }

    #[test]
    fn hatred_is_one_and_a_half_damage() {
        let mut hate = HateList::default();
        hate.add_hatred(entity(1), 10);
        assert_eq!(hate.get(entity(1)), Some(15));
        assert_eq!(hate.top_target(), Some(entity(1)));
    }

    #[test]
    fn cached_top_tracks_the_highest_entry() {
        let mut hate = HateList::default();
        hate.add_hatred(entity(1), 10);
        hate.add_hatred(entity(2), 4);
        assert_eq!(hate.top_target(), Some(entity(1)));

        hate.add_hatred(entity(2), 20);
        assert_eq!(hate.top_target(), Some(entity(2)));
    }

    #[test]
    fn decay_accumulates_fractions_and_erases_dead_entries() {
        let mut hate = HateList::default();
        hate.add_hatred(entity(1), 2); // 3 hatred
        // 5.0/s decay: 0.1s steps carry fractions until a whole unit lands.
        hate.decay(0.1);
        assert_eq!(hate.get(entity(1)), Some(3));
        hate.decay(0.1);
        assert_eq!(hate.get(entity(1)), Some(2));

        hate.decay(1.0);
        assert!(hate.is_empty());
        assert_eq!(hate.top_target(), None);
    }

    #[test]
    fn clear_wipes_cache_and_fractions() {
        let mut hate = HateList::default();
        hate.add_hatred(entity(3), 100);
        hate.decay(0.05);
        hate.clear();
        assert!(hate.is_empty());
        assert_eq!(hate.cached_top_for_test(), None);
    }

    #[test]
    fn skill_list_respects_capacity() {
        let mut skills = SkillList::default();
        for id in 1..=MAX_SKILLS as u32 {
            assert!(skills.add(LearnedSkill {
                skill_id: id,
                level: 1,
                exp: 0,
                hotkey: 0,
            }));
        }
        assert!(!skills.add(LearnedSkill {
            skill_id: 99,
            level: 1,
            exp: 0,
            hotkey: 0,
        }));
        assert_eq!(skills.len(), MAX_SKILLS);
    }

    #[test]
    fn skill_cooldowns_expire() {
        let mut skills = SkillList::default();
        skills.add(LearnedSkill {
            skill_id: 7,
            level: 1,
            exp: 0,
            hotkey: 1,
        });
        assert!(skills.is_ready(7, 0));
        skills.start_cooldown(7, 1_500, 1_000);
        assert!(!skills.is_ready(7, 2_000));
        assert_eq!(skills.remaining_cooldown_ms(7, 2_000), 500);
        assert!(skills.is_ready(7, 2_500));
    }
}
