use std::collections::VecDeque;

use emberfall_shared::types::{EquipSlot, MapId, TilePoint};

use crate::ecs::entity::Entity;

/// Everything systems can announce to each other within a tick. The set
/// is closed on purpose: delivery order and exhaustive handling are
/// checkable at compile time.
#[derive(Clone, Debug, PartialEq)]
pub enum WorldEvent {
    DamageDealt {
        attacker: Entity,
        target: Entity,
        damage: i32,
        critical: bool,
    },
    EntityDeath {
        entity: Entity,
        killer: Option<Entity>,
        position: TilePoint,
        map_id: MapId,
    },
    EntityRespawn {
        entity: Entity,
        position: TilePoint,
        map_id: MapId,
        hp_percent: f32,
        mp_percent: f32,
    },
    MonsterSummon {
        summoner: Entity,
        position: TilePoint,
        map_id: MapId,
    },
    ItemAdded {
        character: Entity,
        item: Entity,
        item_id: u32,
        count: i32,
        slot_index: i32,
    },
    ItemUsed {
        character: Entity,
        item: Entity,
        item_id: u32,
        used_count: i32,
        remaining_count: i32,
        slot_index: i32,
    },
    ItemDropped {
        character: Option<Entity>,
        item: Entity,
        item_id: u32,
        count: i32,
    },
    ItemPickedUp {
        character: Entity,
        item: Entity,
        item_id: u32,
        count: i32,
        slot_index: i32,
    },
    ItemEquipped {
        character: Entity,
        item: Entity,
        item_id: u32,
        slot: EquipSlot,
    },
    ItemUnequipped {
        character: Entity,
        item: Entity,
        item_id: u32,
        slot: EquipSlot,
        slot_index: i32,
    },
    SkillLearned {
        character: Entity,
        skill_id: u32,
        level: u8,
    },
    SkillUpgraded {
        character: Entity,
        skill_id: u32,
        old_level: u8,
        new_level: u8,
    },
}

/// FIFO event queue owned by the world. Systems publish here; the
/// schedule drains it after each system runs and before the next one
/// starts, delivering to systems in registration order.
#[derive(Default)]
pub struct EventQueue {
    queue: VecDeque<WorldEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&mut self, event: WorldEvent) {
        self.queue.push_back(event);
    }

    pub fn pop(&mut self) -> Option<WorldEvent> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
