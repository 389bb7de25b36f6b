use std::collections::HashMap;

use crate::ecs::components::*;
use crate::ecs::entity::{Entity, EntityAllocator};

/// One typed component table. Iteration order is unspecified; systems
/// that need determinism collect and sort handles first.
pub struct ComponentStore<T> {
    map: HashMap<Entity, T>,
}

impl<T> Default for ComponentStore<T> {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
        }
    }
}

impl<T> ComponentStore<T> {
    pub fn insert(&mut self, entity: Entity, component: T) -> Option<T> {
        self.map.insert(entity, component)
    }

    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.map.get(&entity)
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.map.get_mut(&entity)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.map.contains_key(&entity)
    }

    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        self.map.remove(&entity)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.map.iter().map(|(entity, component)| (*entity, component))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.map.iter_mut().map(|(entity, component)| (*entity, component))
    }

    pub fn keys(&self) -> impl Iterator<Item = Entity> + '_ {
        self.map.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// The entity arena plus one typed table per component. All cross-entity
/// references are handles validated through [`Registry::is_alive`].
#[derive(Default)]
pub struct Registry {
    allocator: EntityAllocator,
    pub identities: ComponentStore<Identity>,
    pub monster_identities: ComponentStore<MonsterIdentity>,
    pub transforms: ComponentStore<Transform>,
    pub attributes: ComponentStore<Attributes>,
    pub combat: ComponentStore<Combat>,
    pub equipment: ComponentStore<EquipmentSlots>,
    pub items: ComponentStore<ItemInstance>,
    pub owners: ComponentStore<InventoryOwner>,
    pub skills: ComponentStore<SkillList>,
    pub monster_ai: ComponentStore<MonsterAi>,
    pub monster_aggro: ComponentStore<MonsterAggro>,
    pub modifiers: ComponentStore<AttributeModifiers>,
    pub effects: ComponentStore<EffectList>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self) -> Entity {
        self.allocator.allocate()
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.allocator.is_alive(entity)
    }

    pub fn alive_count(&self) -> usize {
        self.allocator.alive_count()
    }

    /// Destroys an entity, dropping every component attached to it.
    /// Handles held elsewhere go stale and fail `is_alive`.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        if !self.allocator.free(entity) {
            return false;
        }
        self.identities.remove(entity);
        self.monster_identities.remove(entity);
        self.transforms.remove(entity);
        self.attributes.remove(entity);
        self.combat.remove(entity);
        self.equipment.remove(entity);
        self.items.remove(entity);
        self.owners.remove(entity);
        self.skills.remove(entity);
        self.monster_ai.remove(entity);
        self.monster_aggro.remove(entity);
        self.modifiers.remove(entity);
        self.effects.remove(entity);
        true
    }

    /// Entities carrying both an AI and an aggro component, i.e. live
    /// monsters, in a deterministic order.
    pub fn monsters(&self) -> Vec<Entity> {
        let mut monsters: Vec<Entity> = self
            .monster_ai
            .keys()
            .filter(|entity| self.monster_aggro.contains(*entity))
            .collect();
        monsters.sort();
        monsters
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use emberfall_shared::types::TilePoint;

    #[test]
    fn destroy_detaches_all_components() {
        let mut registry = Registry::new();
        let entity = registry.create();
        registry.transforms.insert(
            entity,
            Transform {
                position: TilePoint::new(1, 2),
                ..Default::default()
            },
        );
        registry.attributes.insert(entity, Attributes::default());

        assert!(registry.destroy(entity));
        assert!(!registry.is_alive(entity));
        assert!(registry.transforms.get(entity).is_none());
        assert!(registry.attributes.get(entity).is_none());
    }

    #[test]
    fn stale_handle_reads_nothing_after_slot_reuse() {
        let mut registry = Registry::new();
        let first = registry.create();
        registry.attributes.insert(first, Attributes::default());
        registry.destroy(first);

        let second = registry.create();
        registry.attributes.insert(
            second,
            Attributes {
                hp: 42,
                ..Default::default()
            },
        );

        assert!(!registry.is_alive(first));
        assert!(registry.attributes.get(first).is_none());
        assert_eq!(registry.attributes.get(second).unwrap().hp, 42);
    }

    #[test]
    fn monsters_view_requires_both_components() {
        let mut registry = Registry::new();
        let full = registry.create();
        registry.monster_ai.insert(full, MonsterAi::default());
        registry.monster_aggro.insert(full, MonsterAggro::default());

        let half = registry.create();
        registry.monster_ai.insert(half, MonsterAi::default());

        assert_eq!(registry.monsters(), vec![full]);
    }
}
