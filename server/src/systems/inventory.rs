//! Bag and equipment mutations. Every operation keeps the exclusivity
//! invariant (an item is in exactly one of bag/equipment/ground/
//! destroyed), marks the owning character dirty, and publishes a typed
//! event.

use emberfall_shared::types::EquipSlot;
use emberfall_shared::MAX_INVENTORY_SIZE;

use crate::ecs::{Entity, InventoryOwner, ItemInstance, World, WorldEvent};

/// Lowest free bag slot of a character, if any.
pub fn find_free_slot(world: &World, character: Entity) -> Option<i32> {
    let mut occupied = [false; MAX_INVENTORY_SIZE];
    for (_, owner) in world.registry.owners.iter() {
        if owner.owner == Some(character)
            && owner.slot_index >= 0
            && (owner.slot_index as usize) < MAX_INVENTORY_SIZE
        {
            occupied[owner.slot_index as usize] = true;
        }
    }
    occupied
        .iter()
        .position(|taken| !taken)
        .map(|slot| slot as i32)
}

/// The item entity sitting in a character's bag slot, if any.
pub fn item_in_slot(world: &World, character: Entity, slot_index: i32) -> Option<Entity> {
    world
        .registry
        .owners
        .iter()
        .find(|(item, owner)| {
            owner.owner == Some(character)
                && owner.slot_index == slot_index
                && world.registry.items.contains(*item)
        })
        .map(|(item, _)| item)
}

/// Total count of a template across a character's bag and equipment.
pub fn count_item(world: &World, character: Entity, template_id: u32) -> i32 {
    let mut total = 0;
    for (item, owner) in world.registry.owners.iter() {
        if owner.owner != Some(character) {
            continue;
        }
        if let Some(instance) = world.registry.items.get(item) {
            if instance.template_id == template_id {
                total += instance.count;
            }
        }
    }
    total
}

/// Creates a default item of `template_id` in the lowest free bag slot.
/// Returns `None` (and creates nothing) when the bag is full.
pub fn add_item(world: &mut World, character: Entity, template_id: u32, count: i32) -> Option<Entity> {
    add_item_with(
        world,
        character,
        ItemInstance {
            template_id,
            count,
            ..Default::default()
        },
    )
}

/// Like [`add_item`], but with a fully-specified instance (durability,
/// bonuses, equip-slot hint).
pub fn add_item_with(world: &mut World, character: Entity, instance: ItemInstance) -> Option<Entity> {
    if instance.count <= 0 {
        return None;
    }
    let slot_index = find_free_slot(world, character)?;

    let item = world.registry.create();
    let item_id = instance.template_id;
    let count = instance.count;
    world.registry.items.insert(item, instance);
    world.registry.owners.insert(
        item,
        InventoryOwner {
            owner: Some(character),
            slot_index,
        },
    );
    world.dirty.mark_items(character);
    world.events.publish(WorldEvent::ItemAdded {
        character,
        item,
        item_id,
        count,
        slot_index,
    });
    Some(item)
}

/// Resolves ring/bracelet slot pairs: content hints at the left slot;
/// when it is taken and the right twin is free, the right one is used.
fn resolve_equip_slot(world: &World, character: Entity, hint: EquipSlot) -> EquipSlot {
    let Some(equipment) = world.registry.equipment.get(character) else {
        return hint;
    };
    let twin = match hint {
        EquipSlot::RingLeft => EquipSlot::RingRight,
        EquipSlot::BraceletLeft => EquipSlot::BraceletRight,
        _ => return hint,
    };
    if equipment.get(hint).is_some() && equipment.get(twin).is_none() {
        twin
    } else {
        hint
    }
}

/// Moves a bag item into the equipment slot named by its hint. An
/// occupied slot swaps its previous item back into the bag; the freed
/// source slot guarantees the swap always finds room.
pub fn equip_item(world: &mut World, character: Entity, item: Entity) -> bool {
    if !world.registry.is_alive(item) {
        return false;
    }
    let Some(hint) = world.registry.items.get(item).and_then(|i| i.equip_slot) else {
        return false;
    };
    let owned_slot = match world.registry.owners.get(item) {
        Some(owner) if owner.owner == Some(character) && owner.slot_index >= 0 => owner.slot_index,
        _ => return false,
    };
    if !world.registry.equipment.contains(character) {
        world
            .registry
            .equipment
            .insert(character, Default::default());
    }

    let slot = resolve_equip_slot(world, character, hint);

    // Lift the item out of its bag slot before looking for room so a
    // full bag can still swap.
    if let Some(owner) = world.registry.owners.get_mut(item) {
        owner.slot_index = -1;
    }

    let previous = world
        .registry
        .equipment
        .get_mut(character)
        .and_then(|equipment| equipment.set(slot, Some(item)));

    if let Some(previous) = previous {
        let free = find_free_slot(world, character).unwrap_or(owned_slot);
        if let Some(owner) = world.registry.owners.get_mut(previous) {
            owner.slot_index = free;
        }
    }

    let item_id = world
        .registry
        .items
        .get(item)
        .map(|i| i.template_id)
        .unwrap_or(0);
    world.dirty.mark_equipment(character);
    world.dirty.mark_items(character);
    world.events.publish(WorldEvent::ItemEquipped {
        character,
        item,
        item_id,
        slot,
    });
    true
}

/// Moves an equipped item back into the bag. Fails (leaving everything
/// unchanged) when the bag is full.
pub fn unequip_item(world: &mut World, character: Entity, slot: EquipSlot) -> bool {
    let Some(item) = world
        .registry
        .equipment
        .get(character)
        .and_then(|equipment| equipment.get(slot))
    else {
        return false;
    };
    let Some(slot_index) = find_free_slot(world, character) else {
        return false;
    };

    if let Some(equipment) = world.registry.equipment.get_mut(character) {
        equipment.set(slot, None);
    }
    if let Some(owner) = world.registry.owners.get_mut(item) {
        owner.slot_index = slot_index;
        owner.owner = Some(character);
    }

    let item_id = world
        .registry
        .items
        .get(item)
        .map(|i| i.template_id)
        .unwrap_or(0);
    world.dirty.mark_equipment(character);
    world.dirty.mark_items(character);
    world.events.publish(WorldEvent::ItemUnequipped {
        character,
        item,
        item_id,
        slot,
        slot_index,
    });
    true
}

/// Consumes `count` from a stack. The item entity is destroyed when the
/// stack empties.
pub fn use_item(world: &mut World, character: Entity, item: Entity, count: i32) -> bool {
    if count <= 0 {
        return false;
    }
    let owned = world
        .registry
        .owners
        .get(item)
        .is_some_and(|owner| owner.owner == Some(character));
    if !owned {
        return false;
    }
    let Some(instance) = world.registry.items.get_mut(item) else {
        return false;
    };
    if instance.count < count {
        return false;
    }
    instance.count -= count;
    let remaining = instance.count;
    let item_id = instance.template_id;
    let slot_index = world
        .registry
        .owners
        .get(item)
        .map(|owner| owner.slot_index)
        .unwrap_or(-1);

    if remaining == 0 {
        world.registry.destroy(item);
    }

    world.dirty.mark_items(character);
    world.events.publish(WorldEvent::ItemUsed {
        character,
        item,
        item_id,
        used_count: count,
        remaining_count: remaining,
        slot_index,
    });
    true
}

/// Releases an item onto the ground at the character's feet: ownership
/// clears, the entity stays valid.
pub fn drop_item(world: &mut World, character: Entity, item: Entity) -> bool {
    let owned = world
        .registry
        .owners
        .get(item)
        .is_some_and(|owner| owner.owner == Some(character));
    if !owned {
        return false;
    }

    let position = world.registry.transforms.get(character).map(|t| (t.position, t.map_id));
    if let Some(owner) = world.registry.owners.get_mut(item) {
        owner.owner = None;
        owner.slot_index = -1;
    }
    if let Some((position, map_id)) = position {
        world.registry.transforms.insert(
            item,
            crate::ecs::Transform {
                position,
                map_id,
                ..Default::default()
            },
        );
        world.grid.index(item, position);
    }

    let (item_id, count) = world
        .registry
        .items
        .get(item)
        .map(|i| (i.template_id, i.count))
        .unwrap_or((0, 0));
    world.dirty.mark_items(character);
    world.events.publish(WorldEvent::ItemDropped {
        character: Some(character),
        item,
        item_id,
        count,
    });
    true
}

/// Picks a ground item up into the bag, merging into an existing stack
/// of the same template when one exists.
pub fn pickup_item(world: &mut World, character: Entity, ground_item: Entity) -> bool {
    let on_ground = world
        .registry
        .owners
        .get(ground_item)
        .is_some_and(|owner| owner.owner.is_none());
    if !on_ground {
        return false;
    }
    let Some((item_id, count)) = world
        .registry
        .items
        .get(ground_item)
        .map(|i| (i.template_id, i.count))
    else {
        return false;
    };

    // Merge into an existing stack when possible.
    let existing = world.registry.owners.iter().find_map(|(item, owner)| {
        (owner.owner == Some(character)
            && owner.slot_index >= 0
            && world
                .registry
                .items
                .get(item)
                .is_some_and(|i| i.template_id == item_id))
        .then_some(item)
    });

    let slot_index = if let Some(existing) = existing {
        if let Some(instance) = world.registry.items.get_mut(existing) {
            instance.count += count;
        }
        let slot = world
            .registry
            .owners
            .get(existing)
            .map(|owner| owner.slot_index)
            .unwrap_or(-1);
        if let Some(transform) = world.registry.transforms.get(ground_item) {
            world.grid.unindex(ground_item, transform.position);
        }
        world.registry.destroy(ground_item);
        slot
    } else {
        let Some(slot) = find_free_slot(world, character) else {
            return false;
        };
        if let Some(transform) = world.registry.transforms.get(ground_item) {
            world.grid.unindex(ground_item, transform.position);
        }
        world.registry.transforms.remove(ground_item);
        if let Some(owner) = world.registry.owners.get_mut(ground_item) {
            owner.owner = Some(character);
            owner.slot_index = slot;
        }
        slot
    };

    world.dirty.mark_items(character);
    world.events.publish(WorldEvent::ItemPickedUp {
        character,
        item: ground_item,
        item_id,
        count,
        slot_index,
    });
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use emberfall_shared::types::TilePoint;

    fn character(world: &mut World) -> Entity {
        let entity = world.spawn_at(TilePoint::new(5, 5), 1);
        world
            .registry
            .equipment
            .insert(entity, Default::default());
        entity
    }

    fn drain_events(world: &mut World) -> Vec<WorldEvent> {
        let mut events = Vec::new();
        while let Some(event) = world.events.pop() {
            events.push(event);
        }
        events
    }

    #[test]
    fn add_item_fills_lowest_free_slot() {
        let mut world = World::new();
        let owner = character(&mut world);

        let first = add_item(&mut world, owner, 10, 1).unwrap();
        let second = add_item(&mut world, owner, 11, 1).unwrap();
        assert_eq!(world.registry.owners.get(first).unwrap().slot_index, 0);
        assert_eq!(world.registry.owners.get(second).unwrap().slot_index, 1);

        // Free slot 0; the next add should reuse it.
        assert!(use_item(&mut world, owner, first, 1));
        let third = add_item(&mut world, owner, 12, 1).unwrap();
        assert_eq!(world.registry.owners.get(third).unwrap().slot_index, 0);
    }

    #[test]
    fn add_item_fails_on_a_full_bag_without_creating_anything() {
        let mut world = World::new();
        let owner = character(&mut world);
        for template in 0..MAX_INVENTORY_SIZE as u32 {
            assert!(add_item(&mut world, owner, 100 + template, 1).is_some());
        }
        let alive_before = world.registry.alive_count();
        assert!(add_item(&mut world, owner, 999, 1).is_none());
        assert_eq!(world.registry.alive_count(), alive_before);
    }

    #[test]
    fn equip_swaps_the_previous_item_back_to_the_bag() {
        let mut world = World::new();
        let owner = character(&mut world);
        let sword = add_item_with(
            &mut world,
            owner,
            ItemInstance {
                template_id: 1,
                equip_slot: Some(EquipSlot::Weapon),
                ..Default::default()
            },
        )
        .unwrap();
        let axe = add_item_with(
            &mut world,
            owner,
            ItemInstance {
                template_id: 2,
                equip_slot: Some(EquipSlot::Weapon),
                ..Default::default()
            },
        )
        .unwrap();

        assert!(equip_item(&mut world, owner, sword));
        assert!(equip_item(&mut world, owner, axe));

        let equipment = world.registry.equipment.get(owner).unwrap();
        assert_eq!(equipment.get(EquipSlot::Weapon), Some(axe));
        // The sword went back to a bag slot.
        let sword_owner = world.registry.owners.get(sword).unwrap();
        assert_eq!(sword_owner.owner, Some(owner));
        assert!(sword_owner.slot_index >= 0);
    }

    #[test]
    fn equip_then_unequip_restores_a_bag_slot() {
        let mut world = World::new();
        let owner = character(&mut world);
        let sword = add_item_with(
            &mut world,
            owner,
            ItemInstance {
                template_id: 1,
                equip_slot: Some(EquipSlot::Weapon),
                ..Default::default()
            },
        )
        .unwrap();

        assert!(equip_item(&mut world, owner, sword));
        assert_eq!(world.registry.owners.get(sword).unwrap().slot_index, -1);
        assert!(unequip_item(&mut world, owner, EquipSlot::Weapon));
        assert_eq!(world.registry.owners.get(sword).unwrap().slot_index, 0);
    }

    #[test]
    fn rings_fill_left_then_right() {
        let mut world = World::new();
        let owner = character(&mut world);
        let left = add_item_with(
            &mut world,
            owner,
            ItemInstance {
                template_id: 1,
                equip_slot: Some(EquipSlot::RingLeft),
                ..Default::default()
            },
        )
        .unwrap();
        let right = add_item_with(
            &mut world,
            owner,
            ItemInstance {
                template_id: 2,
                equip_slot: Some(EquipSlot::RingLeft),
                ..Default::default()
            },
        )
        .unwrap();

        assert!(equip_item(&mut world, owner, left));
        assert!(equip_item(&mut world, owner, right));
        let equipment = world.registry.equipment.get(owner).unwrap();
        assert_eq!(equipment.get(EquipSlot::RingLeft), Some(left));
        assert_eq!(equipment.get(EquipSlot::RingRight), Some(right));
    }

    #[test]
    fn using_the_whole_stack_destroys_the_item() {
        let mut world = World::new();
        let owner = character(&mut world);
        let potion = add_item(&mut world, owner, 50, 3).unwrap();
        drain_events(&mut world);

        assert!(use_item(&mut world, owner, potion, 3));
        assert!(!world.registry.is_alive(potion));
        match drain_events(&mut world).as_slice() {
            [WorldEvent::ItemUsed {
                remaining_count, ..
            }] => assert_eq!(*remaining_count, 0),
            other => panic!("expected one ItemUsed event, got {other:?}"),
        }
    }

    #[test]
    fn drop_clears_ownership_but_keeps_the_entity() {
        let mut world = World::new();
        let owner = character(&mut world);
        let loot = add_item(&mut world, owner, 60, 1).unwrap();

        assert!(drop_item(&mut world, owner, loot));
        assert!(world.registry.is_alive(loot));
        let ownership = world.registry.owners.get(loot).unwrap();
        assert_eq!(ownership.owner, None);
        assert_eq!(ownership.slot_index, -1);
        // Ground items are visible at the character's tile.
        assert!(world
            .grid
            .query_at(TilePoint::new(5, 5))
            .contains(&loot));
    }

    #[test]
    fn counting_spans_bag_and_equipment() {
        let mut world = World::new();
        let owner = character(&mut world);
        let potions = add_item(&mut world, owner, 70, 2).unwrap();
        let sword = add_item_with(
            &mut world,
            owner,
            ItemInstance {
                template_id: 70,
                equip_slot: Some(EquipSlot::Weapon),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(equip_item(&mut world, owner, sword));

        // Two in the bag stack plus the equipped copy.
        assert_eq!(count_item(&world, owner, 70), 3);
        assert_eq!(item_in_slot(&world, owner, 0), Some(potions));
        assert_eq!(item_in_slot(&world, owner, 1), None);
    }

    #[test]
    fn pickup_merges_matching_stacks() {
        let mut world = World::new();
        let owner = character(&mut world);
        let bag_stack = add_item(&mut world, owner, 70, 2).unwrap();

        let ground = world.spawn_at(TilePoint::new(5, 5), 1);
        world.registry.items.insert(
            ground,
            ItemInstance {
                template_id: 70,
                count: 3,
                ..Default::default()
            },
        );
        world
            .registry
            .owners
            .insert(ground, InventoryOwner::default());

        assert!(pickup_item(&mut world, owner, ground));
        assert_eq!(world.registry.items.get(bag_stack).unwrap().count, 5);
        assert!(!world.registry.is_alive(ground));
    }
}
