use emberfall_shared::config::DropTable;
use emberfall_shared::types::TilePoint;

use crate::combat::CombatRng;
use crate::ecs::{InventoryOwner, ItemInstance, World, WorldEvent};
use crate::systems::{System, SystemContext};

/// Rolls loot when monsters die. Each table entry is an independent
/// chance; survivors materialize as ground-item entities on the death
/// tile.
pub struct MonsterDropSystem;

impl MonsterDropSystem {
    pub fn new() -> Self {
        Self
    }

    fn roll_drops(
        world: &mut World,
        rng: &mut dyn CombatRng,
        table: &DropTable,
        position: TilePoint,
        map_id: u32,
    ) {
        for entry in &table.items {
            if rng.chance() >= entry.drop_rate {
                continue;
            }
            let min = entry.min_count.max(1);
            let max = entry.max_count.max(min);
            let count = rng.range_i32(min, max);
            if count <= 0 {
                continue;
            }

            let loot = world.spawn_at(position, map_id);
            world.registry.items.insert(
                loot,
                ItemInstance {
                    template_id: entry.item_id,
                    count,
                    ..Default::default()
                },
            );
            world
                .registry
                .owners
                .insert(loot, InventoryOwner::default());

            world.events.publish(WorldEvent::ItemDropped {
                character: None,
                item: loot,
                item_id: entry.item_id,
                count,
            });
        }
    }
}

impl Default for MonsterDropSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for MonsterDropSystem {
    fn name(&self) -> &'static str {
        "monster_drop"
    }

    fn run(&mut self, _ctx: &mut SystemContext<'_>) {}

    fn handle_event(&mut self, ctx: &mut SystemContext<'_>, event: &WorldEvent) {
        let WorldEvent::EntityDeath {
            entity,
            position,
            map_id,
            ..
        } = event
        else {
            return;
        };
        let Some(identity) = ctx.world.registry.monster_identities.get(*entity) else {
            return;
        };
        if identity.template_id == 0 {
            return;
        }
        let registries = ctx.registries;
        let Some(table) = registries.drops.get(identity.template_id) else {
            return;
        };

        Self::roll_drops(ctx.world, ctx.rng, table, *position, *map_id);
    }
}
