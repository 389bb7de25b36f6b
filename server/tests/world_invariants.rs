//! Invariant sweeps under randomized operation sequences: spatial-grid
//! membership stays consistent with transforms, and hp/mp never leave
//! their bounds no matter how the resolver is hammered.

use emberfall_server::combat::{self, CombatRng, SeededRng};
use emberfall_server::ecs::{Attributes, Combat, Entity, World};
use emberfall_shared::types::TilePoint;

fn assert_grid_consistent(world: &World, entities: &[Entity]) {
    for &entity in entities {
        let Some(transform) = world.registry.transforms.get(entity) else {
            continue;
        };
        assert_eq!(
            world.grid.position_of(entity),
            Some(transform.position),
            "grid position diverged from the transform"
        );
        assert!(
            world.grid.query_at(transform.position).contains(&entity),
            "entity missing from its own cell"
        );
    }
}

#[test]
fn random_movement_keeps_grid_membership_unique() {
    let mut world = World::new();
    let mut rng = SeededRng::new(0x5EED);

    let entities: Vec<Entity> = (0..32)
        .map(|index| world.spawn_at(TilePoint::new(index % 8, index / 8), 1))
        .collect();

    for _ in 0..2_000 {
        let which = rng.range_i32(0, entities.len() as i32 - 1) as usize;
        let target = TilePoint::new(rng.range_i32(0, 63), rng.range_i32(0, 63));
        world.set_position(entities[which], target);
    }

    assert_grid_consistent(&world, &entities);
    assert_eq!(world.grid.len(), entities.len());
}

#[test]
fn hp_and_mp_never_leave_their_bounds() {
    let mut world = World::new();
    let mut rng = SeededRng::new(0xFADE);

    let mut fighters = Vec::new();
    for index in 0..8 {
        let entity = world.spawn_at(TilePoint::new(index, 0), 1);
        world.registry.attributes.insert(
            entity,
            Attributes {
                hp: 80,
                max_hp: 80,
                mp: 40,
                max_mp: 40,
                attack: 10,
                defense: 2,
                ..Default::default()
            },
        );
        world.registry.combat.insert(
            entity,
            Combat {
                attack_range: 8,
                ..Default::default()
            },
        );
        fighters.push(entity);
    }

    for round in 0..3_000 {
        let entity = fighters[round % fighters.len()];
        match rng.range_i32(0, 4) {
            0 => {
                combat::take_damage(&mut world, entity, rng.range_i32(-5, 30), None);
            }
            1 => {
                combat::heal(&mut world, entity, rng.range_i32(-5, 50));
            }
            2 => {
                combat::restore_mp(&mut world, entity, rng.range_i32(-5, 30));
            }
            3 => {
                combat::consume_mp(&mut world, entity, rng.range_i32(0, 20));
            }
            _ => {
                let other = fighters[rng.range_i32(0, fighters.len() as i32 - 1) as usize];
                if other != entity {
                    let config = combat::CombatConfig::default();
                    let _ = combat::execute_attack(&mut world, entity, other, &config, &mut rng);
                }
            }
        }

        // Drain death events so the queue does not grow unbounded.
        while world.events.pop().is_some() {}

        for &fighter in &fighters {
            let attributes = world.registry.attributes.get(fighter).unwrap();
            assert!(
                attributes.hp >= 0 && attributes.hp <= attributes.max_hp,
                "hp out of bounds: {}",
                attributes.hp
            );
            assert!(
                attributes.mp >= 0 && attributes.mp <= attributes.max_mp,
                "mp out of bounds: {}",
                attributes.mp
            );
        }
    }
}
