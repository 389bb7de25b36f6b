use emberfall_shared::types::{chebyshev_distance, TilePoint};

use crate::combat::attack_type::{attack_modifier, AttackModifier, AttackType};
use crate::combat::rng::CombatRng;
use crate::combat::{AttackError, AttackOutcome, CombatConfig, DamageResult};
use crate::ecs::{
    ActiveEffect, EffectKind, EffectList, Entity, ItemBonuses, Registry, World, WorldEvent,
};

/// Ring shape codes with special combat effects.
const STUN_RING_SHAPE: i32 = 113;
const REVIVE_RING_SHAPE: i32 = 114;

const STUN_RING_CHANCE: f32 = 0.10;
const STUN_DURATION_SECS: f32 = 3.0;
const REVIVE_HP_PERCENT: f32 = 0.30;

/// Attack/defense/chance inputs after all bonuses are folded in.
#[derive(Clone, Copy, Debug, Default)]
pub struct DamageInput {
    pub attack: i32,
    pub defense: i32,
    pub critical_chance: f32,
    pub miss_chance: f32,
}

/// Sums the equipped items' bonuses for one entity. Stale item handles
/// contribute nothing.
pub fn equipment_bonus(registry: &Registry, entity: Entity) -> ItemBonuses {
    let mut total = ItemBonuses::default();
    let Some(equipment) = registry.equipment.get(entity) else {
        return total;
    };
    for (_, item_entity) in equipment.iter() {
        if !registry.is_alive(item_entity) {
            continue;
        }
        let Some(item) = registry.items.get(item_entity) else {
            continue;
        };
        let b = item.bonuses;
        total.attack += b.attack;
        total.defense += b.defense;
        total.magic_attack += b.magic_attack;
        total.magic_defense += b.magic_defense;
        total.hp += b.hp;
        total.mp += b.mp;
        total.hit_rate += b.hit_rate;
        total.dodge += b.dodge;
        total.speed += b.speed;
        total.lifesteal_percent += b.lifesteal_percent;
        total.reflect_percent += b.reflect_percent;
        total.elemental_damage += b.elemental_damage;
    }
    total
}

/// Whether either ring slot holds an item with the given shape code.
fn has_ring_with_shape(registry: &Registry, entity: Entity, shape: i32) -> bool {
    use emberfall_shared::types::EquipSlot;

    let Some(equipment) = registry.equipment.get(entity) else {
        return false;
    };
    [EquipSlot::RingLeft, EquipSlot::RingRight]
        .into_iter()
        .filter_map(|slot| equipment.get(slot))
        .filter(|ring| registry.is_alive(*ring))
        .filter_map(|ring| registry.items.get(ring))
        .any(|item| item.shape == shape)
}

pub fn build_damage_input(
    registry: &Registry,
    attacker: Entity,
    defender: Entity,
    config: &CombatConfig,
) -> DamageInput {
    let attacker_attributes = registry.attributes.get(attacker);
    let defender_attributes = registry.attributes.get(defender);
    let attacker_equip = equipment_bonus(registry, attacker);
    let defender_equip = equipment_bonus(registry, defender);
    let attacker_passive = registry.modifiers.get(attacker).copied().unwrap_or_default();

    let mut input = DamageInput {
        attack: attacker_attributes.map_or(0, |a| a.attack)
            + attacker_equip.attack
            + attacker_passive.attack,
        defense: defender_attributes.map_or(0, |a| a.defense) + defender_equip.defense,
        critical_chance: config.base_critical_chance
            + registry.combat.get(attacker).map_or(0.0, |c| c.critical_chance)
            + attacker_passive.critical_chance,
        miss_chance: config.base_miss_chance
            + registry.combat.get(defender).map_or(0.0, |c| c.evasion_chance),
    };
    // Hit-rate bonuses shave the defender's effective evasion.
    input.miss_chance -= attacker_passive.hit_rate as f32 * 0.01;
    input.miss_chance = input.miss_chance.max(0.0);
    input
}

/// The core damage pipeline: clamped base, miss roll, variance roll,
/// critical roll, minimum 1 on a landed hit. Roll order is part of the
/// contract (tests script it).
pub fn roll_damage(
    input: DamageInput,
    config: &CombatConfig,
    rng: &mut dyn CombatRng,
    miss_chance_delta: f32,
) -> DamageResult {
    let base = (input.attack - input.defense).max(0);

    let miss_chance = (input.miss_chance + miss_chance_delta).clamp(0.0, 1.0);
    if rng.chance() < miss_chance {
        return DamageResult::miss();
    }

    let spread = base.max(1) as f32 * config.variance_pct;
    let variance = rng.range_f32(-spread, spread).round() as i32;

    let is_critical = rng.chance() < input.critical_chance;
    let mut final_damage = base + variance;
    if is_critical {
        final_damage = (final_damage as f32 * config.critical_multiplier) as i32;
    }

    DamageResult {
        base_damage: base,
        variance,
        final_damage: final_damage.max(1),
        is_critical,
        is_miss: false,
    }
}

/// Applies raw damage to an entity. Ignored when `damage <= 0` or the
/// target is already dead; a landed application is always at least 1.
/// A hit that would be fatal is absorbed by an equipped revive ring;
/// otherwise death at hp 0 publishes `EntityDeath`.
pub fn take_damage(world: &mut World, target: Entity, damage: i32, killer: Option<Entity>) -> i32 {
    let Some(attributes) = world.registry.attributes.get_mut(target) else {
        return 0;
    };
    if damage <= 0 || attributes.hp <= 0 {
        return 0;
    }

    let actual = damage.max(1);
    let new_hp = (attributes.hp - actual).max(0);
    attributes.hp = new_hp;
    let max_hp = attributes.max_hp;
    world.dirty.mark_attributes(target);

    if new_hp == 0 {
        if has_ring_with_shape(&world.registry, target, REVIVE_RING_SHAPE) {
            let revived = ((max_hp as f32 * REVIVE_HP_PERCENT) as i32).max(1);
            if let Some(attributes) = world.registry.attributes.get_mut(target) {
                attributes.hp = revived;
            }
            return actual;
        }

        let (position, map_id) = world
            .registry
            .transforms
            .get(target)
            .map(|t| (t.position, t.map_id))
            .unwrap_or((TilePoint::new(0, 0), 0));
        world.events.publish(WorldEvent::EntityDeath {
            entity: target,
            killer,
            position,
            map_id,
        });
    }

    actual
}

/// Restores hp, clamped to the maximum. No effect on the dead.
pub fn heal(world: &mut World, entity: Entity, amount: i32) -> i32 {
    let Some(attributes) = world.registry.attributes.get_mut(entity) else {
        return 0;
    };
    if amount <= 0 || attributes.hp <= 0 {
        return 0;
    }
    let old = attributes.hp;
    attributes.hp = (attributes.hp + amount).min(attributes.max_hp);
    let healed = attributes.hp - old;
    if healed != 0 {
        world.dirty.mark_attributes(entity);
    }
    healed
}

/// Restores mp, clamped to the maximum.
pub fn restore_mp(world: &mut World, entity: Entity, amount: i32) -> i32 {
    let Some(attributes) = world.registry.attributes.get_mut(entity) else {
        return 0;
    };
    if amount <= 0 {
        return 0;
    }
    let old = attributes.mp;
    attributes.mp = (attributes.mp + amount).min(attributes.max_mp);
    let restored = attributes.mp - old;
    if restored != 0 {
        world.dirty.mark_attributes(entity);
    }
    restored
}

/// Spends mp. Succeeds only when the full amount is available.
pub fn consume_mp(world: &mut World, entity: Entity, amount: i32) -> bool {
    let Some(attributes) = world.registry.attributes.get_mut(entity) else {
        return false;
    };
    if amount <= 0 {
        return true;
    }
    if attributes.mp < amount {
        return false;
    }
    attributes.mp -= amount;
    world.dirty.mark_attributes(entity);
    true
}

/// Explicit kill: forces hp to 0 and publishes `EntityDeath`. Unlike a
/// fatal hit, this path is not absorbed by a revive ring.
pub fn die(world: &mut World, entity: Entity, killer: Option<Entity>) {
    let Some(attributes) = world.registry.attributes.get_mut(entity) else {
        return;
    };
    if attributes.hp <= 0 {
        return;
    }
    attributes.hp = 0;
    world.dirty.mark_attributes(entity);

    let (position, map_id) = world
        .registry
        .transforms
        .get(entity)
        .map(|t| (t.position, t.map_id))
        .unwrap_or((TilePoint::new(0, 0), 0));
    world.events.publish(WorldEvent::EntityDeath {
        entity,
        killer,
        position,
        map_id,
    });
}

/// Brings an entity back at a position with percentage hp/mp, at least
/// 1 hp. Publishes `EntityRespawn`.
pub fn respawn(
    world: &mut World,
    entity: Entity,
    position: TilePoint,
    hp_percent: f32,
    mp_percent: f32,
) {
    if !world.set_position(entity, position) {
        return;
    }
    let map_id = world
        .registry
        .transforms
        .get(entity)
        .map(|t| t.map_id)
        .unwrap_or(0);

    let Some(attributes) = world.registry.attributes.get_mut(entity) else {
        return;
    };
    let hp_percent = hp_percent.clamp(0.0, 1.0);
    let mp_percent = mp_percent.clamp(0.0, 1.0);
    attributes.hp = ((attributes.max_hp as f32 * hp_percent) as i32).max(1);
    attributes.mp = (attributes.max_mp as f32 * mp_percent) as i32;
    world.dirty.mark_attributes(entity);

    world.events.publish(WorldEvent::EntityRespawn {
        entity,
        position,
        map_id,
        hp_percent,
        mp_percent,
    });
}

fn attack_range_of(registry: &Registry, entity: Entity, config: &CombatConfig) -> i32 {
    registry
        .combat
        .get(entity)
        .map_or(config.default_melee_range, |c| c.attack_range)
        .max(0)
}

fn validate_attack(
    registry: &Registry,
    attacker: Entity,
    target: Entity,
) -> Result<(TilePoint, TilePoint), AttackError> {
    let attacker_attributes = registry
        .attributes
        .get(attacker)
        .ok_or(AttackError::AttackerInvalid)?;
    let attacker_transform = registry
        .transforms
        .get(attacker)
        .ok_or(AttackError::AttackerInvalid)?;
    if attacker_attributes.hp <= 0 {
        return Err(AttackError::AttackerInvalid);
    }

    if !registry.is_alive(target) {
        return Err(AttackError::TargetNotFound);
    }
    let target_attributes = registry
        .attributes
        .get(target)
        .ok_or(AttackError::TargetNotFound)?;
    let target_transform = registry
        .transforms
        .get(target)
        .ok_or(AttackError::TargetNotFound)?;
    if target_attributes.hp <= 0 {
        return Err(AttackError::TargetDead);
    }

    if attacker_transform.map_id != target_transform.map_id {
        return Err(AttackError::TargetOutOfRange);
    }

    Ok((attacker_transform.position, target_transform.position))
}

/// Resolves a plain single-target attack.
pub fn execute_attack(
    world: &mut World,
    attacker: Entity,
    target: Entity,
    config: &CombatConfig,
    rng: &mut dyn CombatRng,
) -> Result<AttackOutcome, AttackError> {
    let (attacker_pos, target_pos) = validate_attack(&world.registry, attacker, target)?;

    let range = attack_range_of(&world.registry, attacker, config);
    if chebyshev_distance(attacker_pos, target_pos) > range {
        return Err(AttackError::TargetOutOfRange);
    }

    let input = build_damage_input(&world.registry, attacker, target, config);
    let result = roll_damage(input, config, rng, 0.0);

    if !result.is_miss {
        take_damage(world, target, result.final_damage, Some(attacker));
        apply_stun_ring(world, attacker, target, rng);
        world.events.publish(WorldEvent::DamageDealt {
            attacker,
            target,
            damage: result.final_damage,
            critical: result.is_critical,
        });
    }

    let target_died = world
        .registry
        .attributes
        .get(target)
        .is_some_and(|a| a.hp <= 0);
    Ok(AttackOutcome {
        damage: result,
        target_died,
    })
}

/// Resolves an attack with shape modifiers: multi-strike, AOE, range
/// override, damage scalar, and hit-chance tweak. Sub-hits resolve
/// independently; the returned result aggregates the primary target.
pub fn process_attack_with_type(
    world: &mut World,
    attacker: Entity,
    target: Entity,
    config: &CombatConfig,
    attack_type: AttackType,
    rng: &mut dyn CombatRng,
) -> Result<AttackOutcome, AttackError> {
    process_attack_with_modifier(world, attacker, target, config, &attack_modifier(attack_type), rng)
}

/// Modifier-level entry point behind [`process_attack_with_type`].
/// Skill casts come through here directly so the skill template's range
/// and damage scalar govern resolution.
pub fn process_attack_with_modifier(
    world: &mut World,
    attacker: Entity,
    target: Entity,
    config: &CombatConfig,
    modifier: &AttackModifier,
    rng: &mut dyn CombatRng,
) -> Result<AttackOutcome, AttackError> {
    let (attacker_pos, target_pos) = validate_attack(&world.registry, attacker, target)?;

    let range = attack_range_of(&world.registry, attacker, config)
        .max(modifier.range_override.unwrap_or(0));
    if chebyshev_distance(attacker_pos, target_pos) > range {
        return Err(AttackError::TargetOutOfRange);
    }

    let targets = match modifier.aoe_radius {
        Some(radius) => collect_aoe_targets(world, attacker, target, target_pos, radius),
        None => vec![target],
    };
    if targets.is_empty() {
        return Err(AttackError::TargetNotFound);
    }

    let mut primary = DamageResult::miss();
    for current in targets {
        let totals = strike_target(world, attacker, current, config, modifier, rng);
        if current == target {
            primary = totals;
        }
    }

    let target_died = world
        .registry
        .attributes
        .get(target)
        .is_some_and(|a| a.hp <= 0);
    Ok(AttackOutcome {
        damage: primary,
        target_died,
    })
}

/// Runs `hit_count` independent sub-hits against one target and returns
/// the aggregated result for it.
fn strike_target(
    world: &mut World,
    attacker: Entity,
    target: Entity,
    config: &CombatConfig,
    modifier: &AttackModifier,
    rng: &mut dyn CombatRng,
) -> DamageResult {
    let mut total = DamageResult::miss();

    for _ in 0..modifier.hit_count {
        let still_alive = world
            .registry
            .attributes
            .get(target)
            .is_some_and(|a| a.hp > 0);
        if !still_alive {
            break;
        }

        let input = build_damage_input(&world.registry, attacker, target, config);
        let mut hit = roll_damage(input, config, rng, modifier.miss_chance_delta);
        if hit.is_miss {
            continue;
        }

        hit.final_damage = ((hit.final_damage as f32 * modifier.damage_scalar) as i32).max(1);
        take_damage(world, target, hit.final_damage, Some(attacker));
        apply_stun_ring(world, attacker, target, rng);
        world.events.publish(WorldEvent::DamageDealt {
            attacker,
            target,
            damage: hit.final_damage,
            critical: hit.is_critical,
        });

        total.base_damage += hit.base_damage;
        total.variance += hit.variance;
        total.final_damage += hit.final_damage;
        total.is_critical = total.is_critical || hit.is_critical;
        total.is_miss = false;
    }

    total
}

/// Live, same-map entities in the Chebyshev square around the impact
/// tile. The primary target leads; the rest follow in handle order so
/// resolution is deterministic.
fn collect_aoe_targets(
    world: &World,
    attacker: Entity,
    primary: Entity,
    center: TilePoint,
    radius: i32,
) -> Vec<Entity> {
    let attacker_map = world
        .registry
        .transforms
        .get(attacker)
        .map(|t| t.map_id)
        .unwrap_or(0);

    let mut others: Vec<Entity> = world
        .grid
        .query_range(center, radius.max(0))
        .into_iter()
        .filter(|entity| *entity != attacker && *entity != primary)
        .filter(|entity| {
            world
                .registry
                .attributes
                .get(*entity)
                .is_some_and(|a| a.hp > 0)
                && world
                    .registry
                    .transforms
                    .get(*entity)
                    .is_some_and(|t| t.map_id == attacker_map)
        })
        .collect();
    others.sort();

    let mut targets = Vec::with_capacity(others.len() + 1);
    let primary_alive = world
        .registry
        .attributes
        .get(primary)
        .is_some_and(|a| a.hp > 0);
    if primary_alive {
        targets.push(primary);
    }
    targets.extend(others);
    targets
}

/// Stun-ring (shape 113) post-hit check: 10% to stun the target for a
/// few seconds.
fn apply_stun_ring(world: &mut World, attacker: Entity, target: Entity, rng: &mut dyn CombatRng) {
    if !has_ring_with_shape(&world.registry, attacker, STUN_RING_SHAPE) {
        return;
    }
    if rng.chance() >= STUN_RING_CHANCE {
        return;
    }
    if !world.registry.effects.contains(target) {
        world.registry.effects.insert(target, EffectList::default());
    }
    let effects = world
        .registry
        .effects
        .get_mut(target)
        .expect("effect list present");
    effects.add(ActiveEffect {
        kind: EffectKind::Stun,
        source: Some(attacker),
        remaining_secs: STUN_DURATION_SECS,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::rng::ScriptedRng;
    use crate::ecs::{Attributes, Combat};

    fn spawn_fighter(world: &mut World, pos: TilePoint, attack: i32, defense: i32) -> Entity {
        let entity = world.spawn_at(pos, 1);
        world.registry.attributes.insert(
            entity,
            Attributes {
                hp: 100,
                max_hp: 100,
                mp: 50,
                max_mp: 50,
                attack,
                defense,
                ..Default::default()
            },
        );
        world.registry.combat.insert(
            entity,
            Combat {
                attack_range: 3,
                ..Default::default()
            },
        );
        entity
    }

    #[test]
    fn zero_damage_is_ignored() {
        let mut world = World::new();
        let target = spawn_fighter(&mut world, TilePoint::new(0, 0), 5, 5);
        assert_eq!(take_damage(&mut world, target, 0, None), 0);
        assert_eq!(world.registry.attributes.get(target).unwrap().hp, 100);
        assert!(!world.dirty.flags(target).attributes);
    }

    #[test]
    fn damage_clamps_at_zero_and_publishes_death() {
        let mut world = World::new();
        let target = spawn_fighter(&mut world, TilePoint::new(2, 3), 5, 5);
        let applied = take_damage(&mut world, target, 500, None);
        assert_eq!(applied, 500);
        assert_eq!(world.registry.attributes.get(target).unwrap().hp, 0);

        match world.events.pop() {
            Some(WorldEvent::EntityDeath {
                entity, position, ..
            }) => {
                assert_eq!(entity, target);
                assert_eq!(position, TilePoint::new(2, 3));
            }
            other => panic!("expected death event, got {other:?}"),
        }
    }

    #[test]
    fn outmatched_defense_still_deals_at_least_one() {
        let mut world = World::new();
        let attacker = spawn_fighter(&mut world, TilePoint::new(0, 0), 3, 0);
        let target = spawn_fighter(&mut world, TilePoint::new(1, 0), 0, 999);

        // miss roll high (no miss), variance mid, crit roll high (no crit)
        let mut rng = ScriptedRng::new([0.9, 0.5, 0.9]);
        let outcome = execute_attack(
            &mut world,
            attacker,
            target,
            &CombatConfig::default(),
            &mut rng,
        )
        .unwrap();
        assert!(!outcome.damage.is_miss);
        assert!(outcome.damage.final_damage >= 1);
        assert_eq!(outcome.damage.base_damage, 0);
    }

    #[test]
    fn attack_out_of_range_is_rejected_without_events() {
        let mut world = World::new();
        let attacker = spawn_fighter(&mut world, TilePoint::new(0, 0), 10, 0);
        let target = spawn_fighter(&mut world, TilePoint::new(0, 5), 10, 0);

        let mut rng = ScriptedRng::default();
        let result = execute_attack(
            &mut world,
            attacker,
            target,
            &CombatConfig::default(),
            &mut rng,
        );
        assert_eq!(result, Err(AttackError::TargetOutOfRange));
        assert!(world.events.is_empty());
    }

    #[test]
    fn dead_target_is_reported_dead() {
        let mut world = World::new();
        let attacker = spawn_fighter(&mut world, TilePoint::new(0, 0), 10, 0);
        let target = spawn_fighter(&mut world, TilePoint::new(1, 0), 10, 0);
        world.registry.attributes.get_mut(target).unwrap().hp = 0;

        let mut rng = ScriptedRng::default();
        let result = execute_attack(
            &mut world,
            attacker,
            target,
            &CombatConfig::default(),
            &mut rng,
        );
        assert_eq!(result, Err(AttackError::TargetDead));
    }

    #[test]
    fn cross_map_attack_is_out_of_range() {
        let mut world = World::new();
        let attacker = spawn_fighter(&mut world, TilePoint::new(0, 0), 10, 0);
        let target = spawn_fighter(&mut world, TilePoint::new(1, 0), 10, 0);
        world.registry.transforms.get_mut(target).unwrap().map_id = 2;

        let mut rng = ScriptedRng::default();
        assert_eq!(
            execute_attack(
                &mut world,
                attacker,
                target,
                &CombatConfig::default(),
                &mut rng
            ),
            Err(AttackError::TargetOutOfRange)
        );
    }

    #[test]
    fn miss_roll_prevents_damage_and_events() {
        let mut world = World::new();
        let attacker = spawn_fighter(&mut world, TilePoint::new(0, 0), 10, 0);
        let target = spawn_fighter(&mut world, TilePoint::new(1, 0), 10, 0);

        let mut rng = ScriptedRng::new([0.0]); // under the miss chance
        let outcome = execute_attack(
            &mut world,
            attacker,
            target,
            &CombatConfig::default(),
            &mut rng,
        )
        .unwrap();
        assert!(outcome.damage.is_miss);
        assert_eq!(world.registry.attributes.get(target).unwrap().hp, 100);
        assert!(world.events.is_empty());
    }

    #[test]
    fn critical_multiplies_damage() {
        let mut world = World::new();
        let attacker = spawn_fighter(&mut world, TilePoint::new(0, 0), 40, 0);
        let target = spawn_fighter(&mut world, TilePoint::new(1, 0), 0, 10);

        // no miss, zero variance, crit
        let mut rng = ScriptedRng::new([0.9, 0.5, 0.0]);
        let outcome = execute_attack(
            &mut world,
            attacker,
            target,
            &CombatConfig::default(),
            &mut rng,
        )
        .unwrap();
        assert!(outcome.damage.is_critical);
        assert_eq!(outcome.damage.final_damage, 45); // (40 - 10) * 1.5
    }

    #[test]
    fn heal_is_clamped_and_dead_stay_dead() {
        let mut world = World::new();
        let entity = spawn_fighter(&mut world, TilePoint::new(0, 0), 5, 5);
        world.registry.attributes.get_mut(entity).unwrap().hp = 95;
        assert_eq!(heal(&mut world, entity, 50), 5);

        world.registry.attributes.get_mut(entity).unwrap().hp = 0;
        assert_eq!(heal(&mut world, entity, 50), 0);
    }

    #[test]
    fn consume_mp_requires_full_amount() {
        let mut world = World::new();
        let entity = spawn_fighter(&mut world, TilePoint::new(0, 0), 5, 5);
        assert!(consume_mp(&mut world, entity, 50));
        assert!(!consume_mp(&mut world, entity, 1));
        assert_eq!(restore_mp(&mut world, entity, 20), 20);
        assert_eq!(world.registry.attributes.get(entity).unwrap().mp, 20);
    }

    #[test]
    fn respawn_restores_percentages_with_at_least_one_hp() {
        let mut world = World::new();
        let entity = spawn_fighter(&mut world, TilePoint::new(0, 0), 5, 5);
        die(&mut world, entity, None);
        world.events.pop();

        respawn(&mut world, entity, TilePoint::new(7, 7), 0.0, 0.5);
        let attributes = world.registry.attributes.get(entity).unwrap();
        assert_eq!(attributes.hp, 1);
        assert_eq!(attributes.mp, 25);
        assert_eq!(
            world.registry.transforms.get(entity).unwrap().position,
            TilePoint::new(7, 7)
        );
        assert!(matches!(
            world.events.pop(),
            Some(WorldEvent::EntityRespawn { .. })
        ));
    }

    #[test]
    fn twin_strike_lands_two_sub_hits() {
        let mut world = World::new();
        let attacker = spawn_fighter(&mut world, TilePoint::new(0, 0), 30, 0);
        let target = spawn_fighter(&mut world, TilePoint::new(1, 0), 0, 0);

        // two sub-hits: (miss, variance, crit) each, all landing plain
        let mut rng = ScriptedRng::new([0.9, 0.5, 0.9, 0.9, 0.5, 0.9]);
        let outcome = process_attack_with_type(
            &mut world,
            attacker,
            target,
            &CombatConfig::default(),
            AttackType::TwinStrike,
            &mut rng,
        )
        .unwrap();

        // 30 base scaled by 0.6 per hit = 18, twice
        assert_eq!(outcome.damage.final_damage, 36);
        assert_eq!(world.registry.attributes.get(target).unwrap().hp, 100 - 36);
    }

    #[test]
    fn sweep_hits_neighbors_in_the_square() {
        let mut world = World::new();
        let attacker = spawn_fighter(&mut world, TilePoint::new(0, 0), 20, 0);
        let primary = spawn_fighter(&mut world, TilePoint::new(2, 0), 0, 0);
        let bystander = spawn_fighter(&mut world, TilePoint::new(3, 1), 0, 0);
        let far = spawn_fighter(&mut world, TilePoint::new(9, 9), 0, 0);

        // two targets resolve: rolls for primary then bystander
        let mut rng = ScriptedRng::new([0.9, 0.5, 0.9, 0.9, 0.5, 0.9]);
        let outcome = process_attack_with_type(
            &mut world,
            attacker,
            primary,
            &CombatConfig::default(),
            AttackType::Sweep,
            &mut rng,
        )
        .unwrap();

        assert!(!outcome.damage.is_miss);
        assert!(world.registry.attributes.get(primary).unwrap().hp < 100);
        assert!(world.registry.attributes.get(bystander).unwrap().hp < 100);
        assert_eq!(world.registry.attributes.get(far).unwrap().hp, 100);
    }

    #[test]
    fn lunge_extends_reach() {
        let mut world = World::new();
        let attacker = spawn_fighter(&mut world, TilePoint::new(0, 0), 10, 0);
        world.registry.combat.get_mut(attacker).unwrap().attack_range = 1;
        let target = spawn_fighter(&mut world, TilePoint::new(3, 0), 0, 0);

        let mut rng = ScriptedRng::new([0.9, 0.5, 0.9]);
        let outcome = process_attack_with_type(
            &mut world,
            attacker,
            target,
            &CombatConfig::default(),
            AttackType::Lunge,
            &mut rng,
        )
        .unwrap();
        assert!(!outcome.damage.is_miss);
    }
}
