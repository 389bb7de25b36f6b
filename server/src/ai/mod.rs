//! Per-tick monster AI. Every monster runs the shared
//! Idle/Patrol/Chase/Attack/Return state machine; the AI-type tag picks
//! the Attack-step specialization, nothing else.

use emberfall_shared::config::MonsterAiKind;
use emberfall_shared::types::{Direction, TilePoint};

use crate::combat::{self, CombatConfig, CombatRng};
use crate::ecs::{EffectKind, Entity, MonsterState, World, WorldEvent};
use crate::systems::{System, SystemContext};

const RANGED_TOO_CLOSE_FACTOR: f32 = 0.7;
const SUMMON_INTERVAL_SECS: f32 = 6.0;
const GUARD_RADIUS: f32 = 10.0;
const GUARD_LEASH: f32 = 12.0;
const MAX_CHASE_DISTANCE: f32 = 15.0;
const IDLE_TO_PATROL_SECS: f32 = 2.0;
const PATROL_TO_IDLE_SECS: f32 = 3.0;
const RETURN_TO_IDLE_SECS: f32 = 1.0;
/// One chase/return step per this many seconds.
const MOVE_STEP_SECS: f32 = 0.5;

const CRAZY_MODE_SECS: f32 = 15.0;
const CRAZY_MODE_HP_PERCENT: f32 = 0.3;
const TELEPORT_HP_PERCENT: f32 = 0.5;
const TELEPORT_CHANCE: f32 = 0.3;
const TELEPORT_COOLDOWN_SECS: f32 = 10.0;
const TELEPORT_RANGE: i32 = 5;

const FAR_AWAY: f32 = 999_999.0;

pub struct MonsterAiSystem {
    pub combat_config: CombatConfig,
}

impl MonsterAiSystem {
    pub fn new(combat_config: CombatConfig) -> Self {
        Self { combat_config }
    }
}

impl System for MonsterAiSystem {
    fn name(&self) -> &'static str {
        "monster_ai"
    }

    fn run(&mut self, ctx: &mut SystemContext<'_>) {
        let dt = ctx.dt;
        for entity in ctx.world.registry.monsters() {
            let alive = ctx
                .world
                .registry
                .attributes
                .get(entity)
                .is_none_or(|a| a.hp > 0);
            if !alive {
                if let Some(ai) = ctx.world.registry.monster_ai.get_mut(entity) {
                    ai.state = MonsterState::Dead;
                }
                continue;
            }

            if let Some(aggro) = ctx.world.registry.monster_aggro.get_mut(entity) {
                aggro.hate.decay(dt);
            }
            let Some(ai) = ctx.world.registry.monster_ai.get_mut(entity) else {
                continue;
            };
            ai.attack_cooldown_timer += dt;
            let kind = ai.kind;

            let stunned = ctx
                .world
                .registry
                .effects
                .get(entity)
                .is_some_and(|e| e.has(EffectKind::Stun));
            if !stunned {
                acquire_proximity_target(ctx.world, entity);

                match kind {
                    MonsterAiKind::Normal => {
                        update_state_machine(ctx.world, entity, dt, &self.combat_config, ctx.rng)
                    }
                    MonsterAiKind::Ambush => {
                        update_ambush(ctx.world, entity, dt, &self.combat_config, ctx.rng)
                    }
                    MonsterAiKind::Ranged => {
                        update_ranged(ctx.world, entity, dt, &self.combat_config, ctx.rng)
                    }
                    MonsterAiKind::Summoner => {
                        update_summoner(ctx.world, entity, dt, &self.combat_config, ctx.rng)
                    }
                    MonsterAiKind::Explosive => {
                        update_explosive(ctx.world, entity, dt, &self.combat_config, ctx.rng)
                    }
                    MonsterAiKind::Poisonous => {
                        update_poisonous(ctx.world, entity, dt, &self.combat_config, ctx.rng)
                    }
                    MonsterAiKind::Guard => {
                        update_guard(ctx.world, entity, dt, &self.combat_config, ctx.rng)
                    }
                    MonsterAiKind::BossCowKing => {
                        update_boss_cow_king(ctx.world, entity, dt, &self.combat_config, ctx.rng)
                    }
                }
            }

            if let Some(ai) = ctx.world.registry.monster_ai.get_mut(entity) {
                ai.state_timer += dt;
            }
        }
    }

    fn handle_event(&mut self, ctx: &mut SystemContext<'_>, event: &WorldEvent) {
        if let WorldEvent::DamageDealt {
            attacker,
            target,
            damage,
            ..
        } = event
        {
            if let Some(aggro) = ctx.world.registry.monster_aggro.get_mut(*target) {
                aggro.hate.add_hatred(*attacker, *damage);
            }
        }
    }
}

fn transition(world: &mut World, entity: Entity, state: MonsterState) {
    if let Some(ai) = world.registry.monster_ai.get_mut(entity) {
        ai.state = state;
        ai.state_timer = 0.0;
    }
}

fn is_target_valid(world: &World, target: Option<Entity>) -> bool {
    let Some(target) = target else {
        return false;
    };
    world.registry.is_alive(target)
        && world
            .registry
            .attributes
            .get(target)
            .is_some_and(|a| a.hp > 0)
}

fn distance_between(world: &World, a: Entity, b: Entity) -> f32 {
    let (Some(ta), Some(tb)) = (
        world.registry.transforms.get(a),
        world.registry.transforms.get(b),
    ) else {
        return FAR_AWAY;
    };
    emberfall_shared::types::euclidean_distance(ta.position, tb.position)
}

fn distance_to_position(world: &World, entity: Entity, position: TilePoint) -> f32 {
    let Some(transform) = world.registry.transforms.get(entity) else {
        return FAR_AWAY;
    };
    emberfall_shared::types::euclidean_distance(transform.position, position)
}

/// Picks the top hate-list entry if it is still a valid target.
fn select_target(world: &mut World, entity: Entity) -> Option<Entity> {
    let top = world
        .registry
        .monster_aggro
        .get_mut(entity)?
        .hate
        .top_target()?;
    is_target_valid(world, Some(top)).then_some(top)
}

/// Baseline threat for players that wander into aggro range while the
/// monster has no one on its hate list yet.
fn acquire_proximity_target(world: &mut World, entity: Entity) {
    let Some(aggro) = world.registry.monster_aggro.get(entity) else {
        return;
    };
    if !aggro.hate.is_empty() {
        return;
    }
    let aggro_range = aggro.aggro_range;
    let Some(transform) = world.registry.transforms.get(entity) else {
        return;
    };
    let (position, map_id) = (transform.position, transform.map_id);

    let nearest = world
        .grid
        .query_range(position, aggro_range)
        .into_iter()
        .filter(|candidate| *candidate != entity)
        .filter(|candidate| !world.registry.monster_ai.contains(*candidate))
        .filter(|candidate| world.registry.identities.contains(*candidate))
        .filter(|candidate| {
            world
                .registry
                .attributes
                .get(*candidate)
                .is_some_and(|a| a.hp > 0)
        })
        .filter(|candidate| {
            world
                .registry
                .transforms
                .get(*candidate)
                .is_some_and(|t| t.map_id == map_id)
        })
        .min_by(|a, b| {
            let da = distance_between(world, entity, *a);
            let db = distance_between(world, entity, *b);
            da.partial_cmp(&db)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(b))
        });

    if let (Some(player), Some(aggro)) = (nearest, world.registry.monster_aggro.get_mut(entity)) {
        aggro.hate.add_hatred(player, 1);
    }
}

/// Advances one tile toward `dest` when the movement accumulator allows.
fn step_toward(world: &mut World, entity: Entity, dest: TilePoint, dt: f32) {
    let Some(ai) = world.registry.monster_ai.get_mut(entity) else {
        return;
    };
    ai.move_timer += dt;
    if ai.move_timer < MOVE_STEP_SECS {
        return;
    }
    ai.move_timer -= MOVE_STEP_SECS;

    let Some(transform) = world.registry.transforms.get(entity) else {
        return;
    };
    let from = transform.position;
    if from == dest {
        return;
    }
    let next = TilePoint::new(
        from.x + (dest.x - from.x).signum(),
        from.y + (dest.y - from.y).signum(),
    );
    world.set_position(entity, next);
    if let Some(transform) = world.registry.transforms.get_mut(entity) {
        transform.direction = Direction::between(from, next);
    }
}

/// Attacks the current target when the cooldown has elapsed.
fn attack_on_cooldown(
    world: &mut World,
    entity: Entity,
    config: &CombatConfig,
    rng: &mut dyn CombatRng,
) -> Option<crate::combat::AttackOutcome> {
    let ai = world.registry.monster_ai.get_mut(entity)?;
    if ai.attack_cooldown_timer < ai.attack_cooldown {
        return None;
    }
    ai.attack_cooldown_timer = 0.0;
    let target = ai.target?;
    combat::execute_attack(world, entity, target, config, rng).ok()
}

/// The shared state machine. Specializations replace only the Attack
/// step by running before/around this.
fn update_state_machine(
    world: &mut World,
    entity: Entity,
    dt: f32,
    config: &CombatConfig,
    rng: &mut dyn CombatRng,
) {
    let Some(ai) = world.registry.monster_ai.get(entity) else {
        return;
    };
    match ai.state {
        MonsterState::Idle => update_idle(world, entity),
        MonsterState::Patrol => update_patrol(world, entity),
        MonsterState::Chase => update_chase(world, entity, dt),
        MonsterState::Attack => update_attack(world, entity, config, rng),
        MonsterState::Return => update_return(world, entity, dt),
        MonsterState::Dead => {}
    }
}

fn update_idle(world: &mut World, entity: Entity) {
    if let Some(target) = select_target(world, entity) {
        if let Some(ai) = world.registry.monster_ai.get_mut(entity) {
            ai.target = Some(target);
        }
        transition(world, entity, MonsterState::Chase);
        return;
    }
    let timer = world
        .registry
        .monster_ai
        .get(entity)
        .map_or(0.0, |ai| ai.state_timer);
    if timer > IDLE_TO_PATROL_SECS {
        transition(world, entity, MonsterState::Patrol);
    }
}

fn update_patrol(world: &mut World, entity: Entity) {
    if let Some(target) = select_target(world, entity) {
        if let Some(ai) = world.registry.monster_ai.get_mut(entity) {
            ai.target = Some(target);
        }
        transition(world, entity, MonsterState::Chase);
        return;
    }
    let timer = world
        .registry
        .monster_ai
        .get(entity)
        .map_or(0.0, |ai| ai.state_timer);
    if timer > PATROL_TO_IDLE_SECS {
        transition(world, entity, MonsterState::Idle);
    }
}

fn update_chase(world: &mut World, entity: Entity, dt: f32) {
    let target = world.registry.monster_ai.get(entity).and_then(|ai| ai.target);
    if !is_target_valid(world, target) {
        match select_target(world, entity) {
            Some(fresh) => {
                if let Some(ai) = world.registry.monster_ai.get_mut(entity) {
                    ai.target = Some(fresh);
                }
            }
            None => {
                if let Some(ai) = world.registry.monster_ai.get_mut(entity) {
                    ai.target = None;
                }
                transition(world, entity, MonsterState::Return);
                return;
            }
        }
    }
    let Some(target) = world.registry.monster_ai.get(entity).and_then(|ai| ai.target) else {
        return;
    };

    let distance = distance_between(world, entity, target);
    let attack_range = world
        .registry
        .monster_aggro
        .get(entity)
        .map_or(1, |a| a.attack_range);
    if distance <= attack_range as f32 {
        transition(world, entity, MonsterState::Attack);
        return;
    }
    if distance > MAX_CHASE_DISTANCE {
        transition(world, entity, MonsterState::Return);
        return;
    }

    if let Some(dest) = world.registry.transforms.get(target).map(|t| t.position) {
        step_toward(world, entity, dest, dt);
    }
}

fn update_attack(
    world: &mut World,
    entity: Entity,
    config: &CombatConfig,
    rng: &mut dyn CombatRng,
) {
    let target = world.registry.monster_ai.get(entity).and_then(|ai| ai.target);
    if !is_target_valid(world, target) {
        transition(world, entity, MonsterState::Chase);
        return;
    }
    let target = target.expect("validated above");

    attack_on_cooldown(world, entity, config, rng);

    let distance = distance_between(world, entity, target);
    let attack_range = world
        .registry
        .monster_aggro
        .get(entity)
        .map_or(1, |a| a.attack_range);
    if distance > attack_range as f32 {
        transition(world, entity, MonsterState::Chase);
    }
}

fn update_return(world: &mut World, entity: Entity, dt: f32) {
    if let Some(aggro) = world.registry.monster_aggro.get_mut(entity) {
        aggro.hate.clear();
    }
    let Some(ai) = world.registry.monster_ai.get_mut(entity) else {
        return;
    };
    ai.target = None;
    let home = ai.return_position;
    let timer = ai.state_timer;

    step_toward(world, entity, home, dt);
    if timer > RETURN_TO_IDLE_SECS {
        transition(world, entity, MonsterState::Idle);
    }
}

/// Runs the shared machine but replaces the Attack step.
fn update_with_attack_override(
    world: &mut World,
    entity: Entity,
    dt: f32,
    config: &CombatConfig,
    rng: &mut dyn CombatRng,
    attack_step: impl FnOnce(&mut World, Entity, &CombatConfig, &mut dyn CombatRng),
) {
    let in_attack = world
        .registry
        .monster_ai
        .get(entity)
        .is_some_and(|ai| ai.state == MonsterState::Attack);
    if in_attack {
        attack_step(world, entity, config, rng);
        return;
    }
    update_state_machine(world, entity, dt, config, rng);
}

fn update_ambush(
    world: &mut World,
    entity: Entity,
    dt: f32,
    config: &CombatConfig,
    rng: &mut dyn CombatRng,
) {
    let hidden = world
        .registry
        .monster_ai
        .get(entity)
        .is_some_and(|ai| ai.is_hidden);
    if hidden {
        let in_idle = world
            .registry
            .monster_ai
            .get(entity)
            .is_some_and(|ai| ai.state == MonsterState::Idle);
        if !in_idle {
            transition(world, entity, MonsterState::Idle);
        }

        let Some(target) = select_target(world, entity) else {
            return;
        };
        let distance = distance_between(world, entity, target);
        let (aggro_range, attack_range) = world
            .registry
            .monster_aggro
            .get(entity)
            .map_or((12, 3), |a| (a.aggro_range, a.attack_range));
        if distance <= aggro_range as f32 {
            if let Some(ai) = world.registry.monster_ai.get_mut(entity) {
                ai.is_hidden = false;
                ai.target = Some(target);
            }
            if distance <= attack_range as f32 {
                transition(world, entity, MonsterState::Attack);
            } else {
                transition(world, entity, MonsterState::Chase);
            }
        }
        return;
    }

    update_state_machine(world, entity, dt, config, rng);
}

fn update_ranged(
    world: &mut World,
    entity: Entity,
    dt: f32,
    config: &CombatConfig,
    rng: &mut dyn CombatRng,
) {
    update_with_attack_override(world, entity, dt, config, rng, |world, entity, config, rng| {
        let Some((preferred, target)) = world
            .registry
            .monster_ai
            .get(entity)
            .map(|ai| (ai.preferred_distance, ai.target))
        else {
            return;
        };
        let attack_range = world
            .registry
            .monster_aggro
            .get(entity)
            .map_or(1, |a| a.attack_range);
        let mut desired = if preferred > 0.0 {
            preferred
        } else {
            attack_range as f32
        };
        if desired <= 0.0 {
            desired = 1.0;
        }
        let too_close = desired * RANGED_TOO_CLOSE_FACTOR;

        if !is_target_valid(world, target) {
            transition(world, entity, MonsterState::Chase);
            return;
        }
        let target = target.expect("validated above");

        let distance = distance_between(world, entity, target);
        if distance > desired || distance < too_close {
            transition(world, entity, MonsterState::Chase);
            return;
        }

        attack_on_cooldown(world, entity, config, rng);
    });
}

fn update_summoner(
    world: &mut World,
    entity: Entity,
    dt: f32,
    config: &CombatConfig,
    rng: &mut dyn CombatRng,
) {
    update_with_attack_override(world, entity, dt, config, rng, |world, entity, config, rng| {
        let target = world.registry.monster_ai.get(entity).and_then(|ai| ai.target);
        if !is_target_valid(world, target) {
            transition(world, entity, MonsterState::Chase);
            return;
        }
        let target = target.expect("validated above");

        let distance = distance_between(world, entity, target);
        let attack_range = world
            .registry
            .monster_aggro
            .get(entity)
            .map_or(1, |a| a.attack_range);
        if distance > attack_range as f32 {
            transition(world, entity, MonsterState::Chase);
            return;
        }

        attack_on_cooldown(world, entity, config, rng);

        let due = world
            .registry
            .monster_ai
            .get(entity)
            .is_some_and(|ai| ai.state_timer >= SUMMON_INTERVAL_SECS);
        if due {
            let (position, map_id) = world
                .registry
                .transforms
                .get(entity)
                .map(|t| (t.position, t.map_id))
                .unwrap_or((TilePoint::new(0, 0), 0));
            world.events.publish(WorldEvent::MonsterSummon {
                summoner: entity,
                position,
                map_id,
            });
            if let Some(ai) = world.registry.monster_ai.get_mut(entity) {
                ai.state_timer = 0.0;
            }
        }
    });
}

fn update_explosive(
    world: &mut World,
    entity: Entity,
    dt: f32,
    config: &CombatConfig,
    rng: &mut dyn CombatRng,
) {
    update_with_attack_override(world, entity, dt, config, rng, |world, entity, config, rng| {
        let target = world.registry.monster_ai.get(entity).and_then(|ai| ai.target);
        if !is_target_valid(world, target) {
            transition(world, entity, MonsterState::Chase);
            return;
        }
        let target = target.expect("validated above");

        let distance = distance_between(world, entity, target);
        let attack_range = world
            .registry
            .monster_aggro
            .get(entity)
            .map_or(1, |a| a.attack_range);
        if distance > attack_range as f32 {
            transition(world, entity, MonsterState::Chase);
            return;
        }

        if let Some(outcome) = attack_on_cooldown(world, entity, config, rng) {
            if !outcome.damage.is_miss {
                combat::die(world, entity, None);
            }
        }
    });
}

fn update_poisonous(
    world: &mut World,
    entity: Entity,
    dt: f32,
    config: &CombatConfig,
    rng: &mut dyn CombatRng,
) {
    update_with_attack_override(world, entity, dt, config, rng, |world, entity, config, rng| {
        let target = world.registry.monster_ai.get(entity).and_then(|ai| ai.target);
        if !is_target_valid(world, target) {
            transition(world, entity, MonsterState::Chase);
            return;
        }
        let target = target.expect("validated above");

        let distance = distance_between(world, entity, target);
        let attack_range = world
            .registry
            .monster_aggro
            .get(entity)
            .map_or(1, |a| a.attack_range);
        if distance > attack_range as f32 {
            transition(world, entity, MonsterState::Chase);
            return;
        }

        if let Some(outcome) = attack_on_cooldown(world, entity, config, rng) {
            if !outcome.damage.is_miss && !outcome.target_died {
                let poison = (outcome.damage.final_damage / 5).max(1);
                combat::take_damage(world, target, poison, Some(entity));
            }
        }
    });
}

fn update_guard(
    world: &mut World,
    entity: Entity,
    dt: f32,
    config: &CombatConfig,
    rng: &mut dyn CombatRng,
) {
    let Some(ai) = world.registry.monster_ai.get(entity) else {
        return;
    };
    let post = ai.return_position;
    let target = ai.target;

    // A guard that strayed past its leash abandons the fight.
    if distance_to_position(world, entity, post) > GUARD_LEASH {
        abandon_and_return(world, entity);
        return;
    }

    if let Some(current) = target {
        if !is_target_valid(world, Some(current)) {
            abandon_and_return(world, entity);
            return;
        }
        if distance_to_position(world, current, post) > GUARD_RADIUS {
            abandon_and_return(world, entity);
            return;
        }
    } else if let Some(candidate) = select_target(world, entity) {
        if distance_to_position(world, candidate, post) <= GUARD_RADIUS {
            if let Some(ai) = world.registry.monster_ai.get_mut(entity) {
                ai.target = Some(candidate);
            }
            transition(world, entity, MonsterState::Chase);
        }
    }

    update_state_machine(world, entity, dt, config, rng);
}

fn abandon_and_return(world: &mut World, entity: Entity) {
    if let Some(aggro) = world.registry.monster_aggro.get_mut(entity) {
        aggro.hate.clear();
    }
    if let Some(ai) = world.registry.monster_ai.get_mut(entity) {
        ai.target = None;
    }
    transition(world, entity, MonsterState::Return);
}

fn update_boss_cow_king(
    world: &mut World,
    entity: Entity,
    dt: f32,
    config: &CombatConfig,
    rng: &mut dyn CombatRng,
) {
    let Some(attributes) = world.registry.attributes.get(entity) else {
        return;
    };
    let hp_percent = attributes.hp as f32 / attributes.max_hp.max(1) as f32;

    if let Some(ai) = world.registry.monster_ai.get_mut(entity) {
        if ai.is_crazy_mode {
            ai.crazy_mode_timer -= dt;
            if ai.crazy_mode_timer <= 0.0 {
                ai.is_crazy_mode = false;
                ai.attack_cooldown *= 2.0;
            }
        }
        if ai.teleport_cooldown > 0.0 {
            ai.teleport_cooldown -= dt;
        }

        if hp_percent < CRAZY_MODE_HP_PERCENT && !ai.is_crazy_mode {
            ai.is_crazy_mode = true;
            ai.crazy_mode_timer = CRAZY_MODE_SECS;
            ai.attack_cooldown *= 0.5;
        }
    }

    let teleport_ready = world
        .registry
        .monster_ai
        .get(entity)
        .is_some_and(|ai| ai.teleport_cooldown <= 0.0);
    if hp_percent < TELEPORT_HP_PERCENT && teleport_ready && rng.chance() < TELEPORT_CHANCE {
        if let Some(from) = world.registry.transforms.get(entity).map(|t| t.position) {
            let dx = rng.range_i32(-TELEPORT_RANGE, TELEPORT_RANGE);
            let dy = rng.range_i32(-TELEPORT_RANGE, TELEPORT_RANGE);
            let dest = TilePoint::new((from.x + dx).max(0), (from.y + dy).max(0));
            world.set_position(entity, dest);
        }
        if let Some(ai) = world.registry.monster_ai.get_mut(entity) {
            ai.teleport_cooldown = TELEPORT_COOLDOWN_SECS;
        }
    }

    update_state_machine(world, entity, dt, config, rng);
}
