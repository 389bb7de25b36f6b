use std::collections::HashMap;

use emberfall_shared::config::{MonsterTemplate, SpawnPointConfig, SpawnTable};
use emberfall_shared::types::TilePoint;
use log::warn;

use crate::ecs::{
    Attributes, Combat, Entity, Identity, MonsterAggro, MonsterAi, MonsterIdentity, World,
    WorldEvent,
};
use crate::systems::{System, SystemContext};

/// Seconds a monster corpse lingers before the entity is destroyed.
const CORPSE_LINGER_SECS: f32 = 5.0;

struct SpawnPointState {
    config: SpawnPointConfig,
    current_count: i32,
    last_spawn_time: f32,
}

struct RespawnTimer {
    spawn_point_id: u32,
    remaining_secs: f32,
}

/// Timed monster spawning: populates spawn points up to `max_count` on
/// their respawn interval, decrements counts on death, runs scripted
/// respawn timers, and reclaims corpses.
pub struct MonsterSpawnSystem {
    spawn_points: HashMap<u32, SpawnPointState>,
    respawn_timers: HashMap<u64, RespawnTimer>,
    corpse_timers: HashMap<Entity, f32>,
    elapsed_secs: f32,
}

impl MonsterSpawnSystem {
    pub fn new() -> Self {
        Self {
            spawn_points: HashMap::new(),
            respawn_timers: HashMap::new(),
            corpse_timers: HashMap::new(),
            elapsed_secs: 0.0,
        }
    }

    /// Installs spawn points from configuration. Counts reset so a
    /// reload does not leak phantom monsters; every point is due to
    /// spawn immediately.
    pub fn load(&mut self, table: &SpawnTable) {
        self.spawn_points.clear();
        for config in table.points() {
            self.spawn_points.insert(
                config.spawn_id,
                SpawnPointState {
                    last_spawn_time: self.elapsed_secs - config.respawn_interval_secs,
                    current_count: 0,
                    config: config.clone(),
                },
            );
        }
    }

    pub fn spawn_point_count(&self) -> usize {
        self.spawn_points.len()
    }

    pub fn current_count(&self, spawn_id: u32) -> Option<i32> {
        self.spawn_points.get(&spawn_id).map(|s| s.current_count)
    }

    /// Queues a scripted respawn at a point after `delay_secs`.
    pub fn schedule_respawn(&mut self, monster_id: u64, spawn_point_id: u32, delay_secs: f32) {
        self.respawn_timers.insert(
            monster_id,
            RespawnTimer {
                spawn_point_id,
                remaining_secs: delay_secs,
            },
        );
    }

    fn check_and_spawn(&mut self, ctx: &mut SystemContext<'_>) {
        let mut due: Vec<u32> = self
            .spawn_points
            .iter()
            .filter(|(_, state)| {
                state.config.max_count > 0
                    && state.current_count < state.config.max_count
                    && (state.config.respawn_interval_secs <= 0.0
                        || self.elapsed_secs - state.last_spawn_time
                            >= state.config.respawn_interval_secs)
            })
            .map(|(id, _)| *id)
            .collect();
        due.sort();
        for spawn_id in due {
            self.spawn_monster_at_point(ctx, spawn_id);
        }
    }

    fn spawn_monster_at_point(&mut self, ctx: &mut SystemContext<'_>, spawn_id: u32) {
        let Some(state) = self.spawn_points.get_mut(&spawn_id) else {
            return;
        };
        let config = state.config.clone();

        let radius = config.spawn_radius.max(0);
        let dx = ctx.rng.range_i32(-radius, radius);
        let dy = ctx.rng.range_i32(-radius, radius);
        let position = TilePoint::new((config.center_x + dx).max(0), (config.center_y + dy).max(0));

        let template = ctx.registries.monsters.get(config.monster_template_id);
        if template.is_none() {
            warn!(
                "spawn point {} references unknown monster template {}",
                spawn_id, config.monster_template_id
            );
        }

        let entity = ctx.world.spawn_at(position, config.map_id);
        populate_monster(ctx.world, entity, &config, template);

        state.current_count += 1;
        state.last_spawn_time = self.elapsed_secs;
    }

    fn process_respawn_timers(&mut self, ctx: &mut SystemContext<'_>) {
        let mut ready = Vec::new();
        for (monster_id, timer) in self.respawn_timers.iter_mut() {
            timer.remaining_secs -= ctx.dt;
            if timer.remaining_secs <= 0.0 {
                ready.push(*monster_id);
            }
        }
        ready.sort();
        for monster_id in ready {
            if let Some(timer) = self.respawn_timers.remove(&monster_id) {
                self.spawn_monster_at_point(ctx, timer.spawn_point_id);
            }
        }
    }

    fn process_corpse_timers(&mut self, ctx: &mut SystemContext<'_>) {
        let mut expired = Vec::new();
        for (entity, remaining) in self.corpse_timers.iter_mut() {
            *remaining -= ctx.dt;
            if *remaining <= 0.0 {
                expired.push(*entity);
            }
        }
        expired.sort();
        for entity in expired {
            self.corpse_timers.remove(&entity);
            ctx.world.despawn(entity);
        }
    }
}

impl Default for MonsterSpawnSystem {
    fn default() -> Self {
        Self::new()
    }
}

fn populate_monster(
    world: &mut World,
    entity: Entity,
    config: &SpawnPointConfig,
    template: Option<&MonsterTemplate>,
) {
    world.registry.monster_identities.insert(
        entity,
        MonsterIdentity {
            template_id: config.monster_template_id,
            spawn_point_id: config.spawn_id,
        },
    );

    let mut ai = MonsterAi {
        return_position: TilePoint::new(config.center_x, config.center_y),
        ..Default::default()
    };
    let mut attributes = Attributes {
        hp: 50,
        max_hp: 50,
        ..Default::default()
    };
    let mut name = format!("monster#{}", config.monster_template_id);

    if let Some(template) = template {
        ai.kind = template.ai;
        ai.attack_cooldown = template.attack_cooldown_secs;
        ai.preferred_distance = template.preferred_distance;
        ai.is_hidden = matches!(template.ai, emberfall_shared::config::MonsterAiKind::Ambush);
        attributes = Attributes {
            level: template.level,
            hp: template.max_hp,
            max_hp: template.max_hp,
            mp: template.max_mp,
            max_mp: template.max_mp,
            attack: template.attack,
            defense: template.defense,
            magic_attack: template.magic_attack,
            magic_defense: template.magic_defense,
            speed: template.speed,
            ..Default::default()
        };
        name = template.name.clone();
    }

    world.registry.monster_ai.insert(entity, ai);
    world.registry.monster_aggro.insert(
        entity,
        MonsterAggro {
            aggro_range: config.aggro_range,
            attack_range: config.attack_range,
            ..Default::default()
        },
    );
    world.registry.attributes.insert(entity, attributes);
    world.registry.combat.insert(
        entity,
        Combat {
            attack_range: config.attack_range,
            ..Default::default()
        },
    );
    world.registry.identities.insert(
        entity,
        Identity {
            name,
            ..Default::default()
        },
    );
}

impl System for MonsterSpawnSystem {
    fn name(&self) -> &'static str {
        "monster_spawn"
    }

    fn run(&mut self, ctx: &mut SystemContext<'_>) {
        if ctx.dt > 0.0 {
            self.elapsed_secs += ctx.dt;
        }
        self.check_and_spawn(ctx);
        self.process_respawn_timers(ctx);
        self.process_corpse_timers(ctx);
    }

    fn handle_event(&mut self, ctx: &mut SystemContext<'_>, event: &WorldEvent) {
        let WorldEvent::EntityDeath { entity, .. } = event else {
            return;
        };
        let Some(identity) = ctx.world.registry.monster_identities.get(*entity) else {
            return;
        };

        self.corpse_timers.insert(*entity, CORPSE_LINGER_SECS);

        if identity.spawn_point_id == 0 {
            return;
        }
        if let Some(state) = self.spawn_points.get_mut(&identity.spawn_point_id) {
            if state.current_count > 0 {
                state.current_count -= 1;
            }
            state.last_spawn_time = self.elapsed_secs;
        }
    }
}
