use std::time::{Duration, Instant};

use log::{info, warn};

use emberfall_shared::config::SpawnTable;
use emberfall_shared::{HEARTBEAT_TIMEOUT, TICK_INTERVAL};

use crate::ai::MonsterAiSystem;
use crate::combat::CombatTickSystem;
use crate::content::Registries;
use crate::ecs::Entity;
use crate::handlers::{self, Dispatcher, GameContext, Repository};
use crate::net::session::{Session, SessionId, PROTOCOL_ERROR_LIMIT};
use crate::net::{SessionEvent, SessionServer};
use crate::persist::{
    Cache, CharacterData, CharacterSkillData, Database, EquipmentSlotData, InventorySlotData,
};
use crate::systems::drop::MonsterDropSystem;
use crate::systems::skills::PassiveSkillSystem;
use crate::systems::spawn::MonsterSpawnSystem;
use crate::systems::Schedule;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub tick_interval: Duration,
    /// Snowflake worker id for this process (0-1023).
    pub worker_id: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:7777".into(),
            tick_interval: TICK_INTERVAL,
            worker_id: 0,
        }
    }
}

/// The authoritative game server: multi-threaded socket I/O feeding a
/// single logic thread that drives the world at a fixed tick rate.
pub struct GameServer {
    config: ServerConfig,
    pub ctx: GameContext,
    dispatcher: Dispatcher,
    schedule: Schedule,
}

impl GameServer {
    pub fn new(
        config: ServerConfig,
        registries: Registries,
        repository: Repository,
        spawn_table: &SpawnTable,
    ) -> Self {
        let ctx = GameContext::new(registries, repository, config.worker_id);

        let mut dispatcher = Dispatcher::new();
        handlers::register_all(&mut dispatcher);

        let mut spawn_system = MonsterSpawnSystem::new();
        spawn_system.load(spawn_table);

        let mut schedule = Schedule::new();
        schedule.add(Box::new(CombatTickSystem));
        schedule.add(Box::new(MonsterAiSystem::new(ctx.combat_config)));
        schedule.add(Box::new(spawn_system));
        schedule.add(Box::new(MonsterDropSystem::new()));
        schedule.add(Box::new(PassiveSkillSystem::new()));

        Self {
            config,
            ctx,
            dispatcher,
            schedule,
        }
    }

    /// Folds new connections and disconnects into the session table.
    pub fn pump_network(&mut self, server: &SessionServer) {
        for event in server.poll_events() {
            match event {
                SessionEvent::Connected(shared) => {
                    let id = shared.id;
                    self.ctx.sessions.insert(id, Session::new(shared));
                }
                SessionEvent::Disconnected(id, error) => {
                    info!("session {id} disconnected: {error}");
                    self.logout(id);
                }
            }
        }

        // Heartbeat timeouts are detected on the logic thread: a session
        // that has been silent too long is force-disconnected.
        let timed_out: Vec<SessionId> = self
            .ctx
            .sessions
            .values()
            .filter(|session| {
                session.shared.is_connected()
                    && session.shared.millis_since_heard() > HEARTBEAT_TIMEOUT.as_millis() as u64
            })
            .map(|session| session.id())
            .collect();
        for id in timed_out {
            warn!("session {id} heartbeat timeout");
            if let Some(session) = self.ctx.sessions.get(&id) {
                session.shared.mark_disconnected();
            }
            self.logout(id);
        }
    }

    /// Drains every session's receive queue and dispatches in wire
    /// order, enforcing the per-session sequence contract.
    pub fn drain_and_dispatch(&mut self) {
        let session_ids: Vec<SessionId> = self.ctx.sessions.keys().copied().collect();
        for session_id in session_ids {
            let Some(session) = self.ctx.sessions.get(&session_id) else {
                continue;
            };
            let packets = session.shared.drain_received();

            for packet in packets {
                let Some(session) = self.ctx.sessions.get_mut(&session_id) else {
                    break;
                };
                if let Err(err) = session.accept_sequence(packet.sequence()) {
                    warn!("session {session_id}: {err}");
                    session.protocol_errors += 1;
                    if session.protocol_errors >= PROTOCOL_ERROR_LIMIT {
                        session.shared.mark_disconnected();
                        self.logout(session_id);
                        break;
                    }
                    continue;
                }
                self.dispatcher.dispatch(&mut self.ctx, session_id, &packet);
            }
        }
    }

    /// Advances the simulation one tick and runs the write-behind flush.
    pub fn tick(&mut self, dt: f32) {
        {
            let GameContext {
                world,
                registries,
                rng,
                ..
            } = &mut self.ctx;
            // Events published by handlers since the last tick are
            // delivered first, then the systems run.
            self.schedule.deliver_events(world, registries, rng, dt);
            self.schedule.tick(world, registries, rng, dt);
        }

        self.sync_dirty_characters();
        self.ctx.repository.flush_dirty_characters();
    }

    /// Projects ECS dirty flags into repository saves. Only entities
    /// bound to a persistent character id participate.
    fn sync_dirty_characters(&mut self) {
        for entity in self.ctx.world.dirty.dirty_entities() {
            let Some(character_id) = persistent_character_id(&self.ctx, entity) else {
                self.ctx.world.dirty.clear(entity);
                continue;
            };
            let flags = self.ctx.world.dirty.take(entity);

            if flags.attributes {
                if let Some(data) = character_data_from_world(&self.ctx, entity) {
                    if let Err(err) = self.ctx.repository.save_character(&data) {
                        warn!("deferred save failed for character {character_id}: {err}");
                    }
                }
            }
            if flags.equipment {
                let rows = equipment_rows(&self.ctx, entity);
                if let Err(err) = self.ctx.repository.save_equipment(character_id, &rows) {
                    warn!("equipment save failed for character {character_id}: {err}");
                }
            }
            if flags.items {
                let rows = inventory_rows(&self.ctx, entity);
                if let Err(err) = self.ctx.repository.save_inventory(character_id, &rows) {
                    warn!("inventory save failed for character {character_id}: {err}");
                }
            }
            if flags.skills {
                let rows = skill_rows(&self.ctx, entity);
                if let Err(err) = self.ctx.repository.db().save_skills(character_id, &rows) {
                    warn!("skill save failed for character {character_id}: {err}");
                }
            }
        }
    }

    /// Tears a session down: a final save of its character, despawn, and
    /// removal from the table.
    pub fn logout(&mut self, session_id: SessionId) {
        let Some(session) = self.ctx.sessions.remove(&session_id) else {
            return;
        };
        let Some(entity) = session.entity else {
            return;
        };

        if let Some(character_id) = persistent_character_id(&self.ctx, entity) {
            if let Some(data) = character_data_from_world(&self.ctx, entity) {
                let map_id = data.map_id;
                if let Err(err) = self.ctx.repository.save_character(&data) {
                    warn!("final save failed for character {character_id}: {err}");
                }
                let equipment = equipment_rows(&self.ctx, entity);
                let inventory = inventory_rows(&self.ctx, entity);
                let _ = self.ctx.repository.save_equipment(character_id, &equipment);
                let _ = self.ctx.repository.save_inventory(character_id, &inventory);
                self.ctx
                    .repository
                    .cache()
                    .remove_player_from_map(map_id, character_id);

                self.ctx.broadcast_to_map(
                    map_id,
                    emberfall_shared::protocol::msg_id::ENTITY_DESPAWN,
                    &emberfall_shared::protocol::messages::game::EntityDespawn {
                        entity_id: handlers::wire_entity_id(entity),
                    },
                );
            }
        }

        self.ctx.world.despawn(entity);
    }

    /// Binds the listener and runs the fixed-tick loop until the process
    /// is killed.
    pub fn run(&mut self) -> std::io::Result<()> {
        let server = SessionServer::bind(&self.config.bind_addr)?;
        let tick_interval = self.config.tick_interval;
        let dt = tick_interval.as_secs_f32();
        let mut next_tick = Instant::now() + tick_interval;

        loop {
            self.pump_network(&server);
            self.drain_and_dispatch();
            self.tick(dt);

            let now = Instant::now();
            if now < next_tick {
                std::thread::sleep(next_tick - now);
            } else {
                // The tick overran; resynchronize rather than spiral.
                next_tick = now;
            }
            next_tick += tick_interval;
        }
    }
}

fn persistent_character_id(ctx: &GameContext, entity: Entity) -> Option<u32> {
    let identity = ctx.world.registry.identities.get(entity)?;
    if identity.account_id == 0 || identity.persistent_id == 0 {
        return None;
    }
    u32::try_from(identity.persistent_id).ok()
}

/// Snapshots a live entity back into its persisted character row.
pub fn character_data_from_world(ctx: &GameContext, entity: Entity) -> Option<CharacterData> {
    let identity = ctx.world.registry.identities.get(entity)?;
    let attributes = ctx.world.registry.attributes.get(entity)?;
    let transform = ctx.world.registry.transforms.get(entity)?;

    Some(CharacterData {
        id: u32::try_from(identity.persistent_id).ok()?,
        account_id: identity.account_id,
        name: identity.name.clone(),
        class: identity.class,
        gender: identity.gender,
        level: attributes.level,
        exp: attributes.exp,
        hp: attributes.hp,
        max_hp: attributes.max_hp,
        mp: attributes.mp,
        max_mp: attributes.max_mp,
        attack: attributes.attack,
        defense: attributes.defense,
        magic_attack: attributes.magic_attack,
        magic_defense: attributes.magic_defense,
        speed: attributes.speed,
        gold: attributes.gold,
        map_id: transform.map_id,
        x: transform.position.x,
        y: transform.position.y,
        created_at: 0,
        last_login: transform.last_active_ms as i64,
    })
}

pub fn equipment_rows(ctx: &GameContext, entity: Entity) -> Vec<EquipmentSlotData> {
    let Some(equipment) = ctx.world.registry.equipment.get(entity) else {
        return Vec::new();
    };
    let mut rows = Vec::new();
    for (slot, item) in equipment.iter() {
        let Some(instance) = ctx.world.registry.items.get(item) else {
            continue;
        };
        rows.push(EquipmentSlotData {
            slot: slot.index() as u8,
            item_template_id: instance.template_id,
            instance_id: instance.instance_id,
            durability: instance.durability,
            enhancement_level: instance.enhancement_level as i8,
        });
    }
    rows.sort_by_key(|row| row.slot);
    rows
}

pub fn inventory_rows(ctx: &GameContext, entity: Entity) -> Vec<InventorySlotData> {
    let mut rows = Vec::new();
    for (item, owner) in ctx.world.registry.owners.iter() {
        if owner.owner != Some(entity) || owner.slot_index < 0 {
            continue;
        }
        let Some(instance) = ctx.world.registry.items.get(item) else {
            continue;
        };
        rows.push(InventorySlotData {
            slot: owner.slot_index,
            item_template_id: instance.template_id,
            instance_id: instance.instance_id,
            quantity: instance.count,
            durability: instance.durability,
            enhancement_level: instance.enhancement_level as i8,
        });
    }
    rows.sort_by_key(|row| row.slot);
    rows
}

pub fn skill_rows(ctx: &GameContext, entity: Entity) -> Vec<CharacterSkillData> {
    let Some(list) = ctx.world.registry.skills.get(entity) else {
        return Vec::new();
    };
    let mut rows: Vec<CharacterSkillData> = list
        .iter()
        .map(|skill| CharacterSkillData {
            skill_id: skill.skill_id,
            level: skill.level as i32,
            experience: skill.exp,
        })
        .collect();
    rows.sort_by_key(|row| row.skill_id);
    rows
}
