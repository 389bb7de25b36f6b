//! Message dispatch and the server-side handler family. Handlers run on
//! the logic thread, mutate the world directly, and enqueue replies on
//! the originating session. None of them block.

pub mod character;
pub mod combat;
pub mod game;
pub mod login;
pub mod npc;

use std::collections::HashMap;

use log::debug;
use serde::Serialize;

use emberfall_shared::protocol::{msg_id, MsgId, Packet};
use emberfall_shared::snowflake::SnowflakeIdGenerator;
use emberfall_shared::{encode_json_payload, encode_payload, FLAG_JSON_BODY};

use crate::combat::{CombatConfig, SeededRng};
use crate::content::Registries;
use crate::ecs::{Entity, World};
use crate::net::session::{Session, SessionId};
use crate::persist::{CharacterRepository, MemoryCache, MemoryDatabase};

pub type Repository = CharacterRepository<MemoryDatabase, MemoryCache>;

/// Everything handlers may touch. Owned by the app; borrowed per
/// dispatch on the logic thread.
pub struct GameContext {
    pub world: World,
    pub registries: Registries,
    pub repository: Repository,
    pub sessions: HashMap<SessionId, Session>,
    pub rng: SeededRng,
    pub id_gen: SnowflakeIdGenerator,
    pub combat_config: CombatConfig,
}

impl GameContext {
    pub fn new(registries: Registries, repository: Repository, worker_id: u16) -> Self {
        Self {
            world: World::new(),
            registries,
            repository,
            sessions: HashMap::new(),
            rng: SeededRng::from_entropy(),
            id_gen: SnowflakeIdGenerator::new(worker_id)
                .expect("worker id validated at configuration time"),
            combat_config: CombatConfig::default(),
        }
    }

    /// Encodes and queues a binary-body reply on one session.
    pub fn send<T: Serialize>(&mut self, session_id: SessionId, msg_id: MsgId, body: &T) {
        let Ok(payload) = encode_payload(body) else {
            log::error!("failed to encode body for msg 0x{msg_id:04X}");
            return;
        };
        if let Some(session) = self.sessions.get_mut(&session_id) {
            session.send(msg_id, 0, &payload);
        }
    }

    /// Encodes and queues a JSON-body reply (NPC family).
    pub fn send_json<T: Serialize>(&mut self, session_id: SessionId, msg_id: MsgId, body: &T) {
        let Ok(payload) = encode_json_payload(body) else {
            log::error!("failed to encode JSON body for msg 0x{msg_id:04X}");
            return;
        };
        if let Some(session) = self.sessions.get_mut(&session_id) {
            session.send(msg_id, FLAG_JSON_BODY, &payload);
        }
    }

    /// Sends a message to every in-world session on a map.
    pub fn broadcast_to_map<T: Serialize>(&mut self, map_id: u32, msg_id: MsgId, body: &T) {
        let Ok(payload) = encode_payload(body) else {
            return;
        };
        let targets: Vec<SessionId> = self
            .sessions
            .values()
            .filter(|session| {
                session.entity.is_some_and(|entity| {
                    self.world
                        .registry
                        .transforms
                        .get(entity)
                        .is_some_and(|t| t.map_id == map_id)
                })
            })
            .map(|session| session.id())
            .collect();
        for session_id in targets {
            if let Some(session) = self.sessions.get_mut(&session_id) {
                session.send(msg_id, 0, &payload);
            }
        }
    }

    /// The entity behind a session, when it has entered the world.
    pub fn session_entity(&self, session_id: SessionId) -> Option<Entity> {
        self.sessions.get(&session_id).and_then(|s| s.entity)
    }
}

/// Wire-visible entity id: the raw 32-bit handle widened to the u64 the
/// protocol carries.
pub fn wire_entity_id(entity: Entity) -> u64 {
    entity.to_bits() as u64
}

/// Builds the authoritative snapshot of a live entity for the client
/// mirror. Entities without a transform are not visible and yield
/// nothing.
pub fn snapshot_entity(
    ctx: &GameContext,
    entity: Entity,
) -> Option<emberfall_shared::protocol::messages::game::EntitySnapshot> {
    use emberfall_shared::protocol::messages::game::{EntityKind, EntitySnapshot};

    let transform = ctx.world.registry.transforms.get(entity)?;
    let attributes = ctx.world.registry.attributes.get(entity);

    let kind = if ctx.world.registry.monster_ai.contains(entity) {
        EntityKind::Monster
    } else if ctx.world.registry.items.contains(entity) {
        EntityKind::GroundItem
    } else {
        EntityKind::Player
    };
    let name = ctx
        .world
        .registry
        .identities
        .get(entity)
        .map(|identity| identity.name.clone())
        .unwrap_or_default();
    let template_id = ctx
        .world
        .registry
        .monster_identities
        .get(entity)
        .map_or(0, |identity| identity.template_id);

    Some(EntitySnapshot {
        entity_id: wire_entity_id(entity),
        kind,
        name,
        x: transform.position.x,
        y: transform.position.y,
        direction: transform.direction as u8,
        map_id: transform.map_id,
        hp: attributes.map_or(0, |a| a.hp),
        max_hp: attributes.map_or(0, |a| a.max_hp),
        mp: attributes.map_or(0, |a| a.mp),
        max_mp: attributes.map_or(0, |a| a.max_mp),
        level: attributes.map_or(0, |a| a.level),
        template_id,
        server_time_ms: crate::net::session::unix_time_ms(),
    })
}

pub fn entity_from_wire(id: u64) -> Entity {
    Entity::from_bits(id as u32)
}

pub type Handler = Box<dyn FnMut(&mut GameContext, SessionId, &Packet) + Send>;

/// `msg_id -> handler` table with an optional fallback. Registering a
/// handler for an id replaces any previous binding.
#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<MsgId, Handler>,
    default_handler: Option<Handler>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, msg_id: MsgId, handler: Handler) {
        self.handlers.insert(msg_id, handler);
    }

    pub fn set_default(&mut self, handler: Handler) {
        self.default_handler = Some(handler);
    }

    pub fn dispatch(&mut self, ctx: &mut GameContext, session_id: SessionId, packet: &Packet) {
        if let Some(handler) = self.handlers.get_mut(&packet.msg_id()) {
            handler(ctx, session_id, packet);
        } else if let Some(default_handler) = self.default_handler.as_mut() {
            default_handler(ctx, session_id, packet);
        } else {
            debug!(
                "session {session_id}: no handler for msg 0x{:04X}",
                packet.msg_id()
            );
        }
    }
}

/// Installs the complete server-side handler family.
pub fn register_all(dispatcher: &mut Dispatcher) {
    dispatcher.register(msg_id::LOGIN_REQ, Box::new(login::handle_login));
    dispatcher.register(
        msg_id::CREATE_ACCOUNT_REQ,
        Box::new(login::handle_create_account),
    );
    dispatcher.register(msg_id::HEARTBEAT_REQ, Box::new(login::handle_heartbeat));
    dispatcher.register(msg_id::ROLE_LIST_REQ, Box::new(character::handle_role_list));
    dispatcher.register(
        msg_id::CREATE_ROLE_REQ,
        Box::new(character::handle_create_role),
    );
    dispatcher.register(
        msg_id::SELECT_ROLE_REQ,
        Box::new(character::handle_select_role),
    );
    dispatcher.register(
        msg_id::ENTER_GAME_REQ,
        Box::new(character::handle_enter_game),
    );
    dispatcher.register(msg_id::MOVE_REQ, Box::new(game::handle_move));
    dispatcher.register(msg_id::ATTACK_REQ, Box::new(combat::handle_attack));
    dispatcher.register(msg_id::SKILL_REQ, Box::new(combat::handle_skill));
    dispatcher.register(msg_id::NPC_INTERACT_REQ, Box::new(npc::handle_interact));
    dispatcher.register(msg_id::NPC_MENU_SELECT, Box::new(npc::handle_menu_select));
}
