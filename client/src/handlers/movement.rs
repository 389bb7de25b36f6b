use std::cell::RefCell;
use std::rc::Rc;

use log::warn;

use emberfall_shared::protocol::messages::game::{
    EntityDespawn, EntityPosition, EntitySpawn, EntityStats as EntityStatsMsg, EntityUpdate,
    MonsterDeath, MoveRsp,
};
use emberfall_shared::protocol::msg_id;
use emberfall_shared::types::TilePoint;
use emberfall_shared::ResponseCode;

use crate::dispatch::MessageDispatcher;
use crate::handlers::callback::{fire, Callback};
use crate::movement::MovementController;
use crate::world::{Entity, EntityMirror, EntityStats};

/// Callbacks for the game/movement area. The mirror and the movement
/// controller are updated before any callback fires, so callbacks
/// observe post-update state.
#[derive(Default)]
pub struct MovementCallbacks {
    pub on_move: Option<Callback<MoveRsp>>,
    pub on_entity_spawn: Option<Callback<EntitySpawn>>,
    pub on_entity_despawn: Option<Callback<EntityDespawn>>,
    pub on_monster_death: Option<Callback<MonsterDeath>>,
}

pub fn register(
    dispatcher: &mut MessageDispatcher,
    mirror: Rc<RefCell<EntityMirror>>,
    movement: Rc<RefCell<MovementController>>,
    callbacks: MovementCallbacks,
) {
    let callbacks = Rc::new(callbacks);

    let c = callbacks.clone();
    dispatcher.register_handler(
        msg_id::MOVE_RSP,
        Box::new(move |packet| match packet.decode::<MoveRsp>() {
            Ok(rsp) => {
                let mut movement = movement.borrow_mut();
                if rsp.code == ResponseCode::Ok {
                    movement.on_move_response(TilePoint::new(rsp.x, rsp.y));
                } else {
                    movement.on_move_failed();
                }
                drop(movement);
                fire(&c.on_move, &rsp);
            }
            Err(err) => warn!("bad MoveRsp: {err}"),
        }),
    );

    let m = mirror.clone();
    let c = callbacks.clone();
    dispatcher.register_handler(
        msg_id::ENTITY_SPAWN,
        Box::new(move |packet| match packet.decode::<EntitySpawn>() {
            Ok(spawn) => {
                m.borrow_mut()
                    .add_entity(Entity::from_snapshot(&spawn.entity));
                fire(&c.on_entity_spawn, &spawn);
            }
            Err(err) => warn!("bad EntitySpawn: {err}"),
        }),
    );

    let m = mirror.clone();
    let c = callbacks.clone();
    dispatcher.register_handler(
        msg_id::ENTITY_DESPAWN,
        Box::new(move |packet| match packet.decode::<EntityDespawn>() {
            Ok(despawn) => {
                m.borrow_mut().remove_entity(despawn.entity_id);
                fire(&c.on_entity_despawn, &despawn);
            }
            Err(err) => warn!("bad EntityDespawn: {err}"),
        }),
    );

    let m = mirror.clone();
    dispatcher.register_handler(
        msg_id::ENTITY_UPDATE,
        Box::new(move |packet| match packet.decode::<EntityUpdate>() {
            Ok(update) => m.borrow_mut().update_entity(&update.entity),
            Err(err) => warn!("bad EntityUpdate: {err}"),
        }),
    );

    let m = mirror.clone();
    dispatcher.register_handler(
        msg_id::ENTITY_POSITION,
        Box::new(move |packet| match packet.decode::<EntityPosition>() {
            Ok(position) => {
                m.borrow_mut().update_entity_position(
                    position.entity_id,
                    TilePoint::new(position.x, position.y),
                    position.direction,
                    position.server_time_ms,
                );
            }
            Err(err) => warn!("bad EntityPosition: {err}"),
        }),
    );

    let m = mirror.clone();
    dispatcher.register_handler(
        msg_id::ENTITY_STATS,
        Box::new(move |packet| match packet.decode::<EntityStatsMsg>() {
            Ok(stats) => {
                m.borrow_mut().update_entity_stats(
                    stats.entity_id,
                    EntityStats {
                        hp: stats.hp,
                        max_hp: stats.max_hp,
                        mp: stats.mp,
                        max_mp: stats.max_mp,
                        level: stats.level,
                    },
                );
            }
            Err(err) => warn!("bad EntityStats: {err}"),
        }),
    );

    let m = mirror;
    let c = callbacks;
    dispatcher.register_handler(
        msg_id::MONSTER_DEATH,
        Box::new(move |packet| match packet.decode::<MonsterDeath>() {
            Ok(death) => {
                if let Some(entity) = m.borrow_mut().get_mut(death.entity_id) {
                    entity.stats.hp = 0;
                }
                fire(&c.on_monster_death, &death);
            }
            Err(err) => warn!("bad MonsterDeath: {err}"),
        }),
    );
}
