use log::debug;

use emberfall_shared::protocol::messages::game::{EntityPosition, MoveReq, MoveRsp};
use emberfall_shared::protocol::{msg_id, Packet};
use emberfall_shared::types::{chebyshev_distance, TilePoint};
use emberfall_shared::ResponseCode;

use crate::handlers::{wire_entity_id, GameContext};
use crate::net::session::{unix_time_ms, SessionId};

/// Farthest a single move request may jump. Anything longer is a
/// rejected (not resynced) move.
const MAX_MOVE_DISTANCE: i32 = 15;

pub fn handle_move(ctx: &mut GameContext, session_id: SessionId, packet: &Packet) {
    let Ok(req) = packet.decode::<MoveReq>() else {
        return;
    };
    let Some(entity) = ctx.session_entity(session_id) else {
        ctx.send(
            session_id,
            msg_id::MOVE_RSP,
            &MoveRsp {
                code: ResponseCode::InvalidAction,
                x: 0,
                y: 0,
            },
        );
        return;
    };

    let Some((current, map_id)) = ctx
        .world
        .registry
        .transforms
        .get(entity)
        .map(|t| (t.position, t.map_id))
    else {
        return;
    };
    let target = TilePoint::new(req.target_x, req.target_y);

    let valid = target.x >= 0
        && target.y >= 0
        && chebyshev_distance(current, target) <= MAX_MOVE_DISTANCE
        && ctx
            .world
            .registry
            .attributes
            .get(entity)
            .is_none_or(|a| a.hp > 0);

    if !valid {
        debug!(
            "session {session_id}: rejected move {:?} -> {:?}",
            current, target
        );
        ctx.send(
            session_id,
            msg_id::MOVE_RSP,
            &MoveRsp {
                code: ResponseCode::InvalidAction,
                x: current.x,
                y: current.y,
            },
        );
        return;
    }

    ctx.world.set_position(entity, target);
    if let Some(transform) = ctx.world.registry.transforms.get_mut(entity) {
        transform.direction = emberfall_shared::types::Direction::between(current, target);
        transform.last_active_ms = unix_time_ms();
    }
    ctx.world.dirty.mark_attributes(entity);

    ctx.send(
        session_id,
        msg_id::MOVE_RSP,
        &MoveRsp {
            code: ResponseCode::Ok,
            x: target.x,
            y: target.y,
        },
    );

    // Everyone else on the map sees the authoritative position.
    let direction = ctx
        .world
        .registry
        .transforms
        .get(entity)
        .map_or(0, |t| t.direction as u8);
    ctx.broadcast_to_map(
        map_id,
        msg_id::ENTITY_POSITION,
        &EntityPosition {
            entity_id: wire_entity_id(entity),
            x: target.x,
            y: target.y,
            direction,
            server_time_ms: unix_time_ms(),
        },
    );
}
