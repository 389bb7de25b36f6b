use log::debug;

use emberfall_shared::protocol::messages::game::MoveReq;
use emberfall_shared::protocol::msg_id;
use emberfall_shared::types::TilePoint;
use emberfall_shared::encode_payload;

use crate::interpolate::{PositionInterpolator, DEFAULT_INTERPOLATION_MS};
use crate::network::MessageSender;

/// Map collision queries, implemented by the (out-of-scope) map layer.
pub trait WalkabilityProvider {
    fn is_walkable(&self, x: i32, y: i32) -> bool;
    fn is_valid_position(&self, x: i32, y: i32) -> bool;
}

/// Request/response movement with rollback. The server is authoritative:
/// the controller never predicts a final position, it only smooths the
/// visible one toward whatever the server confirms.
pub struct MovementController {
    last_confirmed: TilePoint,
    pending_target: Option<TilePoint>,
    interpolator: PositionInterpolator,
}

impl MovementController {
    pub fn new(initial: TilePoint) -> Self {
        Self {
            last_confirmed: initial,
            pending_target: None,
            interpolator: PositionInterpolator::new(initial),
        }
    }

    /// Validates a move locally and, when passable, sends the request.
    /// Returns whether a request went out.
    pub fn request_move(
        &mut self,
        walkability: &dyn WalkabilityProvider,
        network: &mut dyn MessageSender,
        from: TilePoint,
        target: TilePoint,
    ) -> bool {
        if !walkability.is_valid_position(target.x, target.y)
            || !walkability.is_walkable(target.x, target.y)
        {
            debug!("move to ({}, {}) rejected locally", target.x, target.y);
            return false;
        }
        let _ = from;

        let req = MoveReq {
            target_x: target.x,
            target_y: target.y,
        };
        let Ok(payload) = encode_payload(&req) else {
            return false;
        };
        network.send_message(msg_id::MOVE_REQ, &payload);
        self.pending_target = Some(target);
        true
    }

    /// Server accepted: the confirmed position moves and the visible
    /// position glides toward it.
    pub fn on_move_response(&mut self, confirmed: TilePoint) {
        self.last_confirmed = confirmed;
        self.pending_target = None;
        self.interpolator
            .set_target(confirmed, DEFAULT_INTERPOLATION_MS);
    }

    /// Server rejected: roll the visible position back to the last
    /// confirmed tile.
    pub fn on_move_failed(&mut self) {
        self.pending_target = None;
        self.interpolator
            .set_target(self.last_confirmed, DEFAULT_INTERPOLATION_MS);
    }

    pub fn update(&mut self, delta_ms: f32) {
        self.interpolator.update(delta_ms);
    }

    pub fn last_confirmed_position(&self) -> TilePoint {
        self.last_confirmed
    }

    pub fn has_pending_move(&self) -> bool {
        self.pending_target.is_some()
    }

    pub fn tile_position(&self) -> TilePoint {
        self.interpolator.tile_position()
    }

    pub fn interpolator(&self) -> &PositionInterpolator {
        &self.interpolator
    }

    pub fn interpolator_mut(&mut self) -> &mut PositionInterpolator {
        &mut self.interpolator
    }
}
