use serde::{Deserialize, Serialize};

use crate::protocol::response::ResponseCode;
use crate::types::MapId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveReq {
    pub target_x: i32,
    pub target_y: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRsp {
    pub code: ResponseCode,
    pub x: i32,
    pub y: i32,
}

/// Kind tag carried by entity snapshots so the client can pick render and
/// interaction behavior.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum EntityKind {
    #[default]
    Player = 0,
    Monster = 1,
    Npc = 2,
    GroundItem = 3,
}

/// Full authoritative snapshot of one visible entity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub entity_id: u64,
    pub kind: EntityKind,
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub direction: u8,
    pub map_id: MapId,
    pub hp: i32,
    pub max_hp: i32,
    pub mp: i32,
    pub max_mp: i32,
    pub level: u16,
    /// Monster template for appearance lookup; zero for non-monsters.
    pub template_id: u32,
    pub server_time_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpawn {
    pub entity: EntitySnapshot,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDespawn {
    pub entity_id: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityUpdate {
    pub entity: EntitySnapshot,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityPosition {
    pub entity_id: u64,
    pub x: i32,
    pub y: i32,
    pub direction: u8,
    pub server_time_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityStats {
    pub entity_id: u64,
    pub hp: i32,
    pub max_hp: i32,
    pub mp: i32,
    pub max_mp: i32,
    pub level: u16,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterDeath {
    pub entity_id: u64,
    pub killer_id: u64,
    pub x: i32,
    pub y: i32,
}
