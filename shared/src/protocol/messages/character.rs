use serde::{Deserialize, Serialize};

use crate::protocol::response::ResponseCode;
use crate::types::{CharacterClass, CharacterId, Gender, MapId};

/// One row of the character-select list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSummary {
    pub character_id: CharacterId,
    pub name: String,
    pub class: CharacterClass,
    pub gender: Gender,
    pub level: u16,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleListReq {
    pub account_id: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleListRsp {
    pub code: ResponseCode,
    pub roles: Vec<RoleSummary>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRoleReq {
    pub account_id: u64,
    pub name: String,
    pub class: CharacterClass,
    pub gender: Gender,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRoleRsp {
    pub code: ResponseCode,
    pub character_id: CharacterId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectRoleReq {
    pub character_id: CharacterId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectRoleRsp {
    pub code: ResponseCode,
    pub character_id: CharacterId,
}

/// Full player snapshot sent on entering the game world.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub character_id: CharacterId,
    pub name: String,
    pub class: CharacterClass,
    pub level: u16,
    pub hp: i32,
    pub max_hp: i32,
    pub mp: i32,
    pub max_mp: i32,
    pub map_id: MapId,
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnterGameReq {
    pub character_id: CharacterId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnterGameRsp {
    pub code: ResponseCode,
    pub player: Option<PlayerInfo>,
}
