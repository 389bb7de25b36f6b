use serde::{Deserialize, Serialize};

use crate::protocol::response::ResponseCode;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackReq {
    pub target_id: u64,
    /// Attack shape selector; zero is a plain single-target strike.
    pub attack_type: u8,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackRsp {
    pub code: ResponseCode,
    pub target_id: u64,
    pub damage: i32,
    pub critical: bool,
    pub miss: bool,
    pub target_died: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillReq {
    pub skill_id: u32,
    pub target_id: u64,
    pub target_x: i32,
    pub target_y: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRsp {
    pub code: ResponseCode,
    pub skill_id: u32,
    pub damage: i32,
    pub cooldown_ms: u32,
}

/// Visual confirmation that a skill resolved, broadcast to observers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillEffect {
    pub caster_id: u64,
    pub skill_id: u32,
    pub target_id: u64,
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayEffect {
    pub effect_id: u32,
    pub entity_id: u64,
    pub x: i32,
    pub y: i32,
    pub duration_ms: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaySound {
    pub sound_id: u32,
    pub x: i32,
    pub y: i32,
}
