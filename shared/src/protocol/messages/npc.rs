//! NPC message bodies. This family is JSON on the wire so that dialog and
//! quest content stays editable without a schema recompile; frames carry
//! [`crate::constants::FLAG_JSON_BODY`].

use serde::{Deserialize, Serialize};

use crate::protocol::response::ResponseCode;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcInteractReq {
    pub npc_id: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcInteractRsp {
    pub code: ResponseCode,
    pub npc_id: u64,
    pub dialog_id: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcDialogShow {
    pub npc_id: u64,
    pub dialog_id: u32,
    pub text: String,
    pub options: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcMenuSelect {
    pub npc_id: u64,
    pub dialog_id: u32,
    pub option_index: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcShopItem {
    pub item_template_id: u32,
    pub price: i64,
    pub stock: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcShopOpen {
    pub npc_id: u64,
    pub items: Vec<NpcShopItem>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcShopClose {
    pub npc_id: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcQuestAccept {
    pub npc_id: u64,
    pub quest_id: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcQuestComplete {
    pub npc_id: u64,
    pub quest_id: u32,
    pub reward_item_ids: Vec<u32>,
}
