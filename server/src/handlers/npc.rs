//! NPC interaction handlers. Bodies are JSON so dialog and quest content
//! can be edited without touching the binary schema.

use emberfall_shared::protocol::messages::npc::{
    NpcDialogShow, NpcInteractReq, NpcInteractRsp, NpcMenuSelect, NpcShopClose,
};
use emberfall_shared::protocol::{msg_id, Packet};
use emberfall_shared::ResponseCode;

use crate::handlers::GameContext;
use crate::net::session::SessionId;

pub fn handle_interact(ctx: &mut GameContext, session_id: SessionId, packet: &Packet) {
    let Ok(req) = packet.decode_json::<NpcInteractReq>() else {
        return;
    };
    if ctx.session_entity(session_id).is_none() {
        ctx.send_json(
            session_id,
            msg_id::NPC_INTERACT_RSP,
            &NpcInteractRsp {
                code: ResponseCode::InvalidAction,
                npc_id: req.npc_id,
                dialog_id: 0,
            },
        );
        return;
    }

    ctx.send_json(
        session_id,
        msg_id::NPC_INTERACT_RSP,
        &NpcInteractRsp {
            code: ResponseCode::Ok,
            npc_id: req.npc_id,
            dialog_id: 1,
        },
    );
    ctx.send_json(
        session_id,
        msg_id::NPC_DIALOG_SHOW,
        &NpcDialogShow {
            npc_id: req.npc_id,
            dialog_id: 1,
            text: "Greetings, traveler.".into(),
            options: vec!["Shop".into(), "Leave".into()],
        },
    );
}

pub fn handle_menu_select(ctx: &mut GameContext, session_id: SessionId, packet: &Packet) {
    let Ok(req) = packet.decode_json::<NpcMenuSelect>() else {
        return;
    };
    // Option 0 is the shop; anything else closes the dialog.
    if req.option_index != 0 {
        ctx.send_json(
            session_id,
            msg_id::NPC_SHOP_CLOSE,
            &NpcShopClose { npc_id: req.npc_id },
        );
    }
}
