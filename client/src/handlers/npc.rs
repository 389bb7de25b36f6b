//! NPC area handlers. Bodies are JSON on the wire; decoding failures
//! are logged and dropped like any other verification failure.

use std::rc::Rc;

use log::warn;

use emberfall_shared::protocol::messages::npc::{
    NpcDialogShow, NpcInteractRsp, NpcQuestAccept, NpcQuestComplete, NpcShopClose, NpcShopOpen,
};
use emberfall_shared::protocol::msg_id;

use crate::dispatch::MessageDispatcher;
use crate::handlers::callback::{fire, Callback};

#[derive(Default)]
pub struct NpcCallbacks {
    pub on_interact: Option<Callback<NpcInteractRsp>>,
    pub on_dialog: Option<Callback<NpcDialogShow>>,
    pub on_shop_open: Option<Callback<NpcShopOpen>>,
    pub on_shop_close: Option<Callback<NpcShopClose>>,
    pub on_quest_accepted: Option<Callback<NpcQuestAccept>>,
    pub on_quest_completed: Option<Callback<NpcQuestComplete>>,
}

pub fn register(dispatcher: &mut MessageDispatcher, callbacks: NpcCallbacks) {
    let callbacks = Rc::new(callbacks);

    let c = callbacks.clone();
    dispatcher.register_handler(
        msg_id::NPC_INTERACT_RSP,
        Box::new(move |packet| match packet.decode_json::<NpcInteractRsp>() {
            Ok(rsp) => fire(&c.on_interact, &rsp),
            Err(err) => warn!("bad NpcInteractRsp: {err}"),
        }),
    );

    let c = callbacks.clone();
    dispatcher.register_handler(
        msg_id::NPC_DIALOG_SHOW,
        Box::new(move |packet| match packet.decode_json::<NpcDialogShow>() {
            Ok(dialog) => fire(&c.on_dialog, &dialog),
            Err(err) => warn!("bad NpcDialogShow: {err}"),
        }),
    );

    let c = callbacks.clone();
    dispatcher.register_handler(
        msg_id::NPC_SHOP_OPEN,
        Box::new(move |packet| match packet.decode_json::<NpcShopOpen>() {
            Ok(shop) => fire(&c.on_shop_open, &shop),
            Err(err) => warn!("bad NpcShopOpen: {err}"),
        }),
    );

    let c = callbacks.clone();
    dispatcher.register_handler(
        msg_id::NPC_SHOP_CLOSE,
        Box::new(move |packet| match packet.decode_json::<NpcShopClose>() {
            Ok(shop) => fire(&c.on_shop_close, &shop),
            Err(err) => warn!("bad NpcShopClose: {err}"),
        }),
    );

    let c = callbacks.clone();
    dispatcher.register_handler(
        msg_id::NPC_QUEST_ACCEPT,
        Box::new(move |packet| match packet.decode_json::<NpcQuestAccept>() {
            Ok(quest) => fire(&c.on_quest_accepted, &quest),
            Err(err) => warn!("bad NpcQuestAccept: {err}"),
        }),
    );

    let c = callbacks;
    dispatcher.register_handler(
        msg_id::NPC_QUEST_COMPLETE,
        Box::new(move |packet| match packet.decode_json::<NpcQuestComplete>() {
            Ok(quest) => fire(&c.on_quest_completed, &quest),
            Err(err) => warn!("bad NpcQuestComplete: {err}"),
        }),
    );
}
