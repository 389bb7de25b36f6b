use std::rc::Rc;

use log::warn;

use emberfall_shared::protocol::messages::character::{
    CreateRoleRsp, EnterGameRsp, RoleListRsp, SelectRoleRsp,
};
use emberfall_shared::protocol::msg_id;

use crate::dispatch::MessageDispatcher;
use crate::handlers::callback::{fire, Callback};

/// Callbacks for the character-select flow.
#[derive(Default)]
pub struct CharacterCallbacks {
    pub on_role_list: Option<Callback<RoleListRsp>>,
    pub on_role_created: Option<Callback<CreateRoleRsp>>,
    pub on_role_selected: Option<Callback<SelectRoleRsp>>,
    pub on_enter_game: Option<Callback<EnterGameRsp>>,
}

pub fn register(dispatcher: &mut MessageDispatcher, callbacks: CharacterCallbacks) {
    let callbacks = Rc::new(callbacks);

    let c = callbacks.clone();
    dispatcher.register_handler(
        msg_id::ROLE_LIST_RSP,
        Box::new(move |packet| match packet.decode::<RoleListRsp>() {
            Ok(rsp) => fire(&c.on_role_list, &rsp),
            Err(err) => warn!("bad RoleListRsp: {err}"),
        }),
    );

    let c = callbacks.clone();
    dispatcher.register_handler(
        msg_id::CREATE_ROLE_RSP,
        Box::new(move |packet| match packet.decode::<CreateRoleRsp>() {
            Ok(rsp) => fire(&c.on_role_created, &rsp),
            Err(err) => warn!("bad CreateRoleRsp: {err}"),
        }),
    );

    let c = callbacks.clone();
    dispatcher.register_handler(
        msg_id::SELECT_ROLE_RSP,
        Box::new(move |packet| match packet.decode::<SelectRoleRsp>() {
            Ok(rsp) => fire(&c.on_role_selected, &rsp),
            Err(err) => warn!("bad SelectRoleRsp: {err}"),
        }),
    );

    let c = callbacks;
    dispatcher.register_handler(
        msg_id::ENTER_GAME_RSP,
        Box::new(move |packet| match packet.decode::<EnterGameRsp>() {
            Ok(rsp) => fire(&c.on_enter_game, &rsp),
            Err(err) => warn!("bad EnterGameRsp: {err}"),
        }),
    );
}
