use std::rc::Rc;

use log::warn;

use emberfall_shared::protocol::messages::login::{CreateAccountRsp, HeartbeatRsp, Kick, LoginRsp};
use emberfall_shared::protocol::msg_id;

use crate::dispatch::MessageDispatcher;
use crate::handlers::callback::{fire, Callback};

/// Callbacks for the login area.
#[derive(Default)]
pub struct LoginCallbacks {
    pub on_login: Option<Callback<LoginRsp>>,
    pub on_account_created: Option<Callback<CreateAccountRsp>>,
    pub on_heartbeat: Option<Callback<HeartbeatRsp>>,
    pub on_kick: Option<Callback<Kick>>,
}

pub fn register(dispatcher: &mut MessageDispatcher, callbacks: LoginCallbacks) {
    let callbacks = Rc::new(callbacks);

    let c = callbacks.clone();
    dispatcher.register_handler(
        msg_id::LOGIN_RSP,
        Box::new(move |packet| match packet.decode::<LoginRsp>() {
            Ok(rsp) => fire(&c.on_login, &rsp),
            Err(err) => warn!("bad LoginRsp: {err}"),
        }),
    );

    let c = callbacks.clone();
    dispatcher.register_handler(
        msg_id::CREATE_ACCOUNT_RSP,
        Box::new(move |packet| match packet.decode::<CreateAccountRsp>() {
            Ok(rsp) => fire(&c.on_account_created, &rsp),
            Err(err) => warn!("bad CreateAccountRsp: {err}"),
        }),
    );

    let c = callbacks.clone();
    dispatcher.register_handler(
        msg_id::HEARTBEAT_RSP,
        Box::new(move |packet| {
            if let Ok(rsp) = packet.decode::<HeartbeatRsp>() {
                fire(&c.on_heartbeat, &rsp);
            }
        }),
    );

    let c = callbacks;
    dispatcher.register_handler(
        msg_id::KICK,
        Box::new(move |packet| match packet.decode::<Kick>() {
            Ok(kick) => fire(&c.on_kick, &kick),
            Err(err) => warn!("bad Kick: {err}"),
        }),
    );
}
