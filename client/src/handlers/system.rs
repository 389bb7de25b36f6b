use std::rc::Rc;

use log::warn;

use emberfall_shared::protocol::messages::login::Kick;
use emberfall_shared::protocol::messages::system::ServerNotice;
use emberfall_shared::protocol::msg_id;

use crate::dispatch::MessageDispatcher;
use crate::handlers::callback::{fire, Callback};

#[derive(Default)]
pub struct SystemCallbacks {
    pub on_notice: Option<Callback<ServerNotice>>,
    pub on_kick: Option<Callback<Kick>>,
}

pub fn register(dispatcher: &mut MessageDispatcher, callbacks: SystemCallbacks) {
    let callbacks = Rc::new(callbacks);

    let c = callbacks.clone();
    dispatcher.register_handler(
        msg_id::SERVER_NOTICE,
        Box::new(move |packet| match packet.decode::<ServerNotice>() {
            Ok(notice) => fire(&c.on_notice, &notice),
            Err(err) => warn!("bad ServerNotice: {err}"),
        }),
    );

    let c = callbacks;
    dispatcher.register_handler(
        msg_id::SYSTEM_KICK,
        Box::new(move |packet| match packet.decode::<Kick>() {
            Ok(kick) => fire(&c.on_kick, &kick),
            Err(err) => warn!("bad system Kick: {err}"),
        }),
    );
}
