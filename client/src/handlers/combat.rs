use std::rc::Rc;

use log::warn;

use emberfall_shared::protocol::messages::combat::AttackRsp;
use emberfall_shared::protocol::msg_id;

use crate::dispatch::MessageDispatcher;
use crate::handlers::callback::{fire, Callback};

#[derive(Default)]
pub struct CombatCallbacks {
    pub on_attack: Option<Callback<AttackRsp>>,
}

pub fn register(dispatcher: &mut MessageDispatcher, callbacks: CombatCallbacks) {
    let callbacks = Rc::new(callbacks);

    let c = callbacks;
    dispatcher.register_handler(
        msg_id::ATTACK_RSP,
        Box::new(move |packet| match packet.decode::<AttackRsp>() {
            Ok(rsp) => fire(&c.on_attack, &rsp),
            Err(err) => warn!("bad AttackRsp: {err}"),
        }),
    );
}
