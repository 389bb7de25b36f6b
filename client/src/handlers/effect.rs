use std::cell::RefCell;
use std::rc::Rc;

use log::warn;

use emberfall_shared::protocol::messages::combat::{PlayEffect, PlaySound, SkillEffect, SkillRsp};
use emberfall_shared::protocol::msg_id;
use emberfall_shared::ResponseCode;

use crate::dispatch::MessageDispatcher;
use crate::handlers::callback::{fire, Callback};
use crate::skills::SkillBook;

/// Callbacks for skill results and audiovisual cues. The renderer and
/// audio mixer sit behind these; the core only routes. Confirmed skill
/// cooldowns land in the skill book before any callback observes them.
#[derive(Default)]
pub struct EffectCallbacks {
    pub on_skill: Option<Callback<SkillRsp>>,
    pub on_skill_effect: Option<Callback<SkillEffect>>,
    pub on_play_effect: Option<Callback<PlayEffect>>,
    pub on_play_sound: Option<Callback<PlaySound>>,
}

pub fn register(
    dispatcher: &mut MessageDispatcher,
    skill_book: Rc<RefCell<SkillBook>>,
    callbacks: EffectCallbacks,
) {
    let callbacks = Rc::new(callbacks);

    let c = callbacks.clone();
    dispatcher.register_handler(
        msg_id::SKILL_RSP,
        Box::new(move |packet| match packet.decode::<SkillRsp>() {
            Ok(rsp) => {
                if rsp.code == ResponseCode::Ok {
                    skill_book
                        .borrow_mut()
                        .start_cooldown(rsp.skill_id, rsp.cooldown_ms);
                }
                fire(&c.on_skill, &rsp);
            }
            Err(err) => warn!("bad SkillRsp: {err}"),
        }),
    );

    let c = callbacks.clone();
    dispatcher.register_handler(
        msg_id::SKILL_EFFECT,
        Box::new(move |packet| match packet.decode::<SkillEffect>() {
            Ok(effect) => fire(&c.on_skill_effect, &effect),
            Err(err) => warn!("bad SkillEffect: {err}"),
        }),
    );

    let c = callbacks.clone();
    dispatcher.register_handler(
        msg_id::PLAY_EFFECT,
        Box::new(move |packet| match packet.decode::<PlayEffect>() {
            Ok(effect) => fire(&c.on_play_effect, &effect),
            Err(err) => warn!("bad PlayEffect: {err}"),
        }),
    );

    let c = callbacks;
    dispatcher.register_handler(
        msg_id::PLAY_SOUND,
        Box::new(move |packet| match packet.decode::<PlaySound>() {
            Ok(sound) => fire(&c.on_play_sound, &sound),
            Err(err) => warn!("bad PlaySound: {err}"),
        }),
    );
}
