use std::cell::RefCell;
use std::rc::Rc;

use crate::dispatch::MessageDispatcher;
use crate::handlers::character::CharacterCallbacks;
use crate::handlers::combat::CombatCallbacks;
use crate::handlers::effect::EffectCallbacks;
use crate::handlers::login::LoginCallbacks;
use crate::handlers::movement::MovementCallbacks;
use crate::handlers::npc::NpcCallbacks;
use crate::handlers::system::SystemCallbacks;
use crate::handlers::{character, combat, effect, login, movement, npc, system};
use crate::movement::MovementController;
use crate::skills::SkillBook;
use crate::world::EntityMirror;

/// Every per-area callback set in one place. Fields the caller leaves
/// defaulted simply never fire.
#[derive(Default)]
pub struct ClientCallbacks {
    pub login: LoginCallbacks,
    pub character: CharacterCallbacks,
    pub movement: MovementCallbacks,
    pub combat: CombatCallbacks,
    pub effect: EffectCallbacks,
    pub system: SystemCallbacks,
    pub npc: NpcCallbacks,
}

/// Wires the full client-side handler family into a dispatcher. The
/// mirror and the movement controller receive authoritative updates
/// before any user callback observes them.
pub struct HandlerRegistry;

impl HandlerRegistry {
    pub fn register_all(
        dispatcher: &mut MessageDispatcher,
        mirror: Rc<RefCell<EntityMirror>>,
        movement_controller: Rc<RefCell<MovementController>>,
        skill_book: Rc<RefCell<SkillBook>>,
        callbacks: ClientCallbacks,
    ) {
        login::register(dispatcher, callbacks.login);
        character::register(dispatcher, callbacks.character);
        movement::register(dispatcher, mirror, movement_controller, callbacks.movement);
        combat::register(dispatcher, callbacks.combat);
        effect::register(dispatcher, skill_book, callbacks.effect);
        system::register(dispatcher, callbacks.system);
        npc::register(dispatcher, callbacks.npc);
    }
}
