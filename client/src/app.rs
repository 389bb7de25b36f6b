use std::cell::RefCell;
use std::rc::Rc;

use emberfall_shared::types::TilePoint;

use crate::handlers::{ClientCallbacks, HandlerRegistry};
use crate::movement::MovementController;
use crate::network::NetworkManager;
use crate::skills::SkillBook;
use crate::world::EntityMirror;

/// The client's main-loop core: the network pump, the entity mirror,
/// the movement controller, and the skill book, advanced once per
/// frame. Rendering, UI, and audio hang off the handler callbacks and
/// the mirror's view queries; game state never mutates outside
/// [`GameClient::update`].
pub struct GameClient {
    pub network: NetworkManager,
    pub mirror: Rc<RefCell<EntityMirror>>,
    pub movement: Rc<RefCell<MovementController>>,
    pub skills: Rc<RefCell<SkillBook>>,
}

impl GameClient {
    pub fn new(callbacks: ClientCallbacks) -> Self {
        Self::with_network(NetworkManager::new(), callbacks)
    }

    pub fn with_network(mut network: NetworkManager, callbacks: ClientCallbacks) -> Self {
        let mirror = Rc::new(RefCell::new(EntityMirror::default()));
        let movement = Rc::new(RefCell::new(MovementController::new(TilePoint::new(0, 0))));
        let skills = Rc::new(RefCell::new(SkillBook::new()));

        HandlerRegistry::register_all(
            &mut network.dispatcher,
            mirror.clone(),
            movement.clone(),
            skills.clone(),
            callbacks,
        );

        Self {
            network,
            mirror,
            movement,
            skills,
        }
    }

    pub fn connect(&mut self, host: &str, port: u16) -> bool {
        self.network.connect(host, port)
    }

    /// One frame: pump the transport (messages dispatch here, on this
    /// thread), then advance the interpolators and cooldown clocks.
    pub fn update(&mut self, delta_ms: f32) {
        self.network.update();
        self.mirror.borrow_mut().update_interpolators(delta_ms);
        self.movement.borrow_mut().update(delta_ms);
        self.skills.borrow_mut().update(delta_ms);
    }
}
