use std::collections::HashMap;

use log::debug;

use emberfall_shared::protocol::{MsgId, Packet};

pub type HandlerFn = Box<dyn FnMut(&Packet)>;

/// Routes decoded packets to typed handlers by message id. Registering
/// twice replaces the earlier binding; ids with no binding fall through
/// to the default handler. Handlers must return quickly: they run on
/// the main thread inside the network pump.
#[derive(Default)]
pub struct MessageDispatcher {
    handlers: HashMap<MsgId, HandlerFn>,
    default_handler: Option<HandlerFn>,
}

impl MessageDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_handler(&mut self, msg_id: MsgId, handler: HandlerFn) {
        self.handlers.insert(msg_id, handler);
    }

    pub fn set_default_handler(&mut self, handler: HandlerFn) {
        self.default_handler = Some(handler);
    }

    pub fn has_handler(&self, msg_id: MsgId) -> bool {
        self.handlers.contains_key(&msg_id)
    }

    pub fn dispatch(&mut self, packet: &Packet) {
        if let Some(handler) = self.handlers.get_mut(&packet.msg_id()) {
            handler(packet);
        } else if let Some(default_handler) = self.default_handler.as_mut() {
            default_handler(packet);
        } else {
            debug!("no handler for msg 0x{:04X}", packet.msg_id());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn packet(msg_id: MsgId) -> Packet {
        use emberfall_shared::{FrameDecoder, encode_frame};
        let frame = encode_frame(msg_id, 0, 0, &[]).unwrap();
        let mut decoder = FrameDecoder::new();
        decoder.feed(&frame);
        decoder.next_packet().unwrap().unwrap()
    }

    #[test]
    fn registration_overrides_and_default_catches() {
        let hits = Rc::new(RefCell::new(Vec::new()));
        let mut dispatcher = MessageDispatcher::new();

        let h = hits.clone();
        dispatcher.register_handler(0x1200, Box::new(move |_| h.borrow_mut().push("first")));
        let h = hits.clone();
        dispatcher.register_handler(0x1200, Box::new(move |_| h.borrow_mut().push("second")));
        let h = hits.clone();
        dispatcher.set_default_handler(Box::new(move |_| h.borrow_mut().push("default")));

        dispatcher.dispatch(&packet(0x1200));
        dispatcher.dispatch(&packet(0x1500));

        assert_eq!(*hits.borrow(), vec!["second", "default"]);
    }
}
