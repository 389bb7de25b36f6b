use log::debug;
use serde::Serialize;

use emberfall_shared::protocol::msg_id::is_json_body;
use emberfall_shared::protocol::MsgId;
use emberfall_shared::transport::TransportError;
use emberfall_shared::{encode_json_payload, encode_payload, FLAG_JSON_BODY};

use crate::dispatch::MessageDispatcher;
use crate::transport::{ConnectionState, NetworkClient, TcpNetworkClient};

/// Anything that can push an encoded message toward the server. The
/// movement controller and handler-side request helpers depend on this
/// rather than the concrete transport.
pub trait MessageSender {
    fn send_message(&mut self, msg_id: MsgId, payload: &[u8]);
}

/// Owns the transport and the dispatcher; `update()` pumps connection
/// events and routes every received packet, in wire order, on the
/// calling (main) thread.
pub struct NetworkManager {
    client: Box<dyn NetworkClient>,
    pub dispatcher: MessageDispatcher,
    on_connect: Option<Box<dyn FnMut()>>,
    on_disconnect: Option<Box<dyn FnMut(&TransportError)>>,
}

impl NetworkManager {
    pub fn new() -> Self {
        Self::with_client(Box::new(TcpNetworkClient::default()))
    }

    pub fn with_client(client: Box<dyn NetworkClient>) -> Self {
        Self {
            client,
            dispatcher: MessageDispatcher::new(),
            on_connect: None,
            on_disconnect: None,
        }
    }

    pub fn connect(&mut self, host: &str, port: u16) -> bool {
        self.client.connect(host, port)
    }

    pub fn disconnect(&mut self) {
        self.client.disconnect();
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_connected()
    }

    pub fn state(&self) -> ConnectionState {
        self.client.state()
    }

    pub fn last_error(&self) -> Option<TransportError> {
        self.client.last_error()
    }

    pub fn rtt_ms(&self) -> Option<u32> {
        self.client.rtt_ms()
    }

    pub fn set_on_connect(&mut self, callback: Box<dyn FnMut()>) {
        self.on_connect = Some(callback);
    }

    pub fn set_on_disconnect(&mut self, callback: Box<dyn FnMut(&TransportError)>) {
        self.on_disconnect = Some(callback);
    }

    /// Serializes and sends a typed body, picking the JSON encoding for
    /// the NPC id range automatically.
    pub fn send<T: Serialize>(&mut self, msg_id: MsgId, body: &T) {
        if is_json_body(msg_id) {
            match encode_json_payload(body) {
                Ok(payload) => self.client.send(msg_id, FLAG_JSON_BODY, &payload),
                Err(err) => debug!("failed to encode 0x{msg_id:04X}: {err}"),
            }
        } else {
            match encode_payload(body) {
                Ok(payload) => self.client.send(msg_id, 0, &payload),
                Err(err) => debug!("failed to encode 0x{msg_id:04X}: {err}"),
            }
        }
    }

    /// Pumps the transport: connection callbacks fire here, then every
    /// queued packet is dispatched.
    pub fn update(&mut self) {
        self.client.update();

        if self.client.take_connect_event() {
            if let Some(callback) = self.on_connect.as_mut() {
                callback();
            }
        }
        if let Some(error) = self.client.take_disconnect_event() {
            if let Some(callback) = self.on_disconnect.as_mut() {
                callback(&error);
            }
        }

        while let Some(packet) = self.client.poll_packet() {
            self.dispatcher.dispatch(&packet);
        }
    }
}

impl Default for NetworkManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageSender for NetworkManager {
    fn send_message(&mut self, msg_id: MsgId, payload: &[u8]) {
        let flags = if is_json_body(msg_id) { FLAG_JSON_BODY } else { 0 };
        self.client.send(msg_id, flags, payload);
    }
}
