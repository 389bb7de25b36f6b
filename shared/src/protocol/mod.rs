//! The session-oriented wire protocol: a fixed 16-byte V2 header followed
//! by a length-prefixed payload body. Bodies are binary-encoded and
//! structurally verified before dispatch; the NPC family carries JSON for
//! content-editor compatibility.

pub mod codec;
pub mod error;
pub mod header;
pub mod messages;
pub mod msg_id;
pub mod response;

pub use error::ProtocolError;
pub use header::{HeaderStatus, PacketHeader};
pub use response::ResponseCode;

/// Stable 16-bit message id, partitioned by area (see [`msg_id`]).
pub type MsgId = u16;

/// A decoded frame: header plus raw payload bytes. Typed decoding happens
/// at the dispatch boundary via [`Packet::decode`] / [`Packet::decode_json`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet {
    pub header: PacketHeader,
    pub payload: Vec<u8>,
}

impl Packet {
    pub fn msg_id(&self) -> MsgId {
        self.header.msg_id
    }

    pub fn sequence(&self) -> u16 {
        self.header.sequence
    }

    /// Verifies and decodes the binary payload body.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        codec::decode_payload(&self.payload)
    }

    /// Verifies and decodes a JSON payload body (NPC family).
    pub fn decode_json<T: serde::de::DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        codec::decode_json_payload(&self.payload)
    }
}
