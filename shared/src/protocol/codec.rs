use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::constants::{HEADER_LEN, MAX_PAYLOAD_LEN};
use crate::protocol::error::ProtocolError;
use crate::protocol::header::{HeaderStatus, PacketHeader};
use crate::protocol::{MsgId, Packet};

/// Encoding options for payload bodies: fixed-width integers, a hard size
/// limit, and no trailing garbage accepted on decode. Both sides must use
/// the same options or nothing round-trips.
fn body_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .with_limit(MAX_PAYLOAD_LEN as u64)
}

/// Serializes a payload body.
pub fn encode_payload<T: Serialize>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    body_options()
        .serialize(value)
        .map_err(|e| ProtocolError::VerifyFailed(e.to_string()))
}

/// Verifies and deserializes a payload body. Trailing bytes, truncation,
/// and out-of-range enum tags all surface as `VerifyFailed`.
pub fn decode_payload<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    body_options()
        .deserialize(bytes)
        .map_err(|e| ProtocolError::VerifyFailed(e.to_string()))
}

/// Serializes a JSON payload body (NPC family).
pub fn encode_json_payload<T: Serialize>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    serde_json::to_vec(value).map_err(|e| ProtocolError::VerifyFailed(e.to_string()))
}

/// Verifies and deserializes a JSON payload body.
pub fn decode_json_payload<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    serde_json::from_slice(bytes).map_err(|e| ProtocolError::VerifyFailed(e.to_string()))
}

/// Builds a complete frame: header (with the computed payload length)
/// followed by the payload bytes.
pub fn encode_frame(
    msg_id: MsgId,
    sequence: u16,
    flags: u8,
    payload: &[u8],
) -> Result<Vec<u8>, ProtocolError> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(ProtocolError::PayloadTooLarge {
            len: payload.len(),
            max: MAX_PAYLOAD_LEN,
        });
    }
    let header = PacketHeader::new(msg_id, sequence, flags, payload.len() as u32);
    let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
    frame.extend_from_slice(&header.encode());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Incremental deframer for a TCP byte stream.
///
/// Feed raw bytes in arrival order; `next_packet` yields complete frames
/// in the same order. On error the caller owns the session's fate (drop
/// the frame or the connection); the decoder discards the bad header
/// bytes so a subsequent resync attempt is possible.
#[derive(Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Number of buffered, not-yet-consumed bytes.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn next_packet(&mut self) -> Result<Option<Packet>, ProtocolError> {
        let header = match PacketHeader::decode(&self.buffer) {
            Ok(HeaderStatus::NeedMore) => return Ok(None),
            Ok(HeaderStatus::Header(header)) => header,
            Err(err) => {
                self.buffer.drain(..HEADER_LEN.min(self.buffer.len()));
                return Err(err);
            }
        };

        let frame_len = HEADER_LEN + header.payload_len as usize;
        if self.buffer.len() < frame_len {
            return Ok(None);
        }

        let payload = self.buffer[HEADER_LEN..frame_len].to_vec();
        self.buffer.drain(..frame_len);
        Ok(Some(Packet { header, payload }))
    }
}
