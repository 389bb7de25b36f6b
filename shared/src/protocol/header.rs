use crate::constants::{HEADER_LEN, MAX_PAYLOAD_LEN, PROTOCOL_MAGIC, PROTOCOL_VERSION};
use crate::protocol::error::ProtocolError;
use crate::protocol::MsgId;

/// The fixed 16-byte V2 frame header, little-endian on the wire:
///
/// `magic(u32) | version(u8) | flags(u8) | msg_id(u16) | sequence(u16) |
/// reserved(u16) | payload_len(u32)`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PacketHeader {
    pub version: u8,
    pub flags: u8,
    pub msg_id: MsgId,
    pub sequence: u16,
    pub payload_len: u32,
}

/// Outcome of attempting to read a header from a byte buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderStatus {
    /// Fewer than [`HEADER_LEN`] bytes available.
    NeedMore,
    Header(PacketHeader),
}

impl PacketHeader {
    pub fn new(msg_id: MsgId, sequence: u16, flags: u8, payload_len: u32) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            flags,
            msg_id,
            sequence,
            payload_len,
        }
    }

    /// Serializes the header into its wire form.
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(&PROTOCOL_MAGIC.to_le_bytes());
        bytes[4] = self.version;
        bytes[5] = self.flags;
        bytes[6..8].copy_from_slice(&self.msg_id.to_le_bytes());
        bytes[8..10].copy_from_slice(&self.sequence.to_le_bytes());
        // bytes 10..12 are reserved and always zero on send
        bytes[12..16].copy_from_slice(&self.payload_len.to_le_bytes());
        bytes
    }

    /// Reads and validates a header. Magic and version are checked here;
    /// the payload length bound is checked so oversized frames are
    /// rejected before any body bytes are buffered.
    pub fn decode(bytes: &[u8]) -> Result<HeaderStatus, ProtocolError> {
        if bytes.len() < HEADER_LEN {
            return Ok(HeaderStatus::NeedMore);
        }

        let magic = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if magic != PROTOCOL_MAGIC {
            return Err(ProtocolError::InvalidMagic(magic));
        }

        let version = bytes[4];
        if version != PROTOCOL_VERSION {
            return Err(ProtocolError::UnsupportedVersion(version));
        }

        let payload_len = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);
        if payload_len as usize > MAX_PAYLOAD_LEN {
            return Err(ProtocolError::PayloadTooLarge {
                len: payload_len as usize,
                max: MAX_PAYLOAD_LEN,
            });
        }

        Ok(HeaderStatus::Header(PacketHeader {
            version,
            flags: bytes[5],
            msg_id: u16::from_le_bytes([bytes[6], bytes[7]]),
            sequence: u16::from_le_bytes([bytes[8], bytes[9]]),
            payload_len,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let header = PacketHeader::new(0x1203, 77, 0, 1024);
        let bytes = header.encode();
        match PacketHeader::decode(&bytes).unwrap() {
            HeaderStatus::Header(decoded) => assert_eq!(decoded, header),
            HeaderStatus::NeedMore => panic!("full header must decode"),
        }
    }

    #[test]
    fn short_buffer_needs_more() {
        let header = PacketHeader::new(1, 1, 0, 0);
        let bytes = header.encode();
        assert_eq!(
            PacketHeader::decode(&bytes[..HEADER_LEN - 1]).unwrap(),
            HeaderStatus::NeedMore
        );
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut bytes = PacketHeader::new(1, 1, 0, 0).encode();
        bytes[0] ^= 0xFF;
        assert!(matches!(
            PacketHeader::decode(&bytes),
            Err(ProtocolError::InvalidMagic(_))
        ));
    }

    #[test]
    fn v1_frames_are_rejected() {
        let mut bytes = PacketHeader::new(1, 1, 0, 0).encode();
        bytes[4] = 1;
        assert_eq!(
            PacketHeader::decode(&bytes),
            Err(ProtocolError::UnsupportedVersion(1))
        );
    }

    #[test]
    fn oversized_payload_is_rejected_at_the_header() {
        let mut bytes = PacketHeader::new(1, 1, 0, 0).encode();
        bytes[12..16].copy_from_slice(&(MAX_PAYLOAD_LEN as u32 + 1).to_le_bytes());
        assert!(matches!(
            PacketHeader::decode(&bytes),
            Err(ProtocolError::PayloadTooLarge { .. })
        ));
    }
}
