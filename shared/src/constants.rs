use std::time::Duration;

/// First four bytes of every frame ("EMBR", little-endian on the wire).
pub const PROTOCOL_MAGIC: u32 = 0x454D_4252;

/// Current framing version. V1 frames are rejected with `UnsupportedVersion`.
pub const PROTOCOL_VERSION: u8 = 2;

/// Fixed frame header size in bytes.
pub const HEADER_LEN: usize = 16;

/// Upper bound on a single payload body. Larger frames are rejected before
/// any allocation happens.
pub const MAX_PAYLOAD_LEN: usize = 64 * 1024;

/// Header flag: the payload body is JSON instead of binary (NPC family).
pub const FLAG_JSON_BODY: u8 = 0x01;

/// Bag capacity per character.
pub const MAX_INVENTORY_SIZE: usize = 40;

/// Number of equipment slots per character.
pub const EQUIP_SLOT_COUNT: usize = 13;

/// Skill list capacity per character.
pub const MAX_SKILLS: usize = 20;

/// Interval between client heartbeats.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// A connection with no inbound traffic for this long is declared dead.
pub const HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(15);

/// Server logic tick interval (20 Hz).
pub const TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Default interval between write-behind flushes.
pub const FLUSH_INTERVAL: Duration = Duration::from_secs(30);

/// Default TTL for cached account sessions.
pub const SESSION_TTL: Duration = Duration::from_secs(30 * 60);
