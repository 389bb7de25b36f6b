//! Common functionality shared between the emberfall server & client:
//! the framed wire protocol and its typed messages, the uniform spatial
//! grid, snowflake id generation, and the YAML content configuration
//! loaders.

pub mod config;
pub mod constants;
pub mod protocol;
pub mod snowflake;
pub mod spatial;
pub mod transport;
pub mod types;

pub use constants::*;
pub use protocol::codec::{encode_frame, encode_json_payload, encode_payload, FrameDecoder};
pub use protocol::header::{HeaderStatus, PacketHeader};
pub use protocol::response::ResponseCode;
pub use protocol::{MsgId, Packet, ProtocolError};
pub use snowflake::{SnowflakeError, SnowflakeIdGenerator};
pub use spatial::SpatialGrid;
pub use transport::TransportError;
pub use types::{chebyshev_distance, Direction, Rect, TilePoint};
