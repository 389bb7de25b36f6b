//! Client-side core: the TCP session transport with heartbeat/RTT and
//! reconnect, the message dispatcher and handler registry, the
//! server-authoritative entity mirror with position interpolation, the
//! request/response movement controller, and the async resource loader.
//!
//! Everything here is driven from the main thread's `update()` calls;
//! the transport's internal I/O thread only moves bytes into queues.

pub mod app;
pub mod dispatch;
pub mod handlers;
pub mod interpolate;
pub mod movement;
pub mod network;
pub mod resource;
pub mod skills;
pub mod transport;
pub mod world;

pub use app::GameClient;
pub use dispatch::MessageDispatcher;
pub use interpolate::{EntityInterpolator, PositionInterpolator};
pub use movement::{MovementController, WalkabilityProvider};
pub use network::{MessageSender, NetworkManager};
pub use skills::{KnownSkill, SkillBook};
pub use transport::{ConnectionState, NetworkClient, TcpNetworkClient, TransportConfig};
pub use world::{Entity, EntityMirror, EntityStats};
