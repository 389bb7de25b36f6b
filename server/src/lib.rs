//! The authoritative emberfall game server: an ECS world advanced at a
//! fixed 20 Hz tick, combat resolution, per-type monster AI, timed
//! spawns and loot drops, inventory/skill mutation, a cache-first
//! write-behind persistence layer, and the TCP session transport that
//! feeds it all.
//!
//! Threading model: socket I/O runs on per-connection reader/writer
//! threads whose only shared state with the logic thread is each
//! session's receive queue and writer channel. Every world mutation
//! happens on the logic thread inside [`app::GameServer`]'s tick loop.

pub mod ai;
pub mod app;
pub mod combat;
pub mod content;
pub mod ecs;
pub mod handlers;
pub mod net;
pub mod persist;
pub mod systems;

pub use app::{GameServer, ServerConfig};
pub use content::Registries;
