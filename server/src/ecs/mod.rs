//! The server-side ECS: an arena of 32-bit entity handles, typed
//! component tables, a closed event queue, and per-character dirty
//! tracking for the write-behind persistence layer.

pub mod components;
pub mod dirty;
pub mod entity;
pub mod events;
pub mod registry;
pub mod world;

pub use components::*;
pub use dirty::{DirtyFlags, DirtyTracker};
pub use entity::Entity;
pub use events::{EventQueue, WorldEvent};
pub use registry::{ComponentStore, Registry};
pub use world::World;
