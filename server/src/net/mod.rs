//! Socket plumbing for the server. I/O threads only move bytes between
//! sockets and per-session queues; every packet is examined and every
//! reply produced on the logic thread.

pub mod listener;
pub mod session;

pub use listener::{SessionEvent, SessionServer};
pub use session::{Session, SessionId, SessionShared};
