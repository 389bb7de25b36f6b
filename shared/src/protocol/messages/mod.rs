//! Typed payload bodies, one module per message-id area. Every struct
//! here is wire-visible: field order is part of the protocol.

pub mod character;
pub mod combat;
pub mod game;
pub mod login;
pub mod npc;
pub mod system;
