//! The client-side handler family. Each module owns the callbacks for
//! one message area; [`registry::HandlerRegistry`] wires them all into
//! the dispatcher. Callbacks are plain structs (one field per event
//! kind) optionally tied to an owner whose teardown silences them.

pub mod callback;
pub mod character;
pub mod combat;
pub mod effect;
pub mod login;
pub mod movement;
pub mod npc;
pub mod registry;
pub mod system;

pub use callback::Callback;
pub use registry::{ClientCallbacks, HandlerRegistry};
