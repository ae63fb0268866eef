//! Session layer: shared state, background generation, and commands.

pub mod commands;
pub mod events;
pub mod helpers;
pub mod proxy;
pub mod state;
pub mod tasks;
pub mod view_model;

pub use events::UserEvent;
pub use proxy::EventProxy;
pub use state::{GenerationKind, Session, SessionState};
