//! Session lifecycle state machine
//!
//! Pure transitions: given the current session state and an incoming
//! message, decide the next state and the effects the runtime must apply
//! inside one store scope. No I/O happens here.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use state::SessionState;
pub use transition::{transition, TransitionError};
