//! Form conversation state machine
//!
//! Pure state transitions in the Elm style: the driver never performs I/O,
//! it returns the next session and a list of effects for the runtime.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::{Effect, InlineButton, Keyboard};
pub use event::{ButtonAction, ChatId, Event, MessageId};
pub use state::{FormField, FormState, Session};
pub use transition::transition;
