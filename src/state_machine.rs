//! Feedback workflow state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions:
//! `transition(state, store, event)` returns the next state plus the effects
//! the runtime must carry out.

pub mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;


pub use effect::{Effect, Notification, NotificationLevel, RemoteCall};
pub use event::{Event, Verdict};
pub use state::{FeedbackState, Proposal, Target};
pub use transition::{transition, TransitionError};
