//! Runtime for the feedback workflow
//!
//! Executes the effects produced by the state machine: store mutations,
//! backend calls and notifications.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::FeedbackWorkflow;
