//! Chat session controller and assistant endpoint client.
//!
//! [`ChatSession`] owns the transcript and the single-flight guard;
//! front-ends subscribe to its snapshots and only mutate it through
//! [`ChatSession::submit`].

pub mod controller;
pub mod endpoint;
pub mod quick_actions;
pub mod welcome;

/// Chat session controller and its published state.
pub use controller::{ChatSession, RejectReason, SessionSnapshot, SubmitOutcome};
/// Assistant endpoint abstraction and HTTP implementation.
pub use endpoint::{AssistantEndpoint, HttpEndpoint};
/// Fixed example prompts offered after the welcome sequence.
pub use quick_actions::QUICK_ACTIONS;
/// Welcome sequence timing.
pub use welcome::WelcomeSchedule;
