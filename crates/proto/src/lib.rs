//! Shared protocol types for the chat session controller and its front-ends.
//!
//! This crate defines the transcript data model, the tagged assistant reply,
//! the `/chat` wire types and strongly-typed error enums shared across the
//! workspace.

pub mod error;
pub mod message;
pub mod reply;

/// Re-export of all protocol error types.
pub use error::*;
/// Re-export of transcript identity and message types.
pub use message::{Author, Message, MessageId, MessageTone, SessionId};
/// Re-export of endpoint reply and wire types.
pub use reply::{AssistantReply, ChatRequest};
