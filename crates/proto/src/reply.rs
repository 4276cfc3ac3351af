use serde::{Deserialize, Serialize};

use crate::message::MessageTone;

/// Transcript text shown when the endpoint requires sign-in.
pub const LOGIN_PROMPT: &str =
    "🔐 Please login with Google Calendar to manage events. You can still ask general questions!";
/// Prefix marking an endpoint-reported error.
pub const ERROR_MARKER: &str = "❌ ";
/// Fallback used when the endpoint reports an error with no text.
pub const GENERIC_ERROR: &str = "An error occurred";
/// Prefix marking a transport failure.
pub const WARNING_MARKER: &str = "⚠️ Network error: ";

/// Request body accepted by the assistant endpoint (`POST /chat`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// User text, already trimmed.
    pub message: String,
}

impl ChatRequest {
    /// Creates a request carrying `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Outcome of one call to the assistant endpoint.
///
/// Every way a call can end maps onto exactly one variant, so a submission
/// always yields exactly one assistant transcript entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantReply {
    /// Endpoint answered with reply text.
    Success(String),
    /// Endpoint answered 401; calendar actions need sign-in.
    AuthRequired,
    /// Endpoint answered with an explicit `error` field.
    ApplicationError(String),
    /// The call itself failed: connect error, timeout, unreadable body.
    TransportError(String),
}

impl AssistantReply {
    /// Returns `true` only for [`AssistantReply::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, AssistantReply::Success(_))
    }

    /// Text appended to the transcript for this outcome.
    pub fn transcript_text(&self) -> String {
        match self {
            AssistantReply::Success(reply) => reply.clone(),
            AssistantReply::AuthRequired => LOGIN_PROMPT.to_string(),
            AssistantReply::ApplicationError(message) => {
                if message.trim().is_empty() {
                    format!("{ERROR_MARKER}{GENERIC_ERROR}")
                } else {
                    format!("{ERROR_MARKER}{message}")
                }
            }
            AssistantReply::TransportError(message) => format!("{WARNING_MARKER}{message}"),
        }
    }

    /// Rendering emphasis for this outcome.
    pub fn tone(&self) -> MessageTone {
        match self {
            AssistantReply::Success(_) => MessageTone::Normal,
            AssistantReply::AuthRequired => MessageTone::Info,
            AssistantReply::ApplicationError(_) => MessageTone::Error,
            AssistantReply::TransportError(_) => MessageTone::Warning,
        }
    }
}

impl std::fmt::Display for AssistantReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.transcript_text())
    }
}
