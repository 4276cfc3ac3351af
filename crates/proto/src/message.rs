use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a chat session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Creates a new random session identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the raw session identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Per-session message identifier, strictly increasing in append order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u64);

impl MessageId {
    /// Returns the identifier that follows this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Who wrote a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    /// Text typed (or picked from a quick action) by the end user.
    User,
    /// Reply, prompt or failure notice attributed to the assistant.
    Assistant,
}

impl std::fmt::Display for Author {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Author::User => write!(f, "user"),
            Author::Assistant => write!(f, "assistant"),
        }
    }
}

impl std::str::FromStr for Author {
    type Err = crate::error::ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Author::User),
            "assistant" => Ok(Author::Assistant),
            other => Err(crate::error::ProtoError::InvalidAuthor(other.to_string())),
        }
    }
}

/// Visual emphasis a renderer should give a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageTone {
    /// Plain conversation text.
    #[default]
    Normal,
    /// Informational notice, e.g. the sign-in prompt.
    Info,
    /// Error reported by the assistant endpoint.
    Error,
    /// Transport-level failure talking to the endpoint.
    Warning,
}

/// A single transcript entry. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Position-ordered identifier within the session.
    pub id: MessageId,
    /// Author of this entry.
    pub author: Author,
    /// Display text.
    pub text: String,
    /// Rendering emphasis.
    pub tone: MessageTone,
    /// Append timestamp in UTC.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Creates a user-authored message.
    pub fn user(id: MessageId, text: impl Into<String>) -> Self {
        Self {
            id,
            author: Author::User,
            text: text.into(),
            tone: MessageTone::Normal,
            created_at: Utc::now(),
        }
    }

    /// Creates an assistant-authored message with the given tone.
    pub fn assistant(id: MessageId, text: impl Into<String>, tone: MessageTone) -> Self {
        Self {
            id,
            author: Author::Assistant,
            text: text.into(),
            tone,
            created_at: Utc::now(),
        }
    }

    /// Returns `true` for assistant-authored entries.
    pub fn is_assistant(&self) -> bool {
        self.author == Author::Assistant
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::ProtoError;

    #[test]
    fn session_id_new_creates_non_empty_value() {
        let session = SessionId::new();
        assert!(!session.as_str().is_empty());
        assert_ne!(session, SessionId::new());
    }

    #[test]
    fn message_id_next_is_strictly_greater() {
        let first = MessageId(1);
        assert_eq!(first.next(), MessageId(2));
        assert!(first.next() > first);
        assert_eq!(first.to_string(), "#1");
    }

    #[test]
    fn author_display_and_parse_agree() {
        for author in [Author::User, Author::Assistant] {
            let parsed = Author::from_str(&author.to_string()).expect("author should parse");
            assert_eq!(parsed, author);
        }
    }

    #[test]
    fn author_parse_invalid_value_returns_error() {
        let err = Author::from_str("system").expect_err("invalid author should fail");
        match err {
            ProtoError::InvalidAuthor(value) => assert_eq!(value, "system"),
            other => panic!("unexpected error variant: {other}"),
        }
    }

    #[test]
    fn user_message_has_normal_tone() {
        let msg = Message::user(MessageId(3), "hello");
        assert_eq!(msg.id, MessageId(3));
        assert_eq!(msg.author, Author::User);
        assert_eq!(msg.text, "hello");
        assert_eq!(msg.tone, MessageTone::Normal);
        assert!(!msg.is_assistant());
    }

    #[test]
    fn assistant_message_keeps_tone() {
        let msg = Message::assistant(MessageId(4), "boom", MessageTone::Warning);
        assert!(msg.is_assistant());
        assert_eq!(msg.tone, MessageTone::Warning);
    }

    #[test]
    fn message_serializes_lowercase_author_and_tone() {
        let msg = Message::assistant(MessageId(7), "hi", MessageTone::Info);
        let json = serde_json::to_value(&msg).expect("serialize message");
        assert_eq!(json["author"], "assistant");
        assert_eq!(json["tone"], "info");
        assert_eq!(json["id"], 7);
    }
}
