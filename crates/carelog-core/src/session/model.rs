//! Session domain model.
//!
//! This module contains the core ChatSession entity that represents
//! a titled, ordered container of messages belonging to one user.

use super::message::ChatMessage;
use serde::{Deserialize, Serialize};

/// Default title used when a session is created without one.
pub const DEFAULT_SESSION_TITLE: &str = "New Chat";

/// Title of the session synthesized by the legacy compatibility layer
/// when an old client appends to a user that has no sessions yet.
pub const LEGACY_SESSION_TITLE: &str = "Legacy Chat";

/// A chat session in a user's conversation archive.
///
/// A session contains:
/// - A unique identifier (unique within one user's store)
/// - A human-readable title
/// - The creation timestamp
/// - The ordered message history
///
/// Sessions are append-only: messages are added at the end and never
/// reordered or removed by the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    /// Unique session identifier (unique within the owning user's store).
    pub id: String,
    /// Human-readable session title.
    pub title: String,
    /// Timestamp when the session was created (ISO 8601, UTC).
    pub created_at: String,
    /// Ordered message history.
    pub messages: Vec<ChatMessage>,
}

impl ChatSession {
    /// Creates a new empty session.
    ///
    /// # Arguments
    ///
    /// * `id` - Unique identifier within the owning user's store
    /// * `title` - Session title; `None` falls back to [`DEFAULT_SESSION_TITLE`]
    /// * `created_at` - Creation timestamp (ISO 8601, UTC)
    pub fn new(id: impl Into<String>, title: Option<String>, created_at: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.unwrap_or_else(|| DEFAULT_SESSION_TITLE.to_string()),
            created_at: created_at.into(),
            messages: Vec::new(),
        }
    }

    /// Returns the summary projection of this session.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            created_at: self.created_at.clone(),
        }
    }
}

/// A lightweight projection of a session used for listings.
///
/// Never carries message bodies, so listing a user's sessions stays
/// cheap regardless of history size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session identifier.
    pub id: String,
    /// Session title.
    pub title: String,
    /// Creation timestamp (ISO 8601, UTC).
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_defaults_title() {
        let session = ChatSession::new("s1", None, "2025-01-01T00:00:00Z");
        assert_eq!(session.title, DEFAULT_SESSION_TITLE);
        assert!(session.messages.is_empty());
    }

    #[test]
    fn test_summary_omits_messages() {
        let mut session = ChatSession::new("s1", Some("Checkup".to_string()), "2025-01-01T00:00:00Z");
        session.messages.push(ChatMessage::new("user", "hi"));

        let summary = session.summary();
        assert_eq!(summary.id, "s1");
        assert_eq!(summary.title, "Checkup");
        assert_eq!(summary.created_at, "2025-01-01T00:00:00Z");

        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("messages").is_none());
    }
}
