//! Chat message types.
//!
//! This module contains the type for representing one turn in a
//! conversation, matching the JSON shape produced by the web frontend
//! (camelCase field names, optional attachment reference).

use serde::{Deserialize, Serialize};

/// A single message in a chat session.
///
/// Each message has a sender, a text body, an optional reference to an
/// uploaded attachment, and a timestamp. Messages are immutable once
/// appended to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who produced the message ("user", "ai", ...).
    pub sender: String,
    /// The text content of the message.
    pub text: String,
    /// Original name of an attached file, if the message carried one.
    #[serde(rename = "fileName", skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Timestamp when the message was created (ISO 8601, UTC).
    ///
    /// Assigned by the session store at append time when absent;
    /// preserved verbatim when the caller supplies one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ChatMessage {
    /// Creates a text-only message with no timestamp.
    ///
    /// The store assigns the timestamp when the message is appended.
    pub fn new(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            text: text.into(),
            file_name: None,
            timestamp: None,
        }
    }

    /// Attaches an uploaded file reference to the message.
    pub fn with_file(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Sets an explicit timestamp on the message.
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_camel_case_file_name() {
        let message = ChatMessage::new("user", "see attached").with_file("report.pdf");
        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json["sender"], "user");
        assert_eq!(json["fileName"], "report.pdf");
        assert!(json.get("timestamp").is_none());
    }

    #[test]
    fn test_deserializes_without_optional_fields() {
        let message: ChatMessage =
            serde_json::from_str(r#"{"sender":"ai","text":"hello"}"#).unwrap();

        assert_eq!(message.sender, "ai");
        assert_eq!(message.text, "hello");
        assert!(message.file_name.is_none());
        assert!(message.timestamp.is_none());
    }
}
