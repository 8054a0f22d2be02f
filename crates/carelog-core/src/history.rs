//! Legacy flat-history compatibility layer.
//!
//! Older clients predate the session schema and speak a single flat
//! message list per user. This façade re-exposes those semantics on top
//! of the session repository: reads concatenate every session's
//! messages, writes land in the last session (synthesizing one when the
//! user has none). It holds no storage of its own.

use crate::error::Result;
use crate::session::{ChatMessage, SessionRepository};
use std::sync::Arc;

/// Flat-list view over the session schema for pre-session clients.
#[derive(Clone)]
pub struct LegacyHistory {
    repository: Arc<dyn SessionRepository>,
}

impl LegacyHistory {
    /// Creates a façade over the given session repository.
    pub fn new(repository: Arc<dyn SessionRepository>) -> Self {
        Self { repository }
    }

    /// Returns the user's complete history as one flat, ordered list.
    ///
    /// Empty when the user has no sessions.
    pub async fn history(&self, user_id: &str) -> Result<Vec<ChatMessage>> {
        self.repository.flat_history(user_id).await
    }

    /// Appends a message in flat-list style.
    ///
    /// The message lands in the user's last session; a `"Legacy Chat"`
    /// session is created first when the user has none.
    pub async fn append(&self, user_id: &str, message: ChatMessage) -> Result<()> {
        self.repository.append_flat_message(user_id, message).await
    }
}
