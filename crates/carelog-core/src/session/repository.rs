//! Session repository trait.
//!
//! Defines the interface for per-user session persistence operations.

use super::message::ChatMessage;
use super::model::{ChatSession, SessionSummary};
use crate::error::Result;
use async_trait::async_trait;

/// An abstract repository for managing per-user session persistence.
///
/// This trait defines the contract for persisting and retrieving chat
/// sessions, decoupling the application's core logic from the specific
/// storage mechanism (e.g., JSON files, database, remote API).
///
/// The user identifier is an opaque partition key supplied by the
/// identity resolver; the repository never interprets it.
///
/// # Implementation Notes
///
/// Implementations must guarantee:
/// - Absence of any stored data for a user is an empty store, never an
///   error
/// - Mutations for the same user are serialized (no lost updates under
///   concurrent appends)
/// - Mutations for distinct users do not contend beyond I/O
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Lists summaries of all sessions belonging to a user, in
    /// creation order.
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<SessionSummary>)`: summaries, empty if the user has no store
    /// - `Err(_)`: the store exists but could not be read or parsed
    async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionSummary>>;

    /// Returns a full session, message history included.
    ///
    /// # Errors
    ///
    /// Returns `CarelogError::NotFound` if the user has no session with
    /// the given id.
    async fn get_session(&self, user_id: &str, session_id: &str) -> Result<ChatSession>;

    /// Creates a new empty session at the end of the user's store.
    ///
    /// # Arguments
    ///
    /// * `user_id` - The owning user
    /// * `title` - Session title; `None` falls back to `"New Chat"`
    ///
    /// # Returns
    ///
    /// The newly created session, with a generated id unique within the
    /// user's store and `created_at` set to the current UTC time.
    async fn create_session(&self, user_id: &str, title: Option<String>) -> Result<ChatSession>;

    /// Appends a message at the end of a session's history.
    ///
    /// If the message carries no timestamp, the current UTC time is
    /// assigned; a caller-supplied timestamp is preserved verbatim.
    ///
    /// # Errors
    ///
    /// Returns `CarelogError::NotFound` if the user has no session with
    /// the given id.
    async fn append_message(
        &self,
        user_id: &str,
        session_id: &str,
        message: ChatMessage,
    ) -> Result<()>;

    /// Returns the user's full history as a single flat message list.
    ///
    /// Sessions are concatenated in store order, each session's internal
    /// message order preserved. Purely derived from the session data;
    /// empty if the user has no store.
    async fn flat_history(&self, user_id: &str) -> Result<Vec<ChatMessage>>;

    /// Appends a message using the pre-session flat-list semantics.
    ///
    /// If the user has no sessions, one titled `"Legacy Chat"` is
    /// synthesized first. The message always lands in the *last* session
    /// of the store. Timestamp handling is identical to
    /// [`append_message`](Self::append_message).
    async fn append_flat_message(&self, user_id: &str, message: ChatMessage) -> Result<()>;
}
