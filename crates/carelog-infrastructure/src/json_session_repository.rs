//! JSON file backed SessionRepository implementation.
//!
//! Each user's entire session archive lives in one JSON document at
//! `<sessions-root>/<user>.json` holding an array of sessions. Every
//! mutation is a whole-document read-modify-write; to make that safe
//! under concurrent requests for the same user, mutations are
//! serialized through a per-user async mutex, hold the store's
//! advisory file lock against the out-of-band tools, and are written
//! via [`AtomicJsonFile`] (tmp file + rename). Reads skip both locks:
//! the atomic rename guarantees they never observe a torn document.

use crate::storage::{AtomicJsonError, AtomicJsonFile};
use carelog_core::error::{CarelogError, Result};
use carelog_core::session::{
    ChatMessage, ChatSession, SessionRepository, SessionSummary, LEGACY_SESSION_TITLE,
};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Returns the current UTC time as an ISO 8601 string.
pub(crate) fn now_utc() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// File-backed session repository with per-user write serialization.
pub struct JsonSessionRepository {
    sessions_root: PathBuf,
    /// One mutex per user id; mutating operations hold it across their
    /// full read-modify-write cycle. Distinct users never contend.
    user_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl JsonSessionRepository {
    /// Creates a new `JsonSessionRepository` rooted at the given directory.
    ///
    /// The directory is created if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(sessions_root: impl AsRef<Path>) -> Result<Self> {
        let sessions_root = sessions_root.as_ref().to_path_buf();
        fs::create_dir_all(&sessions_root)?;

        Ok(Self {
            sessions_root,
            user_locks: Mutex::new(HashMap::new()),
        })
    }

    /// Returns the store file path for a given user.
    ///
    /// User ids come from the identity resolver, but one must never be
    /// able to escape the sessions root.
    fn store_path(&self, user_id: &str) -> Result<PathBuf> {
        carelog_core::identity::validate_user_id(user_id)?;
        Ok(self.sessions_root.join(format!("{}.json", user_id)))
    }

    fn store_file(&self, user_id: &str) -> Result<AtomicJsonFile<Vec<ChatSession>>> {
        Ok(AtomicJsonFile::new(self.store_path(user_id)?))
    }

    /// Loads the user's full store; an absent file is an empty store.
    fn load_store(&self, user_id: &str) -> Result<Vec<ChatSession>> {
        let file = self.store_file(user_id)?;
        match file.load() {
            Ok(sessions) => Ok(sessions.unwrap_or_default()),
            Err(e) => Err(map_storage_error(e, file.path())),
        }
    }

    /// Returns the mutex guarding the given user's store.
    async fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.user_locks.lock().await;
        locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Stamps the message with the current UTC time unless the caller
    /// supplied one.
    fn stamp(mut message: ChatMessage) -> ChatMessage {
        if message.timestamp.is_none() {
            message.timestamp = Some(now_utc());
        }
        message
    }
}

fn map_storage_error(e: AtomicJsonError, path: &Path) -> CarelogError {
    match e {
        AtomicJsonError::JsonError(err) => {
            CarelogError::malformed(path.display().to_string(), err.to_string())
        }
        AtomicJsonError::IoError(err) => CarelogError::from(err),
        AtomicJsonError::LockError(msg) => CarelogError::io(msg),
    }
}

#[async_trait]
impl SessionRepository for JsonSessionRepository {
    async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionSummary>> {
        let sessions = self.load_store(user_id)?;
        Ok(sessions.iter().map(|s| s.summary()).collect())
    }

    async fn get_session(&self, user_id: &str, session_id: &str) -> Result<ChatSession> {
        let sessions = self.load_store(user_id)?;
        sessions
            .into_iter()
            .find(|s| s.id == session_id)
            .ok_or_else(|| CarelogError::not_found("session", session_id))
    }

    async fn create_session(&self, user_id: &str, title: Option<String>) -> Result<ChatSession> {
        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;
        let file = self.store_file(user_id)?;
        let _store_lock = file.lock().map_err(|e| map_storage_error(e, file.path()))?;

        let mut sessions = self.load_store(user_id)?;
        let session = ChatSession::new(uuid::Uuid::new_v4().to_string(), title, now_utc());
        sessions.push(session.clone());
        file.save(&sessions)
            .map_err(|e| map_storage_error(e, file.path()))?;

        tracing::debug!(user = user_id, session = %session.id, "created session");
        Ok(session)
    }

    async fn append_message(
        &self,
        user_id: &str,
        session_id: &str,
        message: ChatMessage,
    ) -> Result<()> {
        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;
        let file = self.store_file(user_id)?;
        let _store_lock = file.lock().map_err(|e| map_storage_error(e, file.path()))?;

        let mut sessions = self.load_store(user_id)?;
        let session = sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or_else(|| CarelogError::not_found("session", session_id))?;

        session.messages.push(Self::stamp(message));
        file.save(&sessions)
            .map_err(|e| map_storage_error(e, file.path()))?;
        Ok(())
    }

    async fn flat_history(&self, user_id: &str) -> Result<Vec<ChatMessage>> {
        let sessions = self.load_store(user_id)?;
        Ok(sessions
            .into_iter()
            .flat_map(|s| s.messages.into_iter())
            .collect())
    }

    async fn append_flat_message(&self, user_id: &str, message: ChatMessage) -> Result<()> {
        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;
        let file = self.store_file(user_id)?;
        let _store_lock = file.lock().map_err(|e| map_storage_error(e, file.path()))?;

        let mut sessions = self.load_store(user_id)?;
        if sessions.is_empty() {
            sessions.push(ChatSession::new(
                uuid::Uuid::new_v4().to_string(),
                Some(LEGACY_SESSION_TITLE.to_string()),
                now_utc(),
            ));
            tracing::debug!(user = user_id, "synthesized legacy session");
        }

        // Old clients have no session concept; their messages always go
        // to the last session in the store.
        let last = sessions
            .last_mut()
            .ok_or_else(|| CarelogError::Internal("store empty after synthesis".to_string()))?;
        last.messages.push(Self::stamp(message));

        file.save(&sessions)
            .map_err(|e| map_storage_error(e, file.path()))?;
        Ok(())
    }
}
