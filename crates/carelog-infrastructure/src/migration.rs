//! One-shot migration from the flat-message-list schema to sessions.
//!
//! Early deployments persisted each user's history as a single flat
//! JSON array of messages. This migrator buckets that list into
//! sessions (first message and every 10th start a new one), deriving
//! titles from the opening message of each bucket. It runs out of band
//! with exclusive access to the affected stores, writes a `.backup`
//! snapshot of the original flat array before overwriting, and detects
//! already-migrated stores so it can be re-run without damage.
//!
//! Messages are carried over as raw JSON values rather than typed
//! structs, so fields the current schema doesn't know about survive the
//! migration untouched.

use crate::json_session_repository::now_utc;
use crate::storage::{AtomicJsonError, AtomicJsonFile};
use carelog_core::error::{CarelogError, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Number of messages per migrated session bucket.
///
/// Replaceable policy, not an invariant; the hard contract is only that
/// migrated stores are detected and skipped on re-run.
const SESSION_BUCKET_SIZE: usize = 10;

/// Maximum title length derived from a bucket's first message.
const TITLE_MAX_CHARS: usize = 30;

/// Result of migrating one user's store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// The user has no store file.
    NoStore,
    /// The store exists but holds no messages.
    Empty,
    /// The store is already in session shape; nothing was changed.
    AlreadyMigrated,
    /// The flat list was converted.
    Migrated { sessions: usize, messages: usize },
}

/// Offline migrator for pre-session stores.
pub struct LegacyMigrator {
    sessions_root: PathBuf,
}

impl LegacyMigrator {
    /// Creates a migrator over the given sessions root.
    pub fn new(sessions_root: impl AsRef<Path>) -> Self {
        Self {
            sessions_root: sessions_root.as_ref().to_path_buf(),
        }
    }

    /// Migrates a single user's store.
    ///
    /// # Errors
    ///
    /// Returns `Malformed` if the store is not a JSON array, or if its
    /// first element looks like a half-formed session (has an `id` but
    /// no `messages` array) — re-migrating such a store would destroy
    /// it, so the migrator refuses instead.
    pub fn migrate_user(&self, user_id: &str) -> Result<MigrationOutcome> {
        let store_path = self.sessions_root.join(format!("{}.json", user_id));
        if !store_path.exists() {
            return Ok(MigrationOutcome::NoStore);
        }

        // Hold the store's advisory lock across the whole
        // read-backup-overwrite sequence so a running service instance
        // cannot interleave a write.
        let file = AtomicJsonFile::<Vec<Value>>::new(store_path.clone());
        let _store_lock = file
            .lock()
            .map_err(|e| CarelogError::migration(e.to_string()))?;

        let raw = fs::read_to_string(&store_path)?;
        let document: Value = serde_json::from_str(&raw)
            .map_err(|e| CarelogError::malformed(store_path.display().to_string(), e.to_string()))?;

        let messages = match document {
            Value::Array(items) => items,
            _ => {
                return Err(CarelogError::malformed(
                    store_path.display().to_string(),
                    "store is not a JSON array",
                ))
            }
        };

        if messages.is_empty() {
            return Ok(MigrationOutcome::Empty);
        }

        match detect_shape(&messages[0]) {
            StoreShape::Session => return Ok(MigrationOutcome::AlreadyMigrated),
            StoreShape::HalfFormedSession => {
                return Err(CarelogError::malformed(
                    store_path.display().to_string(),
                    "first element has an 'id' but no 'messages' array; refusing to re-migrate",
                ))
            }
            StoreShape::FlatMessage => {}
        }

        let message_count = messages.len();
        let sessions = bucket_into_sessions(messages);
        let session_count = sessions.len();

        // Untouched snapshot of the flat array, written before the
        // overwrite so the original is always recoverable.
        let backup_path = store_path.with_file_name(format!("{}.json.backup", user_id));
        fs::write(&backup_path, &raw)?;

        file.save(&sessions).map_err(|e| match e {
            AtomicJsonError::IoError(err) => CarelogError::from(err),
            other => CarelogError::migration(other.to_string()),
        })?;

        tracing::info!(
            user = user_id,
            messages = message_count,
            sessions = session_count,
            backup = %backup_path.display(),
            "migrated flat history to sessions"
        );

        Ok(MigrationOutcome::Migrated {
            sessions: session_count,
            messages: message_count,
        })
    }

    /// Migrates every user store under the sessions root.
    ///
    /// Backup files are skipped. Returns one `(user, outcome)` pair per
    /// store; a malformed store aborts the whole run.
    pub fn migrate_all(&self) -> Result<Vec<(String, MigrationOutcome)>> {
        let mut results = Vec::new();

        if !self.sessions_root.exists() {
            return Ok(results);
        }

        let mut stores: Vec<(String, PathBuf)> = Vec::new();
        for entry in fs::read_dir(&self.sessions_root)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                stores.push((stem.to_string(), path));
            }
        }
        stores.sort();

        for (user_id, _path) in stores {
            let outcome = self.migrate_user(&user_id)?;
            results.push((user_id, outcome));
        }

        Ok(results)
    }
}

enum StoreShape {
    /// Element is a session object (`id` and `messages` present).
    Session,
    /// Element has an `id` but no `messages` array.
    HalfFormedSession,
    /// Element is a plain flat-schema message.
    FlatMessage,
}

fn detect_shape(first: &Value) -> StoreShape {
    match first.as_object() {
        Some(object) if object.contains_key("id") => {
            if object.get("messages").map(Value::is_array).unwrap_or(false) {
                StoreShape::Session
            } else {
                StoreShape::HalfFormedSession
            }
        }
        _ => StoreShape::FlatMessage,
    }
}

/// Buckets a flat message list into session objects.
///
/// The first message and every [`SESSION_BUCKET_SIZE`]th message start
/// a new session titled after that message's text.
fn bucket_into_sessions(messages: Vec<Value>) -> Vec<Value> {
    let mut sessions: Vec<Value> = Vec::new();
    let mut session_counter = 0usize;

    for (i, message) in messages.into_iter().enumerate() {
        if i % SESSION_BUCKET_SIZE == 0 {
            session_counter += 1;

            let text = message
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let title = derive_title(text, session_counter);
            let created_at = message
                .get("timestamp")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(now_utc);

            sessions.push(serde_json::json!({
                "id": format!("migrated_session_{}", session_counter),
                "title": title,
                "created_at": created_at,
                "messages": [],
            }));
        }

        if let Some(session) = sessions.last_mut() {
            if let Some(Value::Array(bucket)) = session.get_mut("messages") {
                bucket.push(message);
            }
        }
    }

    sessions
}

/// Derives a session title from a bucket's first message text.
///
/// Truncated to [`TITLE_MAX_CHARS`] characters with an ellipsis marker;
/// empty text falls back to `"Chat N"`.
fn derive_title(text: &str, session_number: usize) -> String {
    if text.is_empty() {
        return format!("Chat {}", session_number);
    }

    let truncated: String = text.chars().take(TITLE_MAX_CHARS).collect();
    if text.chars().count() > TITLE_MAX_CHARS {
        format!("{}...", truncated)
    } else {
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_store(root: &Path, user: &str, document: &Value) {
        fs::create_dir_all(root).unwrap();
        fs::write(
            root.join(format!("{}.json", user)),
            serde_json::to_string_pretty(document).unwrap(),
        )
        .unwrap();
    }

    fn flat_messages(count: usize) -> Value {
        let messages: Vec<Value> = (0..count)
            .map(|i| {
                json!({
                    "sender": if i % 2 == 0 { "user" } else { "ai" },
                    "text": format!("message number {}", i),
                    "timestamp": format!("2024-01-01T00:00:{:02}Z", i % 60),
                })
            })
            .collect();
        Value::Array(messages)
    }

    #[test]
    fn test_no_store_is_a_noop() {
        let temp_dir = TempDir::new().unwrap();
        let migrator = LegacyMigrator::new(temp_dir.path());

        assert_eq!(
            migrator.migrate_user("ghost").unwrap(),
            MigrationOutcome::NoStore
        );
    }

    #[test]
    fn test_empty_store_is_a_noop() {
        let temp_dir = TempDir::new().unwrap();
        write_store(temp_dir.path(), "alice", &json!([]));

        let migrator = LegacyMigrator::new(temp_dir.path());
        assert_eq!(
            migrator.migrate_user("alice").unwrap(),
            MigrationOutcome::Empty
        );
    }

    #[test]
    fn test_23_messages_become_3_sessions_with_backup() {
        let temp_dir = TempDir::new().unwrap();
        write_store(temp_dir.path(), "alice", &flat_messages(23));

        let migrator = LegacyMigrator::new(temp_dir.path());
        let outcome = migrator.migrate_user("alice").unwrap();
        assert_eq!(
            outcome,
            MigrationOutcome::Migrated {
                sessions: 3,
                messages: 23
            }
        );

        let migrated: Vec<Value> = serde_json::from_str(
            &fs::read_to_string(temp_dir.path().join("alice.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(migrated.len(), 3);

        let counts: Vec<usize> = migrated
            .iter()
            .map(|s| s["messages"].as_array().unwrap().len())
            .collect();
        assert_eq!(counts, vec![10, 10, 3]);

        // Titles derived from messages 0, 10 and 20
        assert_eq!(migrated[0]["title"], "message number 0");
        assert_eq!(migrated[1]["title"], "message number 10");
        assert_eq!(migrated[2]["title"], "message number 20");
        assert_eq!(migrated[0]["id"], "migrated_session_1");
        assert_eq!(migrated[2]["id"], "migrated_session_3");

        // created_at comes from the bucket's first message
        assert_eq!(migrated[0]["created_at"], "2024-01-01T00:00:00Z");

        // Backup holds the original flat array untouched
        let backup: Vec<Value> = serde_json::from_str(
            &fs::read_to_string(temp_dir.path().join("alice.json.backup")).unwrap(),
        )
        .unwrap();
        assert_eq!(backup.len(), 23);
        assert_eq!(backup[0]["text"], "message number 0");
    }

    #[test]
    fn test_migration_releases_store_file_lock() {
        let temp_dir = TempDir::new().unwrap();
        write_store(temp_dir.path(), "alice", &flat_messages(3));

        let migrator = LegacyMigrator::new(temp_dir.path());
        migrator.migrate_user("alice").unwrap();

        assert!(!temp_dir.path().join("alice.lock").exists());
    }

    #[test]
    fn test_long_titles_are_truncated_with_ellipsis() {
        let temp_dir = TempDir::new().unwrap();
        let long_text = "this opening message is well over thirty characters long";
        write_store(
            temp_dir.path(),
            "alice",
            &json!([{ "sender": "user", "text": long_text }]),
        );

        let migrator = LegacyMigrator::new(temp_dir.path());
        migrator.migrate_user("alice").unwrap();

        let migrated: Vec<Value> = serde_json::from_str(
            &fs::read_to_string(temp_dir.path().join("alice.json")).unwrap(),
        )
        .unwrap();
        let title = migrated[0]["title"].as_str().unwrap();
        assert_eq!(title, "this opening message is well o...");
    }

    #[test]
    fn test_empty_text_falls_back_to_chat_n() {
        let temp_dir = TempDir::new().unwrap();
        write_store(
            temp_dir.path(),
            "alice",
            &json!([{ "sender": "user", "text": "" }]),
        );

        let migrator = LegacyMigrator::new(temp_dir.path());
        migrator.migrate_user("alice").unwrap();

        let migrated: Vec<Value> = serde_json::from_str(
            &fs::read_to_string(temp_dir.path().join("alice.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(migrated[0]["title"], "Chat 1");
    }

    #[test]
    fn test_already_migrated_store_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let sessions = json!([{
            "id": "migrated_session_1",
            "title": "Chat 1",
            "created_at": "2024-01-01T00:00:00Z",
            "messages": [{ "sender": "user", "text": "hi" }],
        }]);
        write_store(temp_dir.path(), "alice", &sessions);

        let migrator = LegacyMigrator::new(temp_dir.path());
        assert_eq!(
            migrator.migrate_user("alice").unwrap(),
            MigrationOutcome::AlreadyMigrated
        );

        // Untouched: no backup written, store identical
        assert!(!temp_dir.path().join("alice.json.backup").exists());
        let after: Value = serde_json::from_str(
            &fs::read_to_string(temp_dir.path().join("alice.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(after, sessions);
    }

    #[test]
    fn test_half_formed_session_refuses_migration() {
        let temp_dir = TempDir::new().unwrap();
        write_store(
            temp_dir.path(),
            "alice",
            &json!([{ "id": "s1", "title": "broken" }]),
        );

        let migrator = LegacyMigrator::new(temp_dir.path());
        let err = migrator.migrate_user("alice").unwrap_err();
        assert!(err.is_malformed());
        assert!(!temp_dir.path().join("alice.json.backup").exists());
    }

    #[test]
    fn test_messages_survive_with_unknown_fields() {
        let temp_dir = TempDir::new().unwrap();
        write_store(
            temp_dir.path(),
            "alice",
            &json!([{ "sender": "user", "text": "hi", "mood": "curious" }]),
        );

        let migrator = LegacyMigrator::new(temp_dir.path());
        migrator.migrate_user("alice").unwrap();

        let migrated: Vec<Value> = serde_json::from_str(
            &fs::read_to_string(temp_dir.path().join("alice.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(migrated[0]["messages"][0]["mood"], "curious");
    }

    #[test]
    fn test_migrate_all_skips_backups() {
        let temp_dir = TempDir::new().unwrap();
        write_store(temp_dir.path(), "alice", &flat_messages(5));
        write_store(temp_dir.path(), "bob", &flat_messages(12));
        fs::write(temp_dir.path().join("old.json.backup"), "[]").unwrap();

        let migrator = LegacyMigrator::new(temp_dir.path());
        let results = migrator.migrate_all().unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(
            results[0],
            (
                "alice".to_string(),
                MigrationOutcome::Migrated {
                    sessions: 1,
                    messages: 5
                }
            )
        );
        assert_eq!(
            results[1],
            (
                "bob".to_string(),
                MigrationOutcome::Migrated {
                    sessions: 2,
                    messages: 12
                }
            )
        );
    }
}
