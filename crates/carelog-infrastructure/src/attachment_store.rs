//! Per-user attachment storage.
//!
//! Uploaded files land under `<uploads-root>/users/<user>/` with
//! collision-free generated names, and callers get back a path relative
//! to the uploads root that is safe to embed in persisted messages.
//! Deletion and cleanup are advisory: failures are swallowed, never
//! raised.

use carelog_core::error::Result;
use carelog_core::identity::validate_user_id;
use chrono::Utc;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Subdirectory of the uploads root holding the per-user namespaces.
const USERS_DIR: &str = "users";

/// Extension used when the original filename has none.
const DEFAULT_EXTENSION: &str = "file";

/// File store for user-uploaded attachments.
pub struct AttachmentStore {
    uploads_root: PathBuf,
}

impl AttachmentStore {
    /// Creates a store rooted at the given uploads directory.
    pub fn new(uploads_root: impl AsRef<Path>) -> Self {
        Self {
            uploads_root: uploads_root.as_ref().to_path_buf(),
        }
    }

    /// Returns the uploads root this store writes under.
    pub fn uploads_root(&self) -> &Path {
        &self.uploads_root
    }

    /// Resolves the user's namespace directory.
    ///
    /// User ids come from the identity resolver, but one must never be
    /// able to escape the uploads root.
    fn user_dir(&self, user_id: &str) -> Result<PathBuf> {
        validate_user_id(user_id)?;
        Ok(self.uploads_root.join(USERS_DIR).join(user_id))
    }

    /// Idempotently creates the user's upload directory and returns it.
    ///
    /// # Errors
    ///
    /// Returns an error if the user id is invalid or the directory
    /// cannot be created.
    pub async fn ensure_user_dir(&self, user_id: &str) -> Result<PathBuf> {
        let dir = self.user_dir(user_id)?;
        fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    /// Saves uploaded bytes under the user's namespace.
    ///
    /// The stored name is generated (timestamp plus random id) so
    /// repeated uploads of files with identical original names never
    /// collide.
    ///
    /// # Returns
    ///
    /// The stored file's path relative to the uploads root
    /// (`users/<user>/<generated-name>`), suitable for embedding in a
    /// persisted message.
    pub async fn save(&self, user_id: &str, original_filename: &str, bytes: &[u8]) -> Result<String> {
        let dir = self.ensure_user_dir(user_id).await?;
        let filename = generate_unique_filename(original_filename);

        fs::write(dir.join(&filename), bytes).await?;

        Ok(format!("{}/{}/{}", USERS_DIR, user_id, filename))
    }

    /// Maps a stored relative path to the URL it is served under.
    ///
    /// Pure string transform; never touches the filesystem.
    pub fn file_url(relative_path: Option<&str>) -> Option<String> {
        match relative_path {
            Some(path) if !path.is_empty() => Some(format!("/{}", path)),
            _ => None,
        }
    }

    /// Best-effort removal of a stored attachment.
    ///
    /// Returns `false` when the path does not exist or the remove
    /// fails; deletion is advisory cleanup, not a consistency
    /// guarantee.
    pub async fn delete(&self, relative_path: &str) -> bool {
        if relative_path.is_empty() || !is_safe_relative(relative_path) {
            return false;
        }
        let path = self.uploads_root.join(relative_path);
        match fs::remove_file(&path).await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "attachment delete skipped");
                false
            }
        }
    }

    /// Removes every file in the user's namespace whose relative path
    /// is not in `keep`.
    ///
    /// # Returns
    ///
    /// The number of files removed; `0` when the namespace does not
    /// exist. Individual remove failures are logged and skipped.
    pub async fn cleanup(&self, user_id: &str, keep: &HashSet<String>) -> usize {
        let dir = match self.user_dir(user_id) {
            Ok(dir) => dir,
            Err(e) => {
                tracing::warn!(user = user_id, error = %e, "cleanup refused");
                return 0;
            }
        };
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(_) => return 0,
        };

        let mut deleted = 0;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }

            let relative = format!(
                "{}/{}/{}",
                USERS_DIR,
                user_id,
                entry.file_name().to_string_lossy()
            );
            if keep.contains(&relative) {
                continue;
            }

            match fs::remove_file(entry.path()).await {
                Ok(()) => deleted += 1,
                Err(e) => {
                    tracing::warn!(path = %entry.path().display(), error = %e, "cleanup skipped file");
                }
            }
        }

        if deleted > 0 {
            tracing::info!(user = user_id, deleted, "cleaned up attachments");
        }
        deleted
    }
}

/// A stored relative path must stay strictly under the uploads root:
/// no absolute paths, no `..` or other non-normal components.
fn is_safe_relative(path: &str) -> bool {
    let path = Path::new(path);
    !path.is_absolute() && path.components().all(|c| matches!(c, Component::Normal(_)))
}

/// Generates a collision-free stored filename.
///
/// Format: `<UTC %Y%m%d_%H%M%S>_<8 hex chars><original extension>`,
/// with the extension defaulted to `.file` when the original name has
/// none.
fn generate_unique_filename(original_filename: &str) -> String {
    let extension = Path::new(original_filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .unwrap_or(DEFAULT_EXTENSION);

    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let unique_id = uuid::Uuid::new_v4().simple().to_string();

    format!("{}_{}.{}", timestamp, &unique_id[..8], extension)
}
