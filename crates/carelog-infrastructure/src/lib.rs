//! Carelog infrastructure: file-system backed stores.
//!
//! Implements the core contracts against the local filesystem: a JSON
//! document per user for sessions, a per-user directory for uploaded
//! attachments, plus the out-of-band legacy migrator and default path
//! resolution.

pub mod attachment_store;
pub mod config;
pub mod json_session_repository;
pub mod migration;
pub mod paths;
pub mod storage;

pub use attachment_store::AttachmentStore;
pub use config::StorageConfig;
pub use json_session_repository::JsonSessionRepository;
pub use migration::{LegacyMigrator, MigrationOutcome};
