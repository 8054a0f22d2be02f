//! Error types for the Carelog application.

use thiserror::Error;

/// A shared error type for the entire Carelog application.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait.
#[derive(Error, Debug)]
pub enum CarelogError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Identity could not be resolved from the request credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A persisted store file exists but is not valid structured data.
    ///
    /// This is deliberately distinct from "store absent" (which is an
    /// empty store, never an error): a corrupt file must surface instead
    /// of being silently treated as empty.
    #[error("Malformed store at {path}: {message}")]
    Malformed { path: String, message: String },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CarelogError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an Unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Creates a Malformed error
    pub fn malformed(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Migration error
    pub fn migration(message: impl Into<String>) -> Self {
        Self::Migration(message.into())
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a Malformed error
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}

impl From<std::io::Error> for CarelogError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for CarelogError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed {
            path: String::new(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, CarelogError>`.
pub type Result<T> = std::result::Result<T, CarelogError>;
