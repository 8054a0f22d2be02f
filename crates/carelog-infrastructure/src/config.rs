//! Storage configuration.
//!
//! The session and attachment stores take their root directories as
//! explicit configuration rather than process-wide constants, so tests
//! can redirect everything into isolated temporary roots.

use crate::paths::CarelogPaths;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Root directories for the two persistent stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Directory holding one `<user>.json` store per user.
    pub sessions_root: PathBuf,
    /// Directory holding the per-user attachment namespaces.
    pub uploads_root: PathBuf,
}

/// On-disk TOML shape; both keys optional, defaults filled in from the
/// platform locations.
#[derive(Debug, Deserialize)]
struct StorageConfigFile {
    sessions_root: Option<PathBuf>,
    uploads_root: Option<PathBuf>,
}

impl StorageConfig {
    /// Creates a config with explicit roots.
    pub fn new(sessions_root: impl Into<PathBuf>, uploads_root: impl Into<PathBuf>) -> Self {
        Self {
            sessions_root: sessions_root.into(),
            uploads_root: uploads_root.into(),
        }
    }

    /// Returns the default platform-specific configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform data directory cannot be
    /// determined.
    pub fn default_location() -> Result<Self> {
        Ok(Self {
            sessions_root: CarelogPaths::sessions_dir()
                .context("Failed to resolve sessions directory")?,
            uploads_root: CarelogPaths::uploads_dir()
                .context("Failed to resolve uploads directory")?,
        })
    }

    /// Loads configuration from a TOML file.
    ///
    /// A missing file yields the defaults; keys absent from the file
    /// fall back to the platform locations.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or
    /// parsed, or if a fallback requires the platform data directory
    /// and it cannot be determined.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default_location();
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at {:?}", path))?;
        let parsed: StorageConfigFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML from {:?}", path))?;

        let sessions_root = match parsed.sessions_root {
            Some(root) => root,
            None => CarelogPaths::sessions_dir().context("Failed to resolve sessions directory")?,
        };
        let uploads_root = match parsed.uploads_root {
            Some(root) => root,
            None => CarelogPaths::uploads_dir().context("Failed to resolve uploads directory")?,
        };

        Ok(Self {
            sessions_root,
            uploads_root,
        })
    }
}
