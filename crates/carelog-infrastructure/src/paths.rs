//! Default path resolution for carelog data.
//!
//! Tests and embedders inject explicit roots through the store
//! constructors; these helpers only supply the platform defaults.

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Platform data directory could not be determined.
    DataDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::DataDirNotFound => write!(f, "Cannot find data directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Default on-disk layout for carelog.
///
/// # Directory Structure
///
/// ```text
/// ~/.local/share/carelog/      # Data directory (platform equivalent)
/// ├── sessions/                # One <user>.json store per user
/// │   └── <user>.json.backup   # Pre-migration snapshots
/// └── uploads/
///     └── users/<user>/        # Per-user attachment namespaces
/// ```
pub struct CarelogPaths;

impl CarelogPaths {
    /// Returns the carelog data directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: e.g. `~/.local/share/carelog/`
    /// - `Err(PathError::DataDirNotFound)`: directory could not be determined
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join("carelog"))
            .ok_or(PathError::DataDirNotFound)
    }

    /// Returns the default sessions root.
    pub fn sessions_dir() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("sessions"))
    }

    /// Returns the default uploads root.
    pub fn uploads_dir() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("uploads"))
    }
}
