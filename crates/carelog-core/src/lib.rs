//! Carelog core domain.
//!
//! Models and contracts for the per-user conversation archive: chat
//! sessions and messages, the session repository trait, the legacy
//! flat-history façade, and the external collaborator interfaces.

pub mod collaborator;
pub mod error;
pub mod history;
pub mod identity;
pub mod session;

// Re-export common error type
pub use error::{CarelogError, Result};
