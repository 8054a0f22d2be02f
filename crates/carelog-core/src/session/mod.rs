//! Session domain: models, messages, and the repository contract.

pub mod message;
pub mod model;
pub mod repository;

pub use message::ChatMessage;
pub use model::{ChatSession, SessionSummary, DEFAULT_SESSION_TITLE, LEGACY_SESSION_TITLE};
pub use repository::SessionRepository;
