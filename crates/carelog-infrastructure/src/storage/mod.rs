//! Storage primitives shared by the file-backed repositories.

pub mod atomic_json;

pub use atomic_json::{AtomicJsonError, AtomicJsonFile, FileLock};
