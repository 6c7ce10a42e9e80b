//! Persistence layer for trailmark
//!
//! Provides:
//! - A minimal key-value store trait (get/set/remove of string blobs)
//! - SQLite and in-memory backends
//! - `SessionStore`, the ordered session history kept as one versioned
//!   JSON document under a single key

mod memory;
mod sessions;
mod sqlite;
mod traits;

pub use memory::*;
pub use sessions::*;
pub use sqlite::*;
pub use traits::*;

use thiserror::Error;
use trailmark_util::SessionId;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unsupported storage format version: {0}")]
    UnsupportedVersion(u32),

    #[error("Session is still active: {0}")]
    SessionActive(SessionId),

    #[error("Session already stored: {0}")]
    DuplicateSession(SessionId),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
