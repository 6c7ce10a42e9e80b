//! Store trait definitions

use crate::StoreResult;

/// Durable string key-value storage
///
/// `set` must replace the value for a key as a single operation; the session
/// history relies on that for whole-list writes.
pub trait KeyValueStore: Send + Sync {
    /// Read the value for `key`, `None` if absent
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Insert or replace the value for `key`
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove `key`; removing an absent key is not an error
    fn remove(&self, key: &str) -> StoreResult<()>;

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}
