//! In-memory key-value store for testing

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::{KeyValueStore, StoreError, StoreResult};

/// In-memory store with injectable failures
pub struct MemoryKv {
    values: Mutex<HashMap<String, String>>,

    /// Configure reads to fail
    pub fail_reads: Arc<Mutex<bool>>,

    /// Configure writes and removals to fail
    pub fail_writes: Arc<Mutex<bool>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
            fail_reads: Arc::new(Mutex::new(false)),
            fail_writes: Arc::new(Mutex::new(false)),
        }
    }

    /// Seed a raw value, bypassing failure flags
    pub fn with_value(self, key: &str, value: &str) -> Self {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Raw value for a key, bypassing failure flags
    pub fn raw(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        *self.fail_reads.lock().unwrap() = fail;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().unwrap() = fail;
    }
}

impl Default for MemoryKv {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        if *self.fail_reads.lock().unwrap() {
            return Err(StoreError::Database("Mock read failure".into()));
        }
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        if *self.fail_writes.lock().unwrap() {
            return Err(StoreError::Database("Mock write failure".into()));
        }
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        if *self.fail_writes.lock().unwrap() {
            return Err(StoreError::Database("Mock write failure".into()));
        }
        self.values.lock().unwrap().remove(key);
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        !*self.fail_reads.lock().unwrap()
    }
}
