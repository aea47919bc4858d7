//! Storage Backend Module
//!
//! The key-value persistence surface the expiring cache is layered on, plus an
//! in-memory implementation.

use std::collections::HashMap;

use parking_lot::RwLock;

// == Storage Backend Trait ==
/// A string-to-string key-value store.
///
/// Mirrors the shape of browser local storage: every operation is infallible
/// from the caller's point of view.
pub trait StorageBackend: Send + Sync {
    /// Stores `value` under `key`, replacing any previous value.
    fn write(&self, key: &str, value: String);

    /// Returns the value stored under `key`, if any.
    fn read(&self, key: &str) -> Option<String>;

    /// Removes `key`. Removing a missing key is a no-op.
    fn delete(&self, key: &str);

    /// Returns all stored keys in no particular order.
    fn keys(&self) -> Vec<String>;

    /// Returns the number of stored keys.
    fn len(&self) -> usize;

    /// Returns true if nothing is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// == Memory Storage ==
/// Thread-safe in-memory storage backend.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a storage pre-populated from a snapshot map.
    pub fn from_snapshot(entries: HashMap<String, String>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Returns a copy of every raw key/value pair.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.entries.read().clone()
    }
}

impl StorageBackend for MemoryStorage {
    fn write(&self, key: &str, value: String) {
        self.entries.write().insert(key.to_string(), value);
    }

    fn read(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn delete(&self, key: &str) {
        self.entries.write().remove(key);
    }

    fn keys(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }
}
