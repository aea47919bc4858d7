//! Storage Module
//!
//! Provides a key-value cache with lazy TTL expiration over a pluggable
//! storage backend, and snapshot persistence for the in-memory backend.

mod backend;
mod expiring;
mod record;
mod snapshot;
mod stats;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use backend::{MemoryStorage, StorageBackend};
pub use expiring::ExpiringCache;
pub use record::{CacheRecord, Ttl};
pub use snapshot::{load_snapshot, save_snapshot, SnapshotWriter};
pub use stats::CacheStats;

// == Public Constants ==
/// Maximum allowed key length in bytes accepted by the HTTP front end
pub const MAX_KEY_LENGTH: usize = 256;
