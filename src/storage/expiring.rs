//! Expiring Cache Module
//!
//! Layers creation-time and TTL metadata over a [`StorageBackend`], expiring
//! stale records lazily when they are read.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::clock::Clock;
use crate::error::Result;
use crate::storage::stats::StatsCounters;
use crate::storage::{CacheRecord, CacheStats, StorageBackend};

// == Expiring Cache ==
/// Key-value cache with optional per-record TTL.
///
/// Every record is stored as one serialized [`CacheRecord`] string. Expiry is
/// checked on [`get`](Self::get) and by an explicit
/// [`purge_expired`](Self::purge_expired); there is no background sweeper.
pub struct ExpiringCache<B: StorageBackend> {
    /// Backing key-value storage
    backend: Arc<B>,
    /// Time source for creation stamps and expiry checks
    clock: Arc<dyn Clock>,
    /// Activity counters
    stats: StatsCounters,
}

impl<B: StorageBackend> ExpiringCache<B> {
    // == Constructor ==
    /// Creates a cache over `backend` that reads time from `clock`.
    pub fn new(backend: Arc<B>, clock: Arc<dyn Clock>) -> Self {
        Self {
            backend,
            clock,
            stats: StatsCounters::default(),
        }
    }

    // == Set ==
    /// Stores `payload` under `key` with an optional TTL in milliseconds.
    ///
    /// An empty key is ignored. Any existing record for the key is replaced
    /// and its creation time reset. The payload is copied by serialization, so
    /// later changes to the caller's value are not observed by the cache.
    ///
    /// Fails only if `payload` cannot be encoded as JSON; nothing is written in
    /// that case.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, payload: &T, ttl: Option<u64>) -> Result<()> {
        if key.is_empty() {
            return Ok(());
        }

        let record = CacheRecord::new(payload, ttl, self.clock.now_ms());
        let encoded = record.encode()?;
        self.backend.write(key, encoded);
        self.stats.record_write();

        debug!("Stored key '{}' (ttl: {:?} ms)", key, ttl);
        Ok(())
    }

    // == Get ==
    /// Returns the payload stored under `key`.
    ///
    /// Returns None when the key is empty, missing, malformed or not decodable
    /// as `T`. A record whose TTL has elapsed is removed and reported as None.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if key.is_empty() {
            return None;
        }

        let record = match self
            .backend
            .read(key)
            .and_then(|raw| CacheRecord::<Value>::decode(&raw))
        {
            Some(record) => record,
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if record.is_expired(self.clock.now_ms()) {
            debug!("Key '{}' expired, removing", key);
            self.clear(key);
            self.stats.record_expiration();
            self.stats.record_miss();
            return None;
        }

        match serde_json::from_value(record.data) {
            Ok(payload) => {
                self.stats.record_hit();
                Some(payload)
            }
            Err(e) => {
                debug!("Key '{}' holds an incompatible payload: {}", key, e);
                self.stats.record_miss();
                None
            }
        }
    }

    // == Clear ==
    /// Removes the record stored under `key`. An empty key is ignored.
    pub fn clear(&self, key: &str) {
        if key.is_empty() {
            return;
        }
        self.backend.delete(key);
    }

    // == Purge Expired ==
    /// Removes every record whose TTL has elapsed and returns how many were
    /// removed. Malformed records are left alone.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_ms();
        let mut purged = 0;
        for key in self.backend.keys() {
            let expired = self
                .backend
                .read(&key)
                .and_then(|raw| CacheRecord::<Value>::decode(&raw))
                .is_some_and(|record| record.is_expired(now));
            if expired {
                self.backend.delete(&key);
                self.stats.record_expiration();
                purged += 1;
            }
        }
        purged
    }

    // == TTL Remaining ==
    /// Returns the remaining TTL of a live record in milliseconds.
    ///
    /// None when the key is missing, malformed or the record never expires.
    /// Does not purge expired records.
    pub fn ttl_remaining_ms(&self, key: &str) -> Option<u64> {
        if key.is_empty() {
            return None;
        }
        let record = CacheRecord::<Value>::decode(&self.backend.read(key)?)?;
        record.ttl_remaining_ms(self.clock.now_ms())
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.backend.len())
    }

    // == Length ==
    /// Returns the number of records in the backing storage, stale ones included.
    pub fn len(&self) -> usize {
        self.backend.len()
    }

    // == Is Empty ==
    /// Returns true if the backing storage holds no records.
    pub fn is_empty(&self) -> bool {
        self.backend.is_empty()
    }

    /// Returns the backing storage.
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStorage;
    use serde::Deserialize;
    use std::collections::HashMap;

    fn new_cache() -> (ExpiringCache<MemoryStorage>, ManualClock) {
        let clock = ManualClock::new(1_000_000);
        let cache = ExpiringCache::new(Arc::new(MemoryStorage::new()), Arc::new(clock.clone()));
        (cache, clock)
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Profile {
        name: String,
        tags: Vec<String>,
    }

    #[test]
    fn test_cache_new() {
        let (cache, _) = new_cache();
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_set_and_get() {
        let (cache, _) = new_cache();

        cache.set("key1", "value1", None).unwrap();

        assert_eq!(cache.get::<String>("key1").as_deref(), Some("value1"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_structured_payload() {
        let (cache, _) = new_cache();
        let mut profile = Profile {
            name: "ada".to_string(),
            tags: vec!["admin".to_string()],
        };

        cache.set("profile", &profile, None).unwrap();
        profile.tags.push("mutated".to_string());

        let stored: Profile = cache.get("profile").unwrap();
        assert_eq!(stored.tags, vec!["admin".to_string()]);
    }

    #[test]
    fn test_get_nonexistent() {
        let (cache, _) = new_cache();
        assert!(cache.get::<String>("nonexistent").is_none());
    }

    #[test]
    fn test_empty_key_is_noop() {
        let (cache, _) = new_cache();

        cache.set("", "value", None).unwrap();
        cache.clear("");

        assert!(cache.get::<String>("").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_overwrite_resets_record() {
        let (cache, clock) = new_cache();

        cache.set("key1", "value1", Some(100)).unwrap();
        clock.advance(80);
        cache.set("key1", "value2", None).unwrap();
        clock.advance(1_000);

        assert_eq!(cache.get::<String>("key1").as_deref(), Some("value2"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_ttl_expiration() {
        let (cache, clock) = new_cache();

        cache.set("key1", &42, Some(100)).unwrap();

        clock.advance(100);
        assert_eq!(cache.get::<i32>("key1"), Some(42));

        clock.advance(1);
        assert!(cache.get::<i32>("key1").is_none());
        assert!(cache.backend().read("key1").is_none(), "expired record is purged");
    }

    #[test]
    fn test_no_ttl_never_expires() {
        let (cache, clock) = new_cache();

        cache.set("key1", &true, None).unwrap();
        clock.advance(365 * 24 * 60 * 60 * 1000);

        assert_eq!(cache.get::<bool>("key1"), Some(true));
    }

    #[test]
    fn test_clear() {
        let (cache, _) = new_cache();

        cache.set("key1", "value1", None).unwrap();
        cache.clear("key1");
        assert!(cache.get::<String>("key1").is_none());

        cache.clear("key1");
        assert!(cache.get::<String>("key1").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_malformed_record_is_miss() {
        let (cache, _) = new_cache();

        cache.backend().write("bad", "{not json".to_string());
        cache.backend().write("null", "null".to_string());

        assert!(cache.get::<String>("bad").is_none());
        assert!(cache.get::<String>("null").is_none());
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn test_type_mismatch_is_miss_but_keeps_record() {
        let (cache, _) = new_cache();

        cache.set("key1", "text", None).unwrap();

        assert!(cache.get::<u32>("key1").is_none());
        assert_eq!(cache.get::<String>("key1").as_deref(), Some("text"));
    }

    #[test]
    fn test_expired_record_purged_regardless_of_type() {
        let (cache, clock) = new_cache();

        cache.set("key1", "text", Some(10)).unwrap();
        clock.advance(11);

        assert!(cache.get::<u32>("key1").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_unencodable_payload_is_error() {
        let (cache, _) = new_cache();
        let mut payload = HashMap::new();
        payload.insert(vec![1u8], "non-string map key");

        assert!(cache.set("key1", &payload, None).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_ttl_remaining() {
        let (cache, clock) = new_cache();

        cache.set("key1", "v", Some(1_000)).unwrap();
        clock.advance(300);

        assert_eq!(cache.ttl_remaining_ms("key1"), Some(700));
        assert!(cache.ttl_remaining_ms("missing").is_none());
    }

    #[test]
    fn test_reads_records_written_by_other_clients() {
        let (cache, _) = new_cache();
        cache
            .backend()
            .write("legacy", r#"{"createdAt":0,"ttl":"","data":{"a":1}}"#.to_string());

        let value: Value = cache.get("legacy").unwrap();

        assert_eq!(value["a"], 1);
    }

    #[test]
    fn test_loose_ttls_from_other_clients() {
        let (cache, clock) = new_cache();
        let backend = cache.backend();
        backend.write("zero_text", r#"{"createdAt":1000000,"ttl":"0","data":1}"#.to_string());
        backend.write("negative", r#"{"createdAt":1000000,"ttl":-5,"data":2}"#.to_string());
        backend.write("word", r#"{"createdAt":0,"ttl":"later","data":3}"#.to_string());

        assert_eq!(cache.get::<i32>("zero_text"), Some(1));
        assert_eq!(cache.get::<i32>("negative"), None);
        clock.advance(1);
        assert_eq!(cache.get::<i32>("zero_text"), None);
        assert_eq!(cache.get::<i32>("word"), Some(3));
        assert_eq!(cache.stats().expirations, 2);
    }

    #[test]
    fn test_purge_expired() {
        let (cache, clock) = new_cache();
        cache.set("short", &1, Some(10)).unwrap();
        cache.set("long", &2, Some(1_000)).unwrap();
        cache.set("forever", &3, None).unwrap();
        cache.backend().write("junk", "not a record".to_string());

        clock.advance(11);
        let purged = cache.purge_expired();

        assert_eq!(purged, 1);
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get::<i32>("long"), Some(2));
        assert_eq!(cache.stats().expirations, 1);
        assert_eq!(cache.stats().misses, 0);
    }

    #[test]
    fn test_stats() {
        let (cache, clock) = new_cache();

        cache.set("key1", "value1", None).unwrap();
        cache.set("key2", "value2", Some(5)).unwrap();
        cache.get::<String>("key1"); // hit
        cache.get::<String>("nonexistent"); // miss
        clock.advance(10);
        cache.get::<String>("key2"); // expired

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.writes, 2);
        assert_eq!(stats.total_entries, 1);
    }
}
