//! Property-Based Tests for Storage Module
//!
//! Uses proptest to verify the cache's round-trip, expiry and clear properties
//! against a manual clock.

use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

use crate::clock::ManualClock;
use crate::storage::{ExpiringCache, MemoryStorage};

// == Test Configuration ==
const START_MS: u64 = 1_700_000_000_000;

fn new_cache() -> (ExpiringCache<MemoryStorage>, ManualClock) {
    let clock = ManualClock::new(START_MS);
    let cache = ExpiringCache::new(Arc::new(MemoryStorage::new()), Arc::new(clock.clone()));
    (cache, clock)
}

// == Strategies ==
/// Generates valid cache keys (non-empty)
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,64}"
}

/// Generates arbitrary JSON payloads
fn payload_strategy() -> impl Strategy<Value = serde_json::Value> {
    let leaf = prop_oneof![
        Just(serde_json::Value::Null),
        any::<bool>().prop_map(serde_json::Value::from),
        any::<i64>().prop_map(serde_json::Value::from),
        "[a-zA-Z0-9 ]{0,32}".prop_map(serde_json::Value::from),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(serde_json::Value::from),
            prop::collection::hash_map("[a-z]{1,8}", inner, 0..4)
                .prop_map(|m| serde_json::Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Generates a sequence of cache operations for testing
#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: i64 },
    Get { key: String },
    Clear { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    let key = "[a-c]{1,2}";
    prop_oneof![
        (key, any::<i64>()).prop_map(|(key, value)| CacheOp::Set { key, value }),
        key.prop_map(|key| CacheOp::Get { key }),
        key.prop_map(|key| CacheOp::Clear { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Storing a payload and reading it back before expiry returns an equal value
    #[test]
    fn prop_roundtrip_storage(key in valid_key_strategy(), value in payload_strategy()) {
        let (cache, _) = new_cache();

        cache.set(&key, &value, None).unwrap();

        let retrieved: serde_json::Value = cache.get(&key).unwrap();
        prop_assert_eq!(retrieved, value, "Round-trip value mismatch");
    }

    // A record is readable while elapsed <= ttl and gone (and purged) after
    #[test]
    fn prop_ttl_expiration_behavior(
        key in valid_key_strategy(),
        value in any::<i64>(),
        ttl in 1u64..10_000,
        before in 0u64..10_000,
        overshoot in 1u64..10_000,
    ) {
        let (cache, clock) = new_cache();
        cache.set(&key, &value, Some(ttl)).unwrap();

        clock.advance(before.min(ttl));
        prop_assert_eq!(cache.get::<i64>(&key), Some(value), "Value should be live before TTL elapses");

        clock.set(START_MS + ttl + overshoot);
        prop_assert!(cache.get::<i64>(&key).is_none(), "Value should be gone after TTL");
        prop_assert!(cache.is_empty(), "Expired record should be purged");
    }

    // Clearing once or twice leaves the key absent
    #[test]
    fn prop_clear_idempotent(key in valid_key_strategy(), value in any::<i64>(), twice in any::<bool>()) {
        let (cache, _) = new_cache();
        cache.set(&key, &value, None).unwrap();

        cache.clear(&key);
        if twice {
            cache.clear(&key);
        }

        prop_assert!(cache.get::<i64>(&key).is_none());
        prop_assert!(cache.is_empty());
    }

    // Storing V1 then V2 under one key reads back V2
    #[test]
    fn prop_overwrite_semantics(key in valid_key_strategy(), value1 in any::<i64>(), value2 in any::<i64>()) {
        let (cache, _) = new_cache();

        cache.set(&key, &value1, None).unwrap();
        cache.set(&key, &value2, None).unwrap();

        prop_assert_eq!(cache.get::<i64>(&key), Some(value2));
        prop_assert_eq!(cache.len(), 1);
    }

    // The cache agrees with a plain map model, and stats count every read
    #[test]
    fn prop_matches_model(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let (cache, _) = new_cache();
        let mut model: HashMap<String, i64> = HashMap::new();
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    cache.set(&key, &value, None).unwrap();
                    model.insert(key, value);
                }
                CacheOp::Get { key } => {
                    let got = cache.get::<i64>(&key);
                    prop_assert_eq!(got, model.get(&key).copied());
                    match got {
                        Some(_) => expected_hits += 1,
                        None => expected_misses += 1,
                    }
                }
                CacheOp::Clear { key } => {
                    cache.clear(&key);
                    model.remove(&key);
                }
            }
        }

        let stats = cache.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.total_entries, model.len(), "Total entries mismatch");
    }
}
