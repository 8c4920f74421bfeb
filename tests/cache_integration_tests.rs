//! Integration Tests for the Cache
//!
//! Exercises the public API end to end: construction, LRU ordering,
//! updates, deletes and concurrent use.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use mem_vault::{entry_size, estimate_size, impl_record_shape, Cache, CacheError, Opaque};

// == Helper Functions ==

/// Value sized so that exactly two entries fit in a 1 MB cache.
fn third_of_capacity() -> String {
    "x".repeat(400_000)
}

fn create_test_cache() -> Cache<String, String> {
    Cache::new(1).unwrap()
}

// == Construction ==

#[test]
fn test_construct_converts_megabytes() {
    let cache: Cache<String, Vec<i32>> = Cache::new(10).unwrap();
    assert_eq!(cache.capacity(), 10_485_760);
    assert!(cache.is_empty());
    assert_eq!(cache.current_size(), 0);
}

#[test]
fn test_construct_rejects_non_positive_capacity() {
    assert_eq!(
        Cache::<String, String>::new(0).unwrap_err(),
        CacheError::InvalidCapacity(0)
    );
    assert_eq!(
        Cache::<String, String>::new(-1).unwrap_err(),
        CacheError::InvalidCapacity(-1)
    );
}

// == LRU Ordering ==

#[test]
fn test_oldest_entry_is_evicted() {
    let cache = create_test_cache();

    cache.set("A".to_string(), third_of_capacity());
    cache.set("B".to_string(), third_of_capacity());
    cache.set("C".to_string(), third_of_capacity());
    cache.set("D".to_string(), third_of_capacity());

    assert!(!cache.contains("A"));
    assert!(!cache.contains("B"));
    assert!(cache.contains("C"));
    assert!(cache.contains("D"));
    cache.check_invariants().unwrap();
}

#[test]
fn test_insert_beyond_two_evicts_least_recent() {
    let cache = create_test_cache();

    cache.set("A".to_string(), third_of_capacity());
    cache.set("B".to_string(), third_of_capacity());
    // Holds exactly two: C pushes out A
    cache.set("C".to_string(), third_of_capacity());

    assert!(cache.get("A").is_none());
    assert!(cache.get("B").is_some());
    assert!(cache.get("C").is_some());
    assert_eq!(cache.stats().evictions, 1);
}

#[test]
fn test_get_refreshes_recency() {
    let cache = create_test_cache();

    cache.set("A".to_string(), third_of_capacity());
    cache.set("B".to_string(), third_of_capacity());

    // Reading A makes B the least recently used
    assert!(cache.get("A").is_some());
    cache.set("C".to_string(), third_of_capacity());

    assert!(cache.contains("A"));
    assert!(!cache.contains("B"));
    assert!(cache.contains("C"));
}

// == Updates ==

#[test]
fn test_update_in_place_tracks_only_new_value() {
    let cache = create_test_cache();
    let key = "key".to_string();

    cache.set(key.clone(), "x".repeat(5_000));
    cache.set(key.clone(), "y".repeat(10));

    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get("key"), Some("y".repeat(10)));
    assert_eq!(cache.current_size(), entry_size(&key, &"y".repeat(10)));
    cache.check_invariants().unwrap();
}

// == Deletes ==

#[test]
fn test_delete_absent_key_changes_nothing() {
    let cache = create_test_cache();
    cache.set("a".to_string(), "value".to_string());
    let before = cache.stats();

    assert_eq!(cache.delete("missing"), None);

    let after = cache.stats();
    assert_eq!(after.total_entries, before.total_entries);
    assert_eq!(after.current_bytes, before.current_bytes);
    cache.check_invariants().unwrap();
}

#[test]
fn test_delete_present_key_frees_its_size() {
    let cache = create_test_cache();
    let key = "a".to_string();
    let value = "value".to_string();
    let size = entry_size(&key, &value);

    cache.set("b".to_string(), "other".to_string());
    cache.set(key.clone(), value.clone());
    let before = cache.current_size();

    assert_eq!(cache.delete(&key), Some(value));
    assert_eq!(cache.current_size(), before - size);
    assert_eq!(cache.get("a"), None);
}

// == Oversized Entries ==

#[test]
fn test_oversized_entry_is_rejected() {
    let cache = create_test_cache();
    cache.set("small".to_string(), "value".to_string());

    cache.set("huge".to_string(), "x".repeat(2 * 1024 * 1024));

    assert!(!cache.contains("huge"));
    assert!(cache.contains("small"));
    assert_eq!(cache.stats().rejections, 1);
    cache.check_invariants().unwrap();
}

// == Value Shapes ==

#[derive(Debug, Clone, PartialEq)]
struct Profile {
    id: u64,
    name: String,
    tags: Vec<String>,
    scores: HashMap<String, f64>,
    manager: Option<Box<Profile>>,
}

impl_record_shape!(Profile {
    id,
    name,
    tags,
    scores,
    manager
});

#[test]
fn test_round_trip_composite_values() {
    let cache: Cache<u64, Profile> = Cache::new(1).unwrap();
    let boss = Profile {
        id: 1,
        name: "boss".to_string(),
        tags: vec![],
        scores: HashMap::new(),
        manager: None,
    };
    let profile = Profile {
        id: 2,
        name: "worker".to_string(),
        tags: vec!["rust".to_string(), "cache".to_string()],
        scores: [("q1".to_string(), 0.5)].into_iter().collect(),
        manager: Some(Box::new(boss.clone())),
    };

    cache.set(2, profile.clone());

    assert_eq!(cache.get(&2u64), Some(profile.clone()));
    assert_eq!(cache.current_size(), entry_size(&2u64, &profile));
    assert!(estimate_size(&profile) > estimate_size(&boss));
}

#[test]
fn test_opaque_values_are_cached() {
    let cache: Cache<&'static str, Opaque<Arc<Vec<u8>>>> = Cache::new(1).unwrap();
    let payload = Opaque(Arc::new(vec![0u8; 4096]));

    cache.set("blob", payload.clone());

    assert_eq!(cache.get("blob"), Some(payload.clone()));
    assert_eq!(
        cache.current_size(),
        estimate_size(&"blob") + std::mem::size_of::<Arc<Vec<u8>>>()
    );
    assert_eq!(payload.into_inner().len(), 4096);
}

// == Concurrency ==

#[test]
fn test_concurrent_access_keeps_bookkeeping_consistent() {
    let cache = create_test_cache();

    thread::scope(|scope| {
        for worker in 0..8 {
            let cache = cache.clone();
            scope.spawn(move || {
                for i in 0..250 {
                    let key = format!("k{}", (worker * 7 + i) % 40);
                    match i % 3 {
                        0 => cache.set(key, "v".repeat(30_000 + i * 100)),
                        1 => {
                            let _ = cache.get(&key);
                        }
                        _ => {
                            let _ = cache.delete(&key);
                        }
                    }
                }
            });
        }
    });

    cache.check_invariants().unwrap();
    let stats = cache.stats();
    assert!(stats.current_bytes <= stats.capacity_bytes);
    assert_eq!(stats.total_entries, cache.len());
}

#[test]
fn test_writes_are_visible_across_threads() {
    let cache: Cache<u32, u32> = Cache::new(1).unwrap();

    let writer = {
        let cache = cache.clone();
        thread::spawn(move || {
            for i in 0..100 {
                cache.set(i, i * 2);
            }
        })
    };
    writer.join().unwrap();

    for i in 0..100 {
        assert_eq!(cache.get(&i), Some(i * 2));
    }
}
