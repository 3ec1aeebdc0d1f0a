//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the cache and lock contracts over arbitrary entities.

use proptest::prelude::*;
use std::sync::Arc;

use crate::cache::test_support::{SimpleStorable, TestConfig};
use crate::cache::LockableCache;
use crate::error::CacheError;
use crate::store::InMemoryStore;

// == Helpers ==
fn new_cache() -> LockableCache<SimpleStorable> {
    LockableCache::new(Arc::new(TestConfig::local()), Box::new(InMemoryStore::new()))
}

// == Strategies ==
/// Generates entities with a set identifier
fn entity_strategy() -> impl Strategy<Value = SimpleStorable> {
    (1u64..=u64::MAX, "[a-zA-Z0-9 _\\-]{0,128}").prop_map(|(id, text)| SimpleStorable {
        example_uint64: id,
        example_string: text,
    })
}

/// Generates a sequence of cache operations for testing
#[derive(Debug, Clone)]
enum CacheOp {
    Set(String),
    Add(String),
    Delete,
    Lock,
    Unlock,
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        "[a-z]{0,16}".prop_map(CacheOp::Set),
        "[a-z]{0,16}".prop_map(CacheOp::Add),
        Just(CacheOp::Delete),
        Just(CacheOp::Lock),
        Just(CacheOp::Unlock),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // *For any* entity, a get right after a set returns identical field values.
    #[test]
    fn prop_set_then_get_round_trips(entity in entity_strategy()) {
        let cache = new_cache();
        prop_assert!(cache.set(&entity, None, None).unwrap());

        let mut lookup = SimpleStorable::new(entity.example_uint64, "");
        let loaded = cache.get(&mut lookup, None).unwrap();
        prop_assert_eq!(loaded.cloned(), Some(entity));
    }

    // *For any* entity, delete followed by get returns nothing.
    #[test]
    fn prop_delete_then_get_misses(entity in entity_strategy()) {
        let cache = new_cache();
        cache.set(&entity, None, None).unwrap();

        prop_assert!(cache.delete(&entity, None).unwrap());
        let mut lookup = entity.clone();
        prop_assert!(cache.get(&mut lookup, None).unwrap().is_none());
        // get on a miss leaves the entity untouched
        prop_assert_eq!(lookup, entity);
    }

    // *For any* entity, add succeeds exactly once and never overwrites.
    #[test]
    fn prop_add_succeeds_once(entity in entity_strategy(), other_text in "[a-z]{1,16}") {
        let cache = new_cache();
        prop_assert!(cache.add(&entity, None, None).unwrap());

        let rival = SimpleStorable::new(entity.example_uint64, &other_text);
        prop_assert!(!cache.add(&rival, None, None).unwrap());

        let mut lookup = SimpleStorable::new(entity.example_uint64, "");
        cache.get(&mut lookup, None).unwrap();
        prop_assert_eq!(lookup, entity);
    }

    // *For any* interleaving of operations, lock and unlock always report true
    // and the cached body matches a simple model of the last write.
    #[test]
    fn prop_operation_sequences(
        id in 1u64..1000,
        ops in prop::collection::vec(cache_op_strategy(), 1..40),
    ) {
        let cache = new_cache();
        let mut model: Option<String> = None;

        for op in ops {
            match op {
                CacheOp::Set(text) => {
                    prop_assert!(cache.set(&SimpleStorable::new(id, &text), None, None).unwrap());
                    model = Some(text);
                }
                CacheOp::Add(text) => {
                    let added = cache.add(&SimpleStorable::new(id, &text), None, None).unwrap();
                    prop_assert_eq!(added, model.is_none());
                    if added {
                        model = Some(text);
                    }
                }
                CacheOp::Delete => {
                    let deleted = cache.delete(&SimpleStorable::new(id, ""), None).unwrap();
                    prop_assert_eq!(deleted, model.is_some());
                    model = None;
                }
                CacheOp::Lock => {
                    prop_assert!(cache.lock(&SimpleStorable::new(id, "")).unwrap());
                }
                CacheOp::Unlock => {
                    prop_assert!(cache.unlock(&SimpleStorable::new(id, "")).unwrap());
                }
            }
        }

        let mut lookup = SimpleStorable::new(id, "");
        let loaded = cache.get(&mut lookup, None).unwrap().map(|e| e.example_string.clone());
        prop_assert_eq!(loaded, model);
    }

    // *For any* non-positive step, increment fails before reaching the store.
    #[test]
    fn prop_non_positive_increment_rejected(step in i64::MIN..=0) {
        let cache = new_cache();
        let result = cache.driver().direct_increment("counter", step);
        prop_assert!(matches!(result, Err(CacheError::InvalidIncrementStep(s)) if s == step));
        prop_assert!(!cache.driver().is_connected());
    }
}
