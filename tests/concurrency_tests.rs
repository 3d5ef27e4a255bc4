// tests/concurrency_tests.rs

mod common;

use std::sync::{Arc, Barrier};
use std::thread;

use common::{Person, people, person};
use sieve::{EntityFilterCriteria, PredicateCache};

const THREADS: usize = 8;

// ============================================================================
// Shared compiled filters
// ============================================================================

#[test]
fn test_shared_filter_evaluates_consistently() {
    let filter = Arc::new(EntityFilterCriteria::<Person>::parse("Name == \"John\" && Age > 30").unwrap());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let filter = Arc::clone(&filter);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let age = 25 + i as i32 * 2;
                (age, filter.matches(&person("John", age)).unwrap())
            })
        })
        .collect();

    for handle in handles {
        let (age, matched) = handle.join().unwrap();
        assert_eq!(matched, age > 30, "age {}", age);
    }
    assert!(filter.is_compiled());
}

#[test]
fn test_filters_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<EntityFilterCriteria<Person>>();
    assert_send_sync::<PredicateCache<Person>>();
    assert_send_sync::<sieve::QuerySpecification<Person>>();
}

// ============================================================================
// Predicate cache
// ============================================================================

#[test]
fn test_cache_shares_equivalent_spellings() {
    let cache = PredicateCache::<Person>::new();
    let a = cache.get_or_parse("Age > 30").unwrap();
    let b = cache.get_or_parse("Age>30").unwrap();
    let c = cache.get_or_parse("Age > 30").unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&a, &c));
    assert_eq!(cache.len(), 1);

    let stats = cache.stats();
    assert_eq!((stats.hits, stats.misses, stats.size), (2, 1, 1));
}

#[test]
fn test_cache_does_not_store_failures() {
    let cache = PredicateCache::<Person>::new();
    assert!(cache.get_or_parse("Unknown == 1").is_err());
    assert!(cache.is_empty());
    assert_eq!(cache.stats().misses, 0);
    assert_eq!(cache.stats().aliases, 0);
}

#[test]
fn test_cache_is_bounded() {
    let cache = PredicateCache::<Person>::with_capacity(16);
    for i in 0..2000 {
        let spelling = format!("Age{}>{}30", " ".repeat(i % 50), " ".repeat(i / 50));
        cache.get_or_parse(&spelling).unwrap();
    }
    let stats = cache.stats();
    assert_eq!((stats.hits, stats.misses, stats.size), (1999, 1, 1));
    assert_eq!(stats.aliases, 16);

    for age in 0..100 {
        cache.get_or_parse(&format!("Age > {age}")).unwrap();
    }
    assert_eq!(cache.len(), 16);
    assert_eq!(cache.capacity(), 16);
}

#[test]
fn test_evicted_filters_are_rebuilt() {
    let cache = PredicateCache::<Person>::with_capacity(1);
    let first = cache.get_or_parse("Age > 30").unwrap();
    cache.get_or_parse("Archived").unwrap();
    let again = cache.get_or_parse("Age > 30").unwrap();

    assert!(!Arc::ptr_eq(&first, &again));
    assert_eq!(first, again);
    assert_eq!(cache.stats().misses, 3);
}

#[test]
fn test_cache_clear() {
    let cache = PredicateCache::<Person>::new();
    cache.get_or_parse("Archived").unwrap();
    cache.clear();
    assert!(cache.is_empty());
    assert_eq!(cache.stats().hits, 0);
}

#[test]
fn test_cache_under_contention() {
    let cache = Arc::new(PredicateCache::<Person>::new());
    let barrier = Arc::new(Barrier::new(THREADS));
    let spellings = ["Age > 30", "Age>30", " Age > 30 ", "(Age > 30)"];

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            let text = spellings[i % spellings.len()];
            thread::spawn(move || {
                barrier.wait();
                let filter = cache.get_or_parse(text).unwrap();
                let matched = people()
                    .iter()
                    .filter(|p| filter.matches(p).unwrap())
                    .count();
                (filter, matched)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let first = &results[0].0;
    for (filter, matched) in &results {
        assert!(Arc::ptr_eq(first, filter));
        assert_eq!(*matched, 3);
    }
    assert_eq!(cache.len(), 1);
}
