//! Full-pipeline tests for parsort
//!
//! Sortedness, multiset preservation, and completion accounting across
//! worker counts.

use parsort::{parallel_sort, PoolConfig, SharedBuffer, SortPool};
use rand::Rng;
use std::sync::Arc;

fn random_data(len: usize) -> Vec<f64> {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| rng.gen::<f64>()).collect()
}

fn assert_sorted(a: &[f64]) {
    for i in 1..a.len() {
        assert!(a[i - 1] <= a[i], "out of order at index {}", i);
    }
}

fn std_sorted(mut a: Vec<f64>) -> Vec<f64> {
    a.sort_by(|x, y| x.partial_cmp(y).unwrap());
    a
}

// ============================================================================
// SORTEDNESS AND MULTISET PRESERVATION
// ============================================================================

#[test]
fn test_sorts_random_array() {
    let data = random_data(50_000);
    let expected = std_sorted(data.clone());

    let sorted = parallel_sort(data, PoolConfig::with_threads(4)).unwrap();
    assert_sorted(&sorted);
    assert_eq!(sorted, expected, "element multiset changed");
}

#[test]
fn test_multiset_preserved_with_duplicates() {
    let mut rng = rand::thread_rng();
    let data: Vec<f64> = (0..20_000).map(|_| f64::from(rng.gen_range(0..50))).collect();
    let expected = std_sorted(data.clone());

    let sorted = parallel_sort(data, PoolConfig::with_threads(4)).unwrap();
    assert_eq!(sorted, expected);
}

// ============================================================================
// COMPLETION ACCOUNTING ACROSS WORKER COUNTS
// ============================================================================

#[test]
fn test_completion_count_exact_for_each_worker_count() {
    for threads in [1, 2, 4, 8] {
        let len = 10_000;
        let buffer = Arc::new(SharedBuffer::from_vec(random_data(len)));
        let mut pool = SortPool::new(PoolConfig::with_threads(threads)).unwrap();
        pool.sort(Arc::clone(&buffer)).unwrap();

        let total = pool.await_completion().unwrap();
        assert_eq!(total, len, "wrong total for {} workers", threads);

        pool.shutdown();
        drop(pool);
        assert_sorted(&Arc::try_unwrap(buffer).unwrap().into_vec());
    }
}

#[test]
fn test_pool_reusable_across_runs() {
    let mut pool = SortPool::new(PoolConfig::with_threads(2)).unwrap();
    for len in [100, 1_000, 10_000] {
        let buffer = Arc::new(SharedBuffer::from_vec(random_data(len)));
        pool.sort(Arc::clone(&buffer)).unwrap();
        assert_eq!(pool.await_completion().unwrap(), len);
        assert_sorted(&Arc::try_unwrap(buffer).unwrap().into_vec());
    }
    pool.shutdown();
}

// ============================================================================
// STRESS
// ============================================================================

// Many workers and a minimal threshold maximize concurrent splits, so a
// child range dequeued while its parent is still wrapping up would trip the
// debug-build overlap ledger and fault the run.
#[test]
fn test_deep_split_fanout_many_workers() {
    let config = PoolConfig::with_threads(16).with_insertion_threshold(2);
    for _ in 0..5 {
        let data = random_data(4_000);
        let expected = std_sorted(data.clone());
        let sorted = parallel_sort(data, config.clone()).unwrap();
        assert_eq!(sorted, expected);
    }
}

// Debug builds also exercise the in-pool overlap ledger here: any two
// concurrently executing sort ranges trip an assertion if they intersect.
#[test]
fn test_stress_randomized_shapes() {
    let mut rng = rand::thread_rng();
    for _ in 0..20 {
        let len = rng.gen_range(1..5_000);
        let threads = rng.gen_range(1..=8);
        let threshold = rng.gen_range(2..64);
        let config = PoolConfig::with_threads(threads).with_insertion_threshold(threshold);

        let data = random_data(len);
        let expected = std_sorted(data.clone());
        let sorted = parallel_sort(data, config).unwrap();
        assert_eq!(sorted, expected);
    }
}
