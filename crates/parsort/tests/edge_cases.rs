//! Edge case and shutdown tests for parsort
//!
//! Degenerate inputs, pathological shapes, and bounded-time teardown.

use parsort::{parallel_sort, PoolConfig, SharedBuffer, SortPool};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn assert_sorted(a: &[f64]) {
    for i in 1..a.len() {
        assert!(a[i - 1] <= a[i], "out of order at index {}", i);
    }
}

// ============================================================================
// DEGENERATE INPUTS
// ============================================================================

#[test]
fn test_empty_array() {
    let sorted = parallel_sort(Vec::new(), PoolConfig::with_threads(4)).unwrap();
    assert!(sorted.is_empty());
}

#[test]
fn test_single_element() {
    let sorted = parallel_sort(vec![0.5], PoolConfig::with_threads(4)).unwrap();
    assert_eq!(sorted, vec![0.5]);
}

#[test]
fn test_two_elements() {
    let sorted = parallel_sort(vec![2.0, 1.0], PoolConfig::with_threads(4)).unwrap();
    assert_eq!(sorted, vec![1.0, 2.0]);
}

// ============================================================================
// PATHOLOGICAL SHAPES
// ============================================================================

#[test]
fn test_already_sorted() {
    let data: Vec<f64> = (0..10_000).map(f64::from).collect();
    let sorted = parallel_sort(data.clone(), PoolConfig::with_threads(4)).unwrap();
    assert_eq!(sorted, data);
}

#[test]
fn test_reverse_sorted() {
    let data: Vec<f64> = (0..10_000).rev().map(f64::from).collect();
    let sorted = parallel_sort(data, PoolConfig::with_threads(4)).unwrap();
    assert_sorted(&sorted);
}

#[test]
fn test_all_equal() {
    let sorted = parallel_sort(vec![3.25; 10_000], PoolConfig::with_threads(4)).unwrap();
    assert_eq!(sorted, vec![3.25; 10_000]);
}

#[test]
fn test_sawtooth() {
    let data: Vec<f64> = (0..10_000).map(|n| f64::from(n % 17)).collect();
    let sorted = parallel_sort(data, PoolConfig::with_threads(4)).unwrap();
    assert_sorted(&sorted);
}

#[test]
fn test_negative_and_positive() {
    let data: Vec<f64> = (0..5_000).map(|n| f64::from(2_500 - n) * 0.5).collect();
    let sorted = parallel_sort(data, PoolConfig::with_threads(4)).unwrap();
    assert_sorted(&sorted);
    assert!(sorted[0] < 0.0);
}

// ============================================================================
// SHUTDOWN
// ============================================================================

fn timed_run(len: usize, threads: usize) -> Duration {
    let data: Vec<f64> = (0..len).map(|n| f64::from((n as u32).wrapping_mul(2_654_435_761) >> 16)).collect();
    let buffer = Arc::new(SharedBuffer::from_vec(data));
    let mut pool = SortPool::new(PoolConfig::with_threads(threads)).unwrap();
    pool.sort(Arc::clone(&buffer)).unwrap();
    assert_eq!(pool.await_completion().unwrap(), len);

    let start = Instant::now();
    pool.shutdown();
    let elapsed = start.elapsed();

    drop(pool);
    assert_sorted(&Arc::try_unwrap(buffer).unwrap().into_vec());
    elapsed
}

#[test]
fn test_shutdown_joins_promptly_after_any_run() {
    for len in [0, 1, 1_000_000] {
        let elapsed = timed_run(len, 4);
        assert!(
            elapsed < Duration::from_secs(10),
            "shutdown took {:?} after sorting {} elements",
            elapsed,
            len
        );
    }
}

#[test]
fn test_drop_without_submit_terminates() {
    let pool = SortPool::new(PoolConfig::with_threads(8)).unwrap();
    assert_eq!(pool.worker_count(), 8);
    // Drop must enqueue the sentinels and join all workers on its own.
    drop(pool);
}
