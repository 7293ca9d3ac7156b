//! parsort - Command-Line Driver
//!
//! Fills an array with random values, sorts it on the worker pool, and
//! independently verifies that the result is non-decreasing.
//!
//! Usage: parsort [LEN] [THREADS] [QUEUE_CAPACITY] [THRESHOLD]

use parsort::{PoolConfig, SharedBuffer, SortPool};
use rand::Rng;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn arg(position: usize) -> Option<usize> {
    std::env::args().nth(position).and_then(|raw| raw.parse().ok())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let defaults = PoolConfig::default();
    let len = arg(1).unwrap_or(1_000_000);
    let config = PoolConfig {
        threads: arg(2).unwrap_or(defaults.threads),
        queue_capacity: arg(3).unwrap_or(defaults.queue_capacity),
        insertion_threshold: arg(4).unwrap_or(defaults.insertion_threshold),
    };

    tracing::info!(
        "sorting {} elements on {} workers (parsort {})",
        len,
        config.threads,
        parsort::VERSION
    );

    let mut rng = rand::thread_rng();
    let data: Vec<f64> = (0..len).map(|_| rng.gen::<f64>()).collect();

    let start = Instant::now();
    let buffer = Arc::new(SharedBuffer::from_vec(data));
    let mut pool = SortPool::new(config)?;
    pool.sort(Arc::clone(&buffer))?;
    let total = pool.await_completion()?;
    pool.shutdown();
    drop(pool);
    tracing::info!("sorted {} elements in {:.3?}", total, start.elapsed());

    let sorted = match Arc::try_unwrap(buffer) {
        Ok(buffer) => buffer.into_vec(),
        Err(shared) => shared.snapshot(),
    };

    // Independent verification pass.
    if let Some(i) = (1..sorted.len()).find(|&i| sorted[i - 1] > sorted[i]) {
        anyhow::bail!("verification failed: out of order at index {}", i);
    }
    tracing::info!("verification passed");

    Ok(())
}
