//! parsort
//!
//! In-memory parallel quicksort: a fixed pool of worker threads recursively
//! partitions an array and redistributes the resulting subranges through a
//! bounded task queue. The caller submits one root range, blocks until every
//! element has been reported sorted, and then shuts the pool down.

mod buffer;
mod partition;
mod pool;
mod queue;
mod task;
mod tracker;

pub use buffer::SharedBuffer;
pub use partition::{advance, insertion_sort, partition, Step, DEFAULT_INSERTION_THRESHOLD};
pub use pool::{PoolConfig, SortPool};
pub use queue::TaskQueue;
pub use task::Task;
pub use tracker::CompletionTracker;

use std::io;
use std::sync::Arc;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Errors surfaced by the sorting core
#[derive(Debug, thiserror::Error)]
pub enum SortError {
    /// A worker thread could not be spawned during pool construction.
    #[error("failed to spawn worker {worker}: {source}")]
    PoolInit { worker: usize, source: io::Error },

    /// Task storage could not be obtained.
    #[error("could not allocate task storage")]
    AllocationFailure,

    /// A worker hit an internal contract violation; first fault wins.
    #[error("worker fault: {0}")]
    WorkerFault(String),

    /// The submitted range does not fit the buffer.
    #[error("range [{lo},{hi}] out of bounds for buffer of length {len}")]
    InvalidRange { lo: usize, hi: usize, len: usize },
}

/// Sort a vector on a dedicated pool and return the sorted data.
///
/// Convenience wrapper over the full pool lifecycle: create, submit, wait,
/// shut down, recover the buffer.
pub fn parallel_sort(data: Vec<f64>, config: PoolConfig) -> Result<Vec<f64>, SortError> {
    let buffer = Arc::new(SharedBuffer::from_vec(data));
    let mut pool = SortPool::new(config)?;
    pool.sort(Arc::clone(&buffer))?;
    pool.await_completion()?;
    pool.shutdown();
    drop(pool);

    // The pool released every task reference, so the unwrap path is the
    // common one; the copy is a fallback for stray clones held by the caller.
    Ok(match Arc::try_unwrap(buffer) {
        Ok(buffer) => buffer.into_vec(),
        Err(shared) => shared.snapshot(),
    })
}
