//! Worker Pool
//!
//! Fixed set of long-lived worker threads, each running a dequeue-execute
//! loop against the shared task queue. All shared state lives in one context
//! object handed to every worker; there are no process-wide globals.

use crate::buffer::SharedBuffer;
use crate::partition::{self, Step, DEFAULT_INSERTION_THRESHOLD};
use crate::queue::TaskQueue;
use crate::task::Task;
use crate::tracker::CompletionTracker;
use crate::SortError;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

/// Pool construction parameters.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of worker threads; fixed for the pool's lifetime.
    pub threads: usize,
    /// Nominal task queue capacity; clamped up to `2 * threads` so the
    /// blocking enqueue path always leaves room for shutdown sentinels.
    pub queue_capacity: usize,
    /// Range length below which a worker finishes a task with insertion sort.
    pub insertion_threshold: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        let threads = thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(4);
        Self {
            threads,
            queue_capacity: 2 * threads,
            insertion_threshold: DEFAULT_INSERTION_THRESHOLD,
        }
    }
}

impl PoolConfig {
    /// Config with a specific worker count and defaults for the rest.
    pub fn with_threads(threads: usize) -> Self {
        let threads = threads.max(1);
        Self {
            threads,
            queue_capacity: 2 * threads,
            insertion_threshold: DEFAULT_INSERTION_THRESHOLD,
        }
    }

    /// Override the nominal queue capacity.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Override the insertion-sort threshold.
    pub fn with_insertion_threshold(mut self, threshold: usize) -> Self {
        self.insertion_threshold = threshold;
        self
    }

    fn normalized(mut self) -> Self {
        self.threads = self.threads.max(1);
        self.queue_capacity = self.queue_capacity.max(2 * self.threads);
        // Partitioning needs at least three elements to pick a median from.
        self.insertion_threshold = self.insertion_threshold.max(2);
        self
    }
}

/// Counts workers that reached their dequeue loop; pool construction blocks
/// on it so startup is deterministic.
struct StartupGate {
    ready: Mutex<usize>,
    all_ready: Condvar,
}

impl StartupGate {
    fn new() -> Self {
        Self {
            ready: Mutex::new(0),
            all_ready: Condvar::new(),
        }
    }

    fn arrive(&self) {
        let mut ready = self.ready.lock().unwrap();
        *ready += 1;
        self.all_ready.notify_all();
    }

    fn wait_for(&self, count: usize) {
        let mut ready = self.ready.lock().unwrap();
        while *ready < count {
            ready = self.all_ready.wait(ready).unwrap();
        }
    }
}

/// State shared by the caller and every worker.
struct Shared {
    queue: TaskQueue,
    tracker: CompletionTracker,
    threshold: usize,
    startup: StartupGate,
    #[cfg(debug_assertions)]
    executing: Mutex<Vec<(usize, usize)>>,
}

/// Asserts that concurrently executing sort ranges never overlap.
#[cfg(debug_assertions)]
struct RangeGuard<'a> {
    executing: &'a Mutex<Vec<(usize, usize)>>,
    range: (usize, usize),
}

/// A guard that trips the overlap assertion poisons the ledger mutex; later
/// guards and unwinding drops still need access to it.
#[cfg(debug_assertions)]
fn ledger_lock(
    executing: &Mutex<Vec<(usize, usize)>>,
) -> std::sync::MutexGuard<'_, Vec<(usize, usize)>> {
    match executing.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(debug_assertions)]
impl<'a> RangeGuard<'a> {
    fn enter(executing: &'a Mutex<Vec<(usize, usize)>>, lo: usize, hi: usize) -> Self {
        let mut ranges = ledger_lock(executing);
        for &(other_lo, other_hi) in ranges.iter() {
            assert!(
                hi < other_lo || lo > other_hi,
                "executing ranges overlap: [{},{}] vs [{},{}]",
                lo,
                hi,
                other_lo,
                other_hi
            );
        }
        ranges.push((lo, hi));
        Self {
            executing,
            range: (lo, hi),
        }
    }
}

#[cfg(debug_assertions)]
impl Drop for RangeGuard<'_> {
    fn drop(&mut self) {
        let mut ranges = ledger_lock(self.executing);
        if let Some(pos) = ranges.iter().position(|&range| range == self.range) {
            ranges.swap_remove(pos);
        }
    }
}

struct Worker {
    id: usize,
    thread: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.id)
            .field("running", &self.thread.is_some())
            .finish()
    }
}

/// Fixed pool of workers plus the shared queue and completion tracker.
#[derive(Debug)]
pub struct SortPool {
    workers: Vec<Worker>,
    shared: Arc<Shared>,
}

impl std::fmt::Debug for Shared {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shared")
            .field("queued", &self.queue.len())
            .field("threshold", &self.threshold)
            .finish()
    }
}

impl SortPool {
    /// Spawn the workers and block until all of them are ready.
    ///
    /// Fails atomically: if any spawn fails, the workers that did start are
    /// stopped and joined before the error is returned.
    pub fn new(config: PoolConfig) -> Result<Self, SortError> {
        let config = config.normalized();
        let shared = Arc::new(Shared {
            queue: TaskQueue::new(config.queue_capacity),
            tracker: CompletionTracker::new(),
            threshold: config.insertion_threshold,
            startup: StartupGate::new(),
            #[cfg(debug_assertions)]
            executing: Mutex::new(Vec::new()),
        });

        let mut workers: Vec<Worker> = Vec::with_capacity(config.threads);
        for id in 0..config.threads {
            let worker_shared = Arc::clone(&shared);
            let spawned = thread::Builder::new()
                .name(format!("parsort-worker-{}", id))
                .spawn(move || worker_loop(id, worker_shared));
            match spawned {
                Ok(thread) => workers.push(Worker {
                    id,
                    thread: Some(thread),
                }),
                Err(source) => {
                    tracing::error!("failed to spawn worker {}: {}", id, source);
                    for _ in &workers {
                        shared.queue.enqueue(Task::Shutdown);
                    }
                    for worker in &mut workers {
                        if let Some(thread) = worker.thread.take() {
                            let _ = thread.join();
                        }
                    }
                    return Err(SortError::PoolInit { worker: id, source });
                }
            }
        }

        shared.startup.wait_for(config.threads);
        tracing::debug!(
            "pool ready: {} workers, queue capacity {}, threshold {}",
            config.threads,
            config.queue_capacity,
            config.insertion_threshold
        );

        Ok(Self { workers, shared })
    }

    /// Enqueue the root task for the inclusive range `[lo, hi]`.
    ///
    /// Arms the completion tracker with `hi - lo + 1` elements. The caller
    /// must keep exactly one `await_completion` outstanding per submit.
    pub fn submit_root(
        &self,
        buffer: Arc<SharedBuffer>,
        lo: usize,
        hi: usize,
    ) -> Result<(), SortError> {
        let len = buffer.len();
        if lo > hi || hi >= len {
            return Err(SortError::InvalidRange { lo, hi, len });
        }
        self.shared.tracker.begin(hi - lo + 1);
        self.shared.queue.enqueue(Task::SortRange { buffer, lo, hi });
        Ok(())
    }

    /// Sort an entire buffer; empty buffers complete immediately.
    pub fn sort(&self, buffer: Arc<SharedBuffer>) -> Result<(), SortError> {
        if buffer.is_empty() {
            self.shared.tracker.begin(0);
            return Ok(());
        }
        let hi = buffer.len() - 1;
        self.submit_root(buffer, 0, hi)
    }

    /// Block until the submitted range is fully sorted.
    ///
    /// Returns the total number of elements reported, or the first worker
    /// fault recorded during the run.
    pub fn await_completion(&self) -> Result<usize, SortError> {
        self.shared.tracker.await_completion()
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Stop all workers and join them. Idempotent.
    ///
    /// Enqueues exactly one shutdown sentinel per worker; each sentinel is
    /// consumed by exactly one worker.
    pub fn shutdown(&mut self) {
        if self.workers.iter().all(|worker| worker.thread.is_none()) {
            return;
        }
        for _ in &self.workers {
            self.shared.queue.enqueue(Task::Shutdown);
        }
        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take() {
                let _ = thread.join();
            }
        }
        tracing::debug!("pool shut down, {} workers joined", self.workers.len());
    }
}

impl Drop for SortPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(id: usize, shared: Arc<Shared>) {
    tracing::debug!("worker {} ready", id);
    shared.startup.arrive();

    loop {
        match shared.queue.dequeue() {
            Task::SortRange { buffer, lo, hi } => {
                // A panicking task must not kill the worker silently: the
                // waiter in await_completion would hang forever. Contain the
                // unwind and surface it as the run's fault.
                let run =
                    panic::catch_unwind(AssertUnwindSafe(|| execute_range(&shared, buffer, lo, hi)));
                if let Err(payload) = run {
                    shared.tracker.record_fault(panic_text(payload.as_ref()));
                }
            }
            Task::RangeComplete { lo, hi } => {
                if lo > hi {
                    shared
                        .tracker
                        .record_fault(format!("completion range [{},{}] is inverted", lo, hi));
                } else {
                    shared.tracker.report(hi - lo + 1);
                }
            }
            Task::Shutdown => break,
        }
    }

    tracing::debug!("worker {} stopped", id);
}

fn panic_text(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "worker panicked".to_string()
    }
}

fn execute_range(shared: &Shared, buffer: Arc<SharedBuffer>, lo: usize, hi: usize) {
    if lo > hi || hi >= buffer.len() {
        shared.tracker.record_fault(format!(
            "sort task range [{},{}] out of bounds for buffer of length {}",
            lo,
            hi,
            buffer.len()
        ));
        return;
    }

    // The task stops EXECUTING once the buffer work is done: the guard and
    // the borrow must end here, because an enqueued child covers a subrange
    // of [lo, hi] and another worker may start it immediately.
    let step = {
        #[cfg(debug_assertions)]
        let _executing = RangeGuard::enter(&shared.executing, lo, hi);

        // The split contract keeps in-flight ranges disjoint, so this worker
        // is the only one touching [lo, hi] right now.
        let slice = unsafe { buffer.range_mut(lo, hi) };
        partition::advance(slice, 0, slice.len() - 1, shared.threshold)
    };

    // Workers never take the blocking enqueue path: a worker stuck waiting
    // for queue space is one less consumer draining that same queue.
    match step {
        Step::Finished { .. } => {
            if let Err(err) = shared.queue.enqueue_from_worker(Task::RangeComplete { lo, hi }) {
                shared.tracker.record_fault(err.to_string());
            }
        }
        Step::Split { left, right } => {
            let first = Task::SortRange {
                buffer: Arc::clone(&buffer),
                lo: lo + left.0,
                hi: lo + left.1,
            };
            let second = Task::SortRange {
                buffer,
                lo: lo + right.0,
                hi: lo + right.1,
            };
            if let Err(err) = shared.queue.enqueue_split(first, second) {
                shared.tracker.record_fault(err.to_string());
            }
        }
    }
}
