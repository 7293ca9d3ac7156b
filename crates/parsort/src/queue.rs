//! Bounded Task Queue
//!
//! Fixed-capacity ring with mutex/condvar backpressure; the single
//! synchronization point between producers and consumers. Full and empty are
//! blocking conditions, never errors.

use crate::task::Task;
use crate::SortError;
use std::sync::{Condvar, Mutex};

/// Ring storage plus explicit size so full and empty are unambiguous.
struct Ring {
    slots: Vec<Option<Task>>,
    front: usize,
    size: usize,
}

impl Ring {
    fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            front: 0,
            size: 0,
        }
    }

    fn push(&mut self, task: Task) {
        debug_assert!(self.size < self.slots.len());
        let rear = (self.front + self.size) % self.slots.len();
        self.slots[rear] = Some(task);
        self.size += 1;
    }

    fn pop(&mut self) -> Option<Task> {
        if self.size == 0 {
            return None;
        }
        let task = self.slots[self.front].take();
        self.front = (self.front + 1) % self.slots.len();
        self.size -= 1;
        task
    }

    /// Double the storage, re-packing queued tasks from slot zero.
    fn grow(&mut self) -> Result<(), SortError> {
        let old_cap = self.slots.len();
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(old_cap * 2)
            .map_err(|_| SortError::AllocationFailure)?;
        slots.resize_with(old_cap * 2, || None);
        for offset in 0..self.size {
            slots[offset] = self.slots[(self.front + offset) % old_cap].take();
        }
        self.slots = slots;
        self.front = 0;
        Ok(())
    }
}

/// Bounded FIFO of tasks shared by the caller and every worker.
///
/// One mutex guards the ring; two condvars turn full/empty polling into
/// blocking waits. Each wait re-checks its predicate in a loop, so spurious
/// wakeups are harmless and no wakeup is lost.
pub struct TaskQueue {
    ring: Mutex<Ring>,
    not_full: Condvar,
    not_empty: Condvar,
    capacity: usize,
}

impl TaskQueue {
    /// Create a queue with the given nominal capacity (at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ring: Mutex::new(Ring::new(capacity)),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            capacity,
        }
    }

    /// Insert a task, blocking while the queue is at capacity.
    ///
    /// Wakes one waiting consumer.
    pub fn enqueue(&self, task: Task) {
        let mut ring = self.ring.lock().unwrap();
        while ring.size >= self.capacity {
            ring = self.not_full.wait(ring).unwrap();
        }
        ring.push(task);
        self.not_empty.notify_one();
    }

    /// Insert a task without ever blocking, growing the ring if needed.
    ///
    /// A worker is a producer the queue depends on for draining, so worker
    /// enqueues must not wait for space. This is the documented overflow
    /// route that keeps a full queue from deadlocking the pool.
    pub fn enqueue_from_worker(&self, task: Task) -> Result<(), SortError> {
        let mut ring = self.ring.lock().unwrap();
        if ring.size == ring.slots.len() {
            ring.grow()?;
        }
        ring.push(task);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Insert both children of a split without blocking.
    ///
    /// Reserves space for the pair up front so a split is all-or-nothing.
    pub fn enqueue_split(&self, first: Task, second: Task) -> Result<(), SortError> {
        let mut ring = self.ring.lock().unwrap();
        while ring.slots.len() - ring.size < 2 {
            ring.grow()?;
        }
        ring.push(first);
        ring.push(second);
        self.not_empty.notify_one();
        self.not_empty.notify_one();
        Ok(())
    }

    /// Remove a task, blocking while the queue is empty.
    ///
    /// Wakes one waiting producer. Ownership of the task transfers to the
    /// caller.
    pub fn dequeue(&self) -> Task {
        let mut ring = self.ring.lock().unwrap();
        loop {
            if let Some(task) = ring.pop() {
                self.not_full.notify_one();
                return task;
            }
            ring = self.not_empty.wait(ring).unwrap();
        }
    }

    /// Number of tasks currently queued.
    pub fn len(&self) -> usize {
        self.ring.lock().unwrap().size
    }

    /// Whether the queue is currently empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Nominal capacity enforced on blocking enqueues.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
