//! Completion Tracking
//!
//! Guarded counter that lets the caller block until the whole array has been
//! reported sorted, replacing ad hoc polling of a shared total.

use crate::SortError;
use std::sync::{Condvar, Mutex};

#[derive(Debug, Default)]
struct State {
    completed: usize,
    target: usize,
    fault: Option<String>,
}

/// Monotonic count of finalized elements plus the target to reach.
///
/// The counter never decreases; reaching the target is the single "done"
/// signal for a run. An over-report or a recorded worker fault wakes the
/// waiter with an error instead of hanging the caller.
#[derive(Debug, Default)]
pub struct CompletionTracker {
    state: Mutex<State>,
    done: Condvar,
}

impl CompletionTracker {
    /// Create an idle tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the tracker for a run over `target` elements.
    pub fn begin(&self, target: usize) {
        let mut state = self.state.lock().unwrap();
        state.completed = 0;
        state.target = target;
        state.fault = None;
    }

    /// Record `n` more finalized elements.
    pub fn report(&self, n: usize) {
        let mut state = self.state.lock().unwrap();
        state.completed += n;
        if state.completed > state.target && state.fault.is_none() {
            let message = format!(
                "completion count {} overran target {}",
                state.completed, state.target
            );
            tracing::warn!("worker fault recorded: {}", message);
            state.fault = Some(message);
        }
        if state.completed >= state.target {
            self.done.notify_all();
        }
    }

    /// Record the first fault observed and wake the waiter.
    pub fn record_fault(&self, message: impl Into<String>) {
        let mut state = self.state.lock().unwrap();
        if state.fault.is_none() {
            let message = message.into();
            tracing::warn!("worker fault recorded: {}", message);
            state.fault = Some(message);
        }
        self.done.notify_all();
    }

    /// Whether a fault has been recorded for the current run.
    pub fn is_faulted(&self) -> bool {
        self.state.lock().unwrap().fault.is_some()
    }

    /// Block until every element has been reported, returning the total.
    pub fn await_completion(&self) -> Result<usize, SortError> {
        let mut state = self.state.lock().unwrap();
        while state.completed < state.target && state.fault.is_none() {
            state = self.done.wait(state).unwrap();
        }
        match &state.fault {
            Some(message) => Err(SortError::WorkerFault(message.clone())),
            None => Ok(state.completed),
        }
    }
}
