//! Sort Tasks
//!
//! Work units flowing through the bounded queue. Each task is an owned
//! value: the queue owns it until dequeue, then the executing worker does.

use crate::buffer::SharedBuffer;
use std::fmt;
use std::sync::Arc;

/// A unit of work delivered to exactly one worker.
pub enum Task {
    /// Sort the inclusive range `[lo, hi]` of the shared buffer.
    SortRange {
        buffer: Arc<SharedBuffer>,
        lo: usize,
        hi: usize,
    },
    /// Report that `[lo, hi]` has been finalized by the base case.
    RangeComplete { lo: usize, hi: usize },
    /// Sentinel that makes the receiving worker exit its loop.
    Shutdown,
}

impl Task {
    /// Short tag for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SortRange { .. } => "sort-range",
            Self::RangeComplete { .. } => "range-complete",
            Self::Shutdown => "shutdown",
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SortRange { lo, hi, .. } => f
                .debug_struct("SortRange")
                .field("lo", lo)
                .field("hi", hi)
                .finish(),
            Self::RangeComplete { lo, hi } => f
                .debug_struct("RangeComplete")
                .field("lo", lo)
                .field("hi", hi)
                .finish(),
            Self::Shutdown => write!(f, "Shutdown"),
        }
    }
}
