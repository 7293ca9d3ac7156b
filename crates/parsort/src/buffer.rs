//! Shared Sort Buffer
//!
//! Interior-mutable storage jointly owned by whichever tasks currently
//! reference disjoint subranges of it.

use std::cell::UnsafeCell;
use std::fmt;

/// The array being sorted, shared across the worker pool without a lock.
///
/// Workers only touch the subrange named by the task they are executing, and
/// the split contract keeps in-flight ranges disjoint, so the mutable slices
/// handed out by `range_mut` never alias.
pub struct SharedBuffer {
    data: Box<[UnsafeCell<f64>]>,
}

// Safe under the disjoint-range invariant enforced by the split contract.
unsafe impl Sync for SharedBuffer {}
unsafe impl Send for SharedBuffer {}

impl SharedBuffer {
    /// Wrap a vector for a sort run.
    pub fn from_vec(data: Vec<f64>) -> Self {
        Self {
            data: data
                .into_iter()
                .map(UnsafeCell::new)
                .collect::<Vec<_>>()
                .into_boxed_slice(),
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Recover the data once no tasks reference the buffer.
    pub fn into_vec(self) -> Vec<f64> {
        self.data
            .into_vec()
            .into_iter()
            .map(UnsafeCell::into_inner)
            .collect()
    }

    /// Copy the current contents.
    ///
    /// Only meaningful while no worker is mutating the buffer.
    pub fn snapshot(&self) -> Vec<f64> {
        self.data.iter().map(|cell| unsafe { *cell.get() }).collect()
    }

    /// Mutable view of the inclusive range `[lo, hi]`.
    ///
    /// # Safety
    ///
    /// The caller must hold the only live task naming any index in `[lo, hi]`.
    pub(crate) unsafe fn range_mut(&self, lo: usize, hi: usize) -> &mut [f64] {
        debug_assert!(lo <= hi && hi < self.data.len());
        let base = self.data[lo].get();
        std::slice::from_raw_parts_mut(base, hi - lo + 1)
    }
}

impl fmt::Debug for SharedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedBuffer")
            .field("len", &self.len())
            .finish()
    }
}
