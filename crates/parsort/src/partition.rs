//! Partitioning
//!
//! The pure divide-and-conquer step: median-of-three partition with an
//! insertion-sort base case. No locking here; the caller owns its range.

/// Default range length below which insertion sort takes over.
pub const DEFAULT_INSERTION_THRESHOLD: usize = 10;

/// Outcome of one divide-and-conquer step over `[lo, hi]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The range was small enough to sort in place; it is now final.
    Finished { lo: usize, hi: usize },
    /// The range was partitioned into two disjoint inclusive subranges that
    /// tile it exactly.
    Split {
        left: (usize, usize),
        right: (usize, usize),
    },
}

/// In-place insertion sort of `a[lo..=hi]`.
pub fn insertion_sort(a: &mut [f64], lo: usize, hi: usize) {
    for i in (lo + 1)..=hi {
        let mut j = i;
        while j > lo && a[j - 1] > a[j] {
            a.swap(j - 1, j);
            j -= 1;
        }
    }
}

/// Median-of-three partition of `a[lo..=hi]`.
///
/// Orders `a[lo]`, `a[mid]`, `a[hi]` so the median lands in the middle,
/// parks the pivot next to `hi`, then runs two inward scans that swap
/// out-of-place pairs until they cross. Returns `i` with
/// `a[lo..i] <= pivot`, `a[i..=hi] >= pivot`, and `lo < i <= hi`, so both
/// subranges are strictly smaller than the parent. Requires `hi - lo >= 2`.
pub fn partition(a: &mut [f64], lo: usize, hi: usize) -> usize {
    debug_assert!(hi < a.len() && hi - lo >= 2);
    let mid = lo + (hi - lo) / 2;

    if a[mid] < a[lo] {
        a.swap(mid, lo);
    }
    if a[hi] < a[mid] {
        a.swap(hi, mid);
    }
    if a[mid] < a[lo] {
        a.swap(mid, lo);
    }

    // a[lo] and a[hi] now bound the pivot and act as scan sentinels.
    a.swap(mid, hi - 1);
    let pivot = a[hi - 1];

    let mut i = lo;
    let mut j = hi - 1;
    loop {
        loop {
            i += 1;
            if a[i] >= pivot {
                break;
            }
        }
        loop {
            j -= 1;
            if a[j] <= pivot {
                break;
            }
        }
        if i >= j {
            break;
        }
        a.swap(i, j);
    }
    a.swap(i, hi - 1);
    i
}

/// One divide-and-conquer step: finish small ranges in place, split the rest.
///
/// The threshold is clamped to at least 2 so that any range reaching
/// `partition` meets its `hi - lo >= 2` minimum.
pub fn advance(a: &mut [f64], lo: usize, hi: usize, threshold: usize) -> Step {
    let threshold = threshold.max(2);
    if hi - lo < threshold {
        insertion_sort(a, lo, hi);
        Step::Finished { lo, hi }
    } else {
        let i = partition(a, lo, hi);
        Step::Split {
            left: (lo, i - 1),
            right: (i, hi),
        }
    }
}
