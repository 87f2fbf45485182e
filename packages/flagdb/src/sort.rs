//! In-place comparison sort over index-addressed sequences.
//!
//! Stores implement [`SortableSeq`] (length, compare-by-index,
//! swap-by-index) and [`sort`] reorders them without knowing how elements
//! are stored. Every comparison and exchange may hit the disk, so each
//! callback returns `Result` and the first failure aborts the sort.
//!
//! The algorithm is an introsort: median-of-three quicksort, heapsort once
//! the recursion depth budget runs out, insertion sort for short ranges.
//! Not stable.

use crate::error::Result;

/// Ranges at or below this length are finished with insertion sort.
const INSERTION_THRESHOLD: u64 = 12;

/// A sequence that can be sorted through index-based access.
pub trait SortableSeq {
    /// Number of elements.
    fn seq_len(&mut self) -> Result<u64>;

    /// Whether element `i` orders strictly before element `j`.
    fn less(&mut self, i: u64, j: u64) -> Result<bool>;

    /// Exchange elements `i` and `j`.
    fn swap(&mut self, i: u64, j: u64) -> Result<()>;
}

/// Whether no element is less than its predecessor.
pub fn is_sorted<S: SortableSeq + ?Sized>(seq: &mut S) -> Result<bool> {
    let n = seq.seq_len()?;
    for i in 1..n {
        if seq.less(i, i - 1)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Sort `seq` in place.
///
/// An already sorted sequence is detected up front and left untouched, so
/// sorting is idempotent on the underlying bytes even with equal elements.
pub fn sort<S: SortableSeq + ?Sized>(seq: &mut S) -> Result<()> {
    let n = seq.seq_len()?;
    if n < 2 || is_sorted(seq)? {
        return Ok(());
    }
    introsort(seq, 0, n, depth_limit(n))
}

/// 2 * floor(log2(n)) + 2
fn depth_limit(n: u64) -> u32 {
    2 * (u64::BITS - n.leading_zeros())
}

fn introsort<S: SortableSeq + ?Sized>(
    seq: &mut S,
    mut lo: u64,
    mut hi: u64,
    mut depth: u32,
) -> Result<()> {
    while hi - lo > INSERTION_THRESHOLD {
        if depth == 0 {
            return heapsort(seq, lo, hi);
        }
        depth -= 1;

        let p = partition(seq, lo, hi)?;
        // Recurse into the smaller side, loop on the larger one.
        if p - lo < hi - p - 1 {
            introsort(seq, lo, p, depth)?;
            lo = p + 1;
        } else {
            introsort(seq, p + 1, hi, depth)?;
            hi = p;
        }
    }
    insertion_sort(seq, lo, hi)
}

/// Order `a`, `b`, `c` so that `b` holds the median.
fn median_of_three<S: SortableSeq + ?Sized>(seq: &mut S, a: u64, b: u64, c: u64) -> Result<()> {
    if seq.less(b, a)? {
        seq.swap(a, b)?;
    }
    if seq.less(c, b)? {
        seq.swap(b, c)?;
        if seq.less(b, a)? {
            seq.swap(a, b)?;
        }
    }
    Ok(())
}

/// Lomuto partition around the median of the first, middle and last
/// elements. Returns the pivot's final index.
fn partition<S: SortableSeq + ?Sized>(seq: &mut S, lo: u64, hi: u64) -> Result<u64> {
    let last = hi - 1;
    let mid = lo + (hi - lo) / 2;
    median_of_three(seq, lo, mid, last)?;

    // The comparison oracle works on positions, so the pivot has to live
    // at a fixed index for the whole pass.
    seq.swap(mid, last)?;
    let pivot = last;

    let mut store = lo;
    for i in lo..pivot {
        if seq.less(i, pivot)? {
            if i != store {
                seq.swap(i, store)?;
            }
            store += 1;
        }
    }
    if store != pivot {
        seq.swap(store, pivot)?;
    }
    Ok(store)
}

fn insertion_sort<S: SortableSeq + ?Sized>(seq: &mut S, lo: u64, hi: u64) -> Result<()> {
    for i in lo + 1..hi {
        let mut j = i;
        while j > lo && seq.less(j, j - 1)? {
            seq.swap(j, j - 1)?;
            j -= 1;
        }
    }
    Ok(())
}

fn heapsort<S: SortableSeq + ?Sized>(seq: &mut S, lo: u64, hi: u64) -> Result<()> {
    let n = hi - lo;
    for root in (0..n / 2).rev() {
        sift_down(seq, lo, root, n)?;
    }
    for end in (1..n).rev() {
        seq.swap(lo, lo + end)?;
        sift_down(seq, lo, 0, end)?;
    }
    Ok(())
}

/// Max-heap sift over the heap stored at `lo..lo + end`.
fn sift_down<S: SortableSeq + ?Sized>(seq: &mut S, lo: u64, mut root: u64, end: u64) -> Result<()> {
    loop {
        let mut child = 2 * root + 1;
        if child >= end {
            return Ok(());
        }
        if child + 1 < end && seq.less(lo + child, lo + child + 1)? {
            child += 1;
        }
        if !seq.less(lo + root, lo + child)? {
            return Ok(());
        }
        seq.swap(lo + root, lo + child)?;
        root = child;
    }
}
