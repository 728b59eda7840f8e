#![forbid(unsafe_code)]

//! Lazily recomputed prefix sums over a caller-supplied function.
//!
//! [`AccumulationCache`] keeps `P[i] = f(0) + ... + f(i)` for a growing
//! prefix of indices. Callers mark indices whose `f` value may have changed
//! with [`invalidate`](AccumulationCache::invalidate); nothing is recomputed
//! until a query reaches that depth.
//!
//! # Invariants
//!
//! 1. Dirty indices are served smallest-first, because `P[m]` depends on
//!    `P[m - 1]`.
//! 2. When a recomputed `P[m]` differs from the cached value, every cached
//!    sum after `m` is dropped and rebuilt on demand.
//! 3. Below the smallest dirty index, cached sums always equal what
//!    recomputation from `f` would produce.
//!
//! # Preconditions
//!
//! `f` is only called at the current frontier or at an index that was
//! previously valid, so it need not be total. [`lookup`] additionally needs
//! `f(i) >= 0` for every index it touches and a reachable target; otherwise
//! it keeps extending the table.
//!
//! [`lookup`]: AccumulationCache::lookup

use std::fmt;
use std::ops::{Add, Range};

use crate::pq::IndexedPriorityQueue;

/// Prefix-sum table with lazy, smallest-first invalidation.
pub struct AccumulationCache<V, F> {
    sums: Vec<V>,
    dirty: IndexedPriorityQueue<usize, usize>,
    func: F,
}

impl<V: fmt::Debug, F> fmt::Debug for AccumulationCache<V, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccumulationCache")
            .field("sums", &self.sums)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

impl<V, F> AccumulationCache<V, F>
where
    V: Copy + Default + PartialOrd + Add<Output = V>,
    F: Fn(usize) -> V,
{
    /// Create an empty cache over `func`.
    pub fn new(func: F) -> Self {
        Self {
            sums: Vec::new(),
            dirty: IndexedPriorityQueue::min(),
            func,
        }
    }

    /// Number of cached prefix sums (valid or dirty).
    #[must_use]
    pub fn cached_len(&self) -> usize {
        self.sums.len()
    }

    /// Number of indices waiting for recomputation.
    #[must_use]
    pub fn dirty_len(&self) -> usize {
        self.dirty.len()
    }

    /// Sum of `f(0..=i)`.
    pub fn get_partial_sum(&mut self, i: usize) -> V {
        loop {
            let n = self.sums.len();
            match self.dirty.peek_priority().copied() {
                None => {
                    if i < n {
                        return self.sums[i];
                    }
                    let v = self.before(n) + (self.func)(n);
                    self.sums.push(v);
                }
                Some(m) if m < n => {
                    if i < m {
                        return self.sums[i];
                    }
                    self.refresh(m);
                }
                Some(_) => self.dirty.clear(),
            }
        }
    }

    /// Mark index `i` as possibly stale.
    pub fn invalidate(&mut self, i: usize) {
        self.invalidate_range(i..i.saturating_add(1));
    }

    /// Mark every index in `range` as possibly stale.
    ///
    /// Indices past the cached frontier are ignored; they will be computed
    /// fresh when first reached.
    pub fn invalidate_range(&mut self, range: Range<usize>) {
        let end = range.end.min(self.sums.len());
        for i in range.start..end {
            self.dirty.insert(i, i);
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(start = range.start, end, "acache invalidate");
    }

    /// Drop every cached sum at or after `i`.
    pub fn truncate(&mut self, i: usize) {
        self.sums.truncate(i);
        if self.dirty.peek_priority().is_some_and(|&m| m >= i) {
            self.dirty.clear();
        }
    }

    /// Drop the whole table.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Smallest `i` with `get_partial_sum(i) >= target`.
    pub fn lookup(&mut self, target: V) -> usize {
        let valid = loop {
            let n = self.sums.len();
            match self.dirty.peek_priority().copied() {
                None => {
                    if target <= self.before(n) {
                        break n;
                    }
                    let v = self.before(n) + (self.func)(n);
                    self.sums.push(v);
                }
                Some(m) if m < n => {
                    if target <= self.before(m) {
                        break m;
                    }
                    self.refresh(m);
                }
                Some(_) => self.dirty.clear(),
            }
        };
        self.sums[..valid].partition_point(|&v| v < target)
    }

    /// `P[i - 1]`, or zero at the start of the table.
    fn before(&self, i: usize) -> V {
        if i == 0 { V::default() } else { self.sums[i - 1] }
    }

    /// Recompute dirty index `m` (the smallest one) in place.
    fn refresh(&mut self, m: usize) {
        self.dirty.remove(&m);
        let v = self.before(m) + (self.func)(m);
        if self.sums[m] != v {
            self.sums[m] = v;
            self.truncate(m + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    struct Table {
        data: Rc<RefCell<Vec<i64>>>,
        cache: AccumulationCache<i64, Box<dyn Fn(usize) -> i64>>,
    }

    impl Table {
        fn new(values: &[i64]) -> Self {
            let data = Rc::new(RefCell::new(values.to_vec()));
            let source = Rc::clone(&data);
            let func: Box<dyn Fn(usize) -> i64> = Box::new(move |i| source.borrow()[i]);
            Self {
                data,
                cache: AccumulationCache::new(func),
            }
        }

        fn set(&mut self, i: usize, v: i64) {
            self.data.borrow_mut()[i] = v;
            self.cache.invalidate(i);
        }
    }

    #[test]
    fn partial_sums_follow_edits() {
        let mut t = Table::new(&[2, 3, 4, 5, 6, 7]);
        assert_eq!(t.cache.get_partial_sum(5), 27);

        t.set(3, 10);
        assert_eq!(t.cache.get_partial_sum(5), 32);

        t.set(3, 4);
        t.cache.truncate(4);
        assert_eq!(t.cache.get_partial_sum(5), 26);

        t.set(3, 5);
        assert_eq!(t.cache.get_partial_sum(5), 27);
    }

    #[test]
    fn query_below_dirty_index_does_not_recompute() {
        let calls = Rc::new(Cell::new(0usize));
        let counter = Rc::clone(&calls);
        let mut cache = AccumulationCache::new(move |i: usize| {
            counter.set(counter.get() + 1);
            i as u64
        });
        assert_eq!(cache.get_partial_sum(9), 45);
        assert_eq!(calls.get(), 10);

        cache.invalidate_range(5..7);
        assert_eq!(cache.dirty_len(), 2);
        assert_eq!(cache.get_partial_sum(3), 6);
        assert_eq!(calls.get(), 10);

        // Unchanged values keep the tail cached.
        assert_eq!(cache.get_partial_sum(9), 45);
        assert_eq!(calls.get(), 12);
        assert_eq!(cache.cached_len(), 10);
    }

    #[test]
    fn invalidate_past_frontier_is_ignored() {
        let mut t = Table::new(&[1, 1, 1, 1]);
        assert_eq!(t.cache.get_partial_sum(1), 2);
        t.cache.invalidate_range(2..10);
        assert_eq!(t.cache.dirty_len(), 0);
        assert_eq!(t.cache.get_partial_sum(3), 4);
    }

    #[test]
    fn truncate_clears_dirty_beyond_cut() {
        let mut t = Table::new(&[1, 2, 3, 4]);
        assert_eq!(t.cache.get_partial_sum(3), 10);
        t.set(2, 30);
        t.cache.truncate(1);
        assert_eq!(t.cache.dirty_len(), 0);
        assert_eq!(t.cache.cached_len(), 1);
        assert_eq!(t.cache.get_partial_sum(3), 37);
    }

    #[test]
    fn clear_recomputes_from_scratch() {
        let mut t = Table::new(&[5, 5]);
        assert_eq!(t.cache.get_partial_sum(1), 10);
        t.data.borrow_mut()[0] = 1;
        t.cache.clear();
        assert_eq!(t.cache.get_partial_sum(1), 6);
    }

    #[test]
    fn lookup_finds_first_prefix_reaching_target() {
        let mut t = Table::new(&[2, 0, 3, 1, 4]);
        // prefix sums: 2 2 5 6 10
        assert_eq!(t.cache.lookup(0), 0);
        assert_eq!(t.cache.lookup(1), 0);
        assert_eq!(t.cache.lookup(2), 0);
        assert_eq!(t.cache.lookup(3), 2);
        assert_eq!(t.cache.lookup(6), 3);
        assert_eq!(t.cache.lookup(7), 4);
        assert_eq!(t.cache.lookup(10), 4);
    }

    #[test]
    fn lookup_sees_invalidated_values() {
        let mut t = Table::new(&[1, 1, 1, 1, 1]);
        assert_eq!(t.cache.lookup(5), 4);
        t.set(1, 3);
        // prefix sums: 1 4 5 6 7
        assert_eq!(t.cache.lookup(4), 1);
        assert_eq!(t.cache.lookup(5), 2);
        assert_eq!(t.cache.get_partial_sum(4), 7);
    }

    #[test]
    fn invalidating_the_last_index_is_ignored() {
        let mut t = Table::new(&[1, 2]);
        assert_eq!(t.cache.get_partial_sum(1), 3);
        t.cache.invalidate(usize::MAX);
        assert_eq!(t.cache.dirty_len(), 0);
        assert_eq!(t.cache.get_partial_sum(1), 3);
    }
}
