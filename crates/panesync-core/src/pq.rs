#![forbid(unsafe_code)]

//! Binary heap with O(1) membership lookup and O(log n) update by identity.
//!
//! # Design
//!
//! Entries live in a 0-based array heap. A side map from item identity to
//! its current heap slot is rewritten on every swap, so `remove` and
//! re-`insert` of an existing item never scan the heap.
//!
//! ```text
//!            slot 0 (extreme)
//!           /                \
//!       slot 1              slot 2
//!      /      \            /
//!  slot 3   slot 4     slot 5        index: item -> slot
//! ```
//!
//! # Invariants
//!
//! 1. `index[heap[s].item] == s` for every occupied slot `s`.
//! 2. Every item appears at most once (re-inserting replaces its priority).
//! 3. No child outranks its parent under the configured [`Orientation`].
//!
//! Ties between equal priorities are broken arbitrarily; callers must not
//! depend on the order in which equal-priority items pop.

use std::fmt;
use std::hash::Hash;

use rustc_hash::FxHashMap;

/// Which end of the priority order is served first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// Largest priority pops first.
    #[default]
    Max,
    /// Smallest priority pops first.
    Min,
}

/// Errors raised by queue operations that need a non-empty queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// `pop` was called on an empty queue.
    #[error("priority queue is empty")]
    Empty,
}

#[derive(Debug, Clone)]
struct Entry<P, T> {
    priority: P,
    item: T,
}

/// Priority queue keyed by item identity.
pub struct IndexedPriorityQueue<P, T> {
    heap: Vec<Entry<P, T>>,
    index: FxHashMap<T, usize>,
    orientation: Orientation,
}

impl<P: fmt::Debug, T: fmt::Debug> fmt::Debug for IndexedPriorityQueue<P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexedPriorityQueue")
            .field("orientation", &self.orientation)
            .field(
                "entries",
                &self
                    .heap
                    .iter()
                    .map(|e| (&e.priority, &e.item))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<P: Ord, T: Eq + Hash + Clone> Default for IndexedPriorityQueue<P, T> {
    fn default() -> Self {
        Self::max()
    }
}

impl<P: Ord, T: Eq + Hash + Clone> IndexedPriorityQueue<P, T> {
    /// Create an empty queue that serves the largest priority first.
    #[must_use]
    pub fn max() -> Self {
        Self::with_orientation(Orientation::Max)
    }

    /// Create an empty queue that serves the smallest priority first.
    #[must_use]
    pub fn min() -> Self {
        Self::with_orientation(Orientation::Min)
    }

    /// Create an empty queue with the given orientation.
    #[must_use]
    pub fn with_orientation(orientation: Orientation) -> Self {
        Self {
            heap: Vec::new(),
            index: FxHashMap::default(),
            orientation,
        }
    }

    /// The orientation this queue was built with.
    #[must_use]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Number of live items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// True when no items are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drop every item.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.index.clear();
    }

    /// True when `item` is queued.
    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.index.contains_key(item)
    }

    /// Current priority of `item`, if queued.
    #[must_use]
    pub fn priority_of(&self, item: &T) -> Option<&P> {
        self.index.get(item).map(|&slot| &self.heap[slot].priority)
    }

    /// Priority of the item that would pop next.
    #[must_use]
    pub fn peek_priority(&self) -> Option<&P> {
        self.heap.first().map(|e| &e.priority)
    }

    /// Item that would pop next.
    #[must_use]
    pub fn peek_item(&self) -> Option<&T> {
        self.heap.first().map(|e| &e.item)
    }

    /// Queue `item` with `priority`, replacing its priority if already queued.
    pub fn insert(&mut self, priority: P, item: T) {
        if let Some(&slot) = self.index.get(&item) {
            self.heap[slot].priority = priority;
            let slot = self.sift_up(slot);
            self.sift_down(slot);
            return;
        }
        let slot = self.heap.len();
        self.index.insert(item.clone(), slot);
        self.heap.push(Entry { priority, item });
        self.sift_up(slot);
    }

    /// Remove and return the item of extreme priority.
    pub fn pop(&mut self) -> Result<T, QueueError> {
        self.remove_slot(0)
            .map(|entry| entry.item)
            .ok_or(QueueError::Empty)
    }

    /// Remove `item` if queued, returning its priority.
    pub fn remove(&mut self, item: &T) -> Option<P> {
        let slot = *self.index.get(item)?;
        self.remove_slot(slot).map(|entry| entry.priority)
    }

    /// Iterate queued `(priority, item)` pairs in heap order (not sorted).
    pub fn iter(&self) -> impl Iterator<Item = (&P, &T)> {
        self.heap.iter().map(|e| (&e.priority, &e.item))
    }

    fn remove_slot(&mut self, slot: usize) -> Option<Entry<P, T>> {
        let last = self.heap.len().checked_sub(1)?;
        self.swap(slot, last);
        let removed = self.heap.pop()?;
        self.index.remove(&removed.item);
        if slot < self.heap.len() {
            let slot = self.sift_up(slot);
            self.sift_down(slot);
        }
        Some(removed)
    }

    /// True when `a` should be served before `b`.
    fn outranks(&self, a: &P, b: &P) -> bool {
        match self.orientation {
            Orientation::Max => a > b,
            Orientation::Min => a < b,
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.heap.swap(a, b);
        if let Some(slot) = self.index.get_mut(&self.heap[a].item) {
            *slot = a;
        }
        if let Some(slot) = self.index.get_mut(&self.heap[b].item) {
            *slot = b;
        }
    }

    fn sift_up(&mut self, mut slot: usize) -> usize {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if !self.outranks(&self.heap[slot].priority, &self.heap[parent].priority) {
                break;
            }
            self.swap(slot, parent);
            slot = parent;
        }
        slot
    }

    fn sift_down(&mut self, mut slot: usize) {
        let n = self.heap.len();
        loop {
            let left = 2 * slot + 1;
            if left >= n {
                return;
            }
            let right = left + 1;
            let mut best = left;
            if right < n && self.outranks(&self.heap[right].priority, &self.heap[left].priority) {
                best = right;
            }
            if !self.outranks(&self.heap[best].priority, &self.heap[slot].priority) {
                return;
            }
            self.swap(slot, best);
            slot = best;
        }
    }

    #[cfg(test)]
    fn check_invariants(&self) {
        assert_eq!(self.heap.len(), self.index.len(), "index size mismatch");
        for (slot, entry) in self.heap.iter().enumerate() {
            assert_eq!(self.index.get(&entry.item), Some(&slot), "stale slot");
            if slot > 0 {
                let parent = (slot - 1) / 2;
                assert!(
                    !self.outranks(&entry.priority, &self.heap[parent].priority),
                    "heap order violated at slot {slot}"
                );
            }
        }
    }
}
