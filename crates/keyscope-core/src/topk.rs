//! Bounded top-k tracker.
//!
//! Keeps the `k` largest records seen so far in a min-heap whose root is
//! the current weakest entry. A new record costs one comparison against
//! the root when it doesn't qualify, and O(log k) when it does.
//!
//! Ranking is by size descending. Among equal sizes the record offered
//! first ranks higher, and a later record never displaces an earlier one
//! of the same size.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::classify::KeyRecord;

/// Heap entry. Orders by size ascending, then offer sequence descending,
/// so `Reverse<Ranked>` puts the weakest entry at the root.
#[derive(Debug, Clone)]
struct Ranked {
    size: u64,
    seq: u64,
    record: KeyRecord,
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.size
            .cmp(&other.size)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

/// The `k` largest records offered so far.
#[derive(Debug, Clone)]
pub struct TopK {
    capacity: usize,
    heap: BinaryHeap<Reverse<Ranked>>,
    next_seq: u64,
}

impl TopK {
    /// Creates a tracker that retains at most `capacity` records.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            heap: BinaryHeap::with_capacity(capacity + 1),
            next_seq: 0,
        }
    }

    /// Offers a record. Returns `true` if it is now among the retained
    /// records.
    pub fn offer(&mut self, record: KeyRecord) -> bool {
        let seq = self.next_seq;
        self.next_seq += 1;

        if self.capacity == 0 {
            return false;
        }

        let entry = Ranked {
            size: record.size,
            seq,
            record,
        };

        if self.heap.len() < self.capacity {
            self.heap.push(Reverse(entry));
            return true;
        }

        match self.heap.peek() {
            Some(Reverse(weakest)) if entry > *weakest => {
                self.heap.pop();
                self.heap.push(Reverse(entry));
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Retained records, largest first.
    pub fn sorted(&self) -> Vec<KeyRecord> {
        let mut ranked: Vec<&Ranked> = self.heap.iter().map(|Reverse(r)| r).collect();
        ranked.sort_by(|a, b| b.cmp(a));
        ranked.into_iter().map(|r| r.record.clone()).collect()
    }
}
