//! Per-type running totals and the bucket that pairs them with a top-k.

use crate::classify::{DataType, KeyRecord};
use crate::topk::TopK;

/// Running count and size total for one data type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeStats {
    pub count: u64,
    pub total_size: u64,
}

impl TypeStats {
    pub fn record(&mut self, size: u64) {
        self.count += 1;
        self.total_size = self.total_size.saturating_add(size);
    }

    /// Mean size, or `None` before the first key.
    pub fn average(&self) -> Option<f64> {
        (self.count > 0).then(|| self.total_size as f64 / self.count as f64)
    }

    /// Share of `total_scanned` keys that are of this type, in percent.
    pub fn percentage(&self, total_scanned: u64) -> Option<f64> {
        (total_scanned > 0).then(|| self.count as f64 * 100.0 / total_scanned as f64)
    }
}

/// Everything the scan learns about one data type.
#[derive(Debug, Clone)]
pub struct TypeBucket {
    pub data_type: DataType,
    pub top: TopK,
    pub stats: TypeStats,
}

impl TypeBucket {
    pub fn new(data_type: DataType, top_n: usize) -> Self {
        Self {
            data_type,
            top: TopK::new(top_n),
            stats: TypeStats::default(),
        }
    }

    /// Counts the key and offers it to the top-k. Every key reaches the
    /// totals, retained or not.
    pub fn observe(&mut self, record: KeyRecord) {
        self.stats.record(record.size);
        self.top.offer(record);
    }
}
