//! Keyspace walker for the big-key report.
//!
//! Drives SCAN from cursor 0 until the server hands back 0 again,
//! classifying each key as it arrives and folding it into its type's
//! bucket. Nothing is kept per key beyond the bucket's top-k, so memory
//! stays at O(types × k) plus one SCAN page regardless of keyspace size.
//!
//! Failure policy:
//! - a failed SCAN call ends the walk; what was gathered so far is kept
//!   and the report is marked as interrupted
//! - losing the connection while classifying a key ends the walk the same
//!   way, since every later lookup would fail too
//! - a key the server refuses to classify is skipped, unless strict mode
//!   is on, in which case the walk stops at that key
//! - keys of untracked types are counted as scanned and otherwise ignored

use std::collections::BTreeMap;
use std::time::Instant;

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::classify::{classify, DataType, KeyRecord, LookupError};
use crate::connection::ConnectionError;
use crate::stats::TypeBucket;
use crate::store::KeyspaceStore;

/// Tuning for one walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Glob passed to SCAN MATCH.
    pub pattern: String,
    /// SCAN COUNT hint. Advisory; the server may return more or fewer.
    pub batch_size: usize,
    /// How many keys to retain per type.
    pub top_n: usize,
    /// Stop at the first key that can't be classified.
    pub strict: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            pattern: "*".into(),
            batch_size: 1000,
            top_n: 10,
            strict: false,
        }
    }
}

/// How the walk ended.
#[derive(Debug)]
pub enum ScanOutcome {
    /// The cursor came back to 0.
    Complete,
    /// A SCAN call failed, or the connection dropped while its keys were
    /// being classified. `cursor` is the position that batch requested.
    BatchFailed {
        cursor: u64,
        error: ConnectionError,
    },
    /// Strict mode stopped at a key that couldn't be classified.
    KeyFailed { key: Bytes, error: LookupError },
}

impl ScanOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, ScanOutcome::Complete)
    }
}

/// Everything a walk produced.
#[derive(Debug)]
pub struct ScanReport {
    /// One bucket per tracked type, in [`DataType::ALL`] order.
    pub buckets: Vec<TypeBucket>,
    /// Every key SCAN returned, including skipped and untracked ones.
    pub total_scanned: u64,
    /// Keys that vanished or failed lookup and were skipped.
    pub skipped: u64,
    /// Keys of untracked types, by the type name the server reported.
    pub unrecognized: BTreeMap<String, u64>,
    /// Number of SCAN calls that returned successfully.
    pub batches: u64,
    pub outcome: ScanOutcome,
}

impl ScanReport {
    /// Creates an empty report with fresh buckets.
    pub fn new(top_n: usize) -> Self {
        Self {
            buckets: DataType::ALL
                .iter()
                .map(|&t| TypeBucket::new(t, top_n))
                .collect(),
            total_scanned: 0,
            skipped: 0,
            unrecognized: BTreeMap::new(),
            batches: 0,
            outcome: ScanOutcome::Complete,
        }
    }

    pub fn bucket(&self, data_type: DataType) -> &TypeBucket {
        &self.buckets[data_type.index()]
    }

    fn bucket_mut(&mut self, data_type: DataType) -> &mut TypeBucket {
        &mut self.buckets[data_type.index()]
    }

    /// Keys that landed in a tracked bucket.
    pub fn total_recognized(&self) -> u64 {
        self.buckets.iter().map(|b| b.stats.count).sum()
    }

    pub fn total_unrecognized(&self) -> u64 {
        self.unrecognized.values().sum()
    }
}

/// Walks a keyspace and builds a [`ScanReport`].
#[derive(Debug, Clone, Default)]
pub struct BigKeyScanner {
    options: ScanOptions,
}

impl BigKeyScanner {
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    /// Runs one full walk over `store`.
    ///
    /// Never fails outright. A lost connection or a strict-mode abort is
    /// reported through [`ScanReport::outcome`] alongside whatever was
    /// gathered before it.
    pub async fn run<S: KeyspaceStore>(&self, store: &mut S) -> ScanReport {
        let opts = &self.options;
        let started = Instant::now();
        let mut report = ScanReport::new(opts.top_n);
        let mut cursor = 0u64;

        'walk: loop {
            let batch = match store.scan(cursor, &opts.pattern, opts.batch_size).await {
                Ok(batch) => batch,
                Err(error) => {
                    warn!(cursor, batches = report.batches, %error, "scan interrupted");
                    report.outcome = ScanOutcome::BatchFailed { cursor, error };
                    break;
                }
            };
            report.batches += 1;
            debug!(
                cursor,
                next = batch.cursor,
                keys = batch.keys.len(),
                "scan batch"
            );

            for key in batch.keys {
                report.total_scanned += 1;

                match classify(store, &key).await {
                    Ok((data_type, size)) => {
                        report
                            .bucket_mut(data_type)
                            .observe(KeyRecord { name: key, size });
                    }
                    Err(LookupError::Unsupported(type_name)) => {
                        *report.unrecognized.entry(type_name).or_insert(0) += 1;
                    }
                    Err(LookupError::Store(error)) if error.is_transport() => {
                        warn!(
                            cursor,
                            key = %String::from_utf8_lossy(&key),
                            %error,
                            "connection lost during batch"
                        );
                        report.outcome = ScanOutcome::BatchFailed { cursor, error };
                        break 'walk;
                    }
                    Err(error) if opts.strict => {
                        warn!(key = %String::from_utf8_lossy(&key), %error, "strict scan stopped");
                        report.outcome = ScanOutcome::KeyFailed { key, error };
                        return report;
                    }
                    Err(error) => {
                        debug!(key = %String::from_utf8_lossy(&key), %error, "skipping key");
                        report.skipped += 1;
                    }
                }
            }

            cursor = batch.cursor;
            if cursor == 0 {
                break;
            }
        }

        info!(
            scanned = report.total_scanned,
            skipped = report.skipped,
            batches = report.batches,
            elapsed_ms = started.elapsed().as_millis() as u64,
            complete = report.outcome.is_complete(),
            "big-key scan finished"
        );
        report
    }
}
