//! keyscope-core: the keyspace diagnostic engine.
//!
//! Walks a live store with cursor-based SCAN, classifies every key by
//! data type, and keeps a bounded top-N ranking plus running totals per
//! type in a single pass. Also parses the keyspace section of INFO and
//! the CLIENT LIST blob for the smaller reports.
//!
//! Everything that talks to the store goes through [`KeyspaceStore`],
//! so the walker can be driven by a live [`Connection`] or by an
//! in-memory fake in tests.

pub mod classify;
pub mod clients;
pub mod connection;
pub mod format;
pub mod keyspace;
pub mod report;
pub mod scanner;
pub mod stats;
pub mod store;
pub mod topk;

pub use classify::{classify, DataType, KeyRecord, LookupError};
pub use clients::{render_clients, tally_clients, ClientTally};
pub use connection::{ConnectOptions, Connection, ConnectionError};
pub use keyspace::{parse_keyspace_info, render_keyspace, DatabaseKeys};
pub use report::render_big_keys;
pub use scanner::{BigKeyScanner, ScanOptions, ScanOutcome, ScanReport};
pub use stats::{TypeBucket, TypeStats};
pub use store::{KeyspaceStore, ScanBatch};
pub use topk::TopK;
