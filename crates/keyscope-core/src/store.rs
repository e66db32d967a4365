//! The store operations the reports need.
//!
//! [`Connection`](crate::Connection) implements this against a live
//! server. Tests implement it over an in-memory map.

use bytes::Bytes;

use crate::classify::DataType;
use crate::connection::ConnectionError;

/// One page of a cursor-based key scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanBatch {
    /// Cursor for the next call. `0` means iteration is complete.
    pub cursor: u64,
    /// Key names in this page. May be empty even when `cursor != 0`.
    pub keys: Vec<Bytes>,
}

/// Read-only access to a keyspace.
///
/// Calls are made one at a time from a single task; implementations
/// don't need to be shareable.
#[allow(async_fn_in_trait)]
pub trait KeyspaceStore {
    /// Fetches the next page of keys matching `pattern`, with `count` as
    /// an advisory page size.
    async fn scan(
        &mut self,
        cursor: u64,
        pattern: &str,
        count: usize,
    ) -> Result<ScanBatch, ConnectionError>;

    /// Returns the type name the server reports for `key`
    /// (`"none"` when the key does not exist).
    async fn key_type(&mut self, key: &[u8]) -> Result<String, ConnectionError>;

    /// Returns the size metric for `key` as a value of `data_type`.
    async fn key_size(&mut self, key: &[u8], data_type: DataType) -> Result<u64, ConnectionError>;

    /// Returns the raw text of an INFO section.
    async fn info(&mut self, section: &str) -> Result<String, ConnectionError>;

    /// Returns the raw CLIENT LIST text.
    async fn client_list(&mut self) -> Result<String, ConnectionError>;
}
