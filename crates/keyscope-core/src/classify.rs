//! Data-type classification and size lookup for a single key.

use std::fmt;

use bytes::Bytes;

use crate::connection::ConnectionError;
use crate::store::KeyspaceStore;

/// The data types the big-key report tracks, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataType {
    String,
    List,
    Hash,
    Set,
    SortedSet,
}

impl DataType {
    /// Every tracked type, in the order reports print them.
    pub const ALL: [DataType; 5] = [
        DataType::String,
        DataType::List,
        DataType::Hash,
        DataType::Set,
        DataType::SortedSet,
    ];

    /// Maps a TYPE reply to a tracked type. Anything else (streams,
    /// module types, `none`) is `None`.
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(DataType::String),
            "list" => Some(DataType::List),
            "hash" => Some(DataType::Hash),
            "set" => Some(DataType::Set),
            "zset" => Some(DataType::SortedSet),
            _ => None,
        }
    }

    /// The name TYPE reports for this type.
    pub fn type_name(self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::List => "list",
            DataType::Hash => "hash",
            DataType::Set => "set",
            DataType::SortedSet => "zset",
        }
    }

    /// The command that returns this type's size metric.
    pub fn size_command(self) -> &'static str {
        match self {
            DataType::String => "STRLEN",
            DataType::List => "LLEN",
            DataType::Hash => "HLEN",
            DataType::Set => "SCARD",
            DataType::SortedSet => "ZCARD",
        }
    }

    /// Unit label for the size metric.
    pub fn unit(self) -> &'static str {
        match self {
            DataType::String => "bytes",
            DataType::List => "items",
            DataType::Hash => "fields",
            DataType::Set | DataType::SortedSet => "members",
        }
    }

    /// Index into per-type arrays laid out in [`DataType::ALL`] order.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Whether a zero size means the key is gone. The server reports 0
    /// for a missing collection, and empty collections can't exist.
    fn zero_means_missing(self) -> bool {
        !matches!(self, DataType::String)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A key and its size metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRecord {
    pub name: Bytes,
    pub size: u64,
}

/// Why a key could not be classified.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// The key was deleted or expired after SCAN returned it.
    #[error("key no longer exists")]
    Vanished,

    /// The key holds a type the report doesn't track.
    #[error("unsupported type '{0}'")]
    Unsupported(String),

    /// TYPE or the size command failed.
    #[error(transparent)]
    Store(#[from] ConnectionError),
}

/// Resolves the data type of `key` and measures it.
///
/// Issues TYPE, then the size command for that type. A key that
/// disappears between the two calls shows up as [`LookupError::Vanished`]
/// (or as a WRONGTYPE server error if it was recreated with another type).
pub async fn classify<S: KeyspaceStore>(
    store: &mut S,
    key: &[u8],
) -> Result<(DataType, u64), LookupError> {
    let type_name = store.key_type(key).await?;
    if type_name == "none" {
        return Err(LookupError::Vanished);
    }
    let data_type =
        DataType::from_type_name(&type_name).ok_or(LookupError::Unsupported(type_name))?;

    let size = store.key_size(key, data_type).await?;
    if size == 0 && data_type.zero_means_missing() {
        return Err(LookupError::Vanished);
    }

    Ok((data_type, size))
}
