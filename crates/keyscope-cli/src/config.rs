//! Config file support.
//!
//! Settings are layered: built-in defaults, then an optional TOML file,
//! then CLI flags and `KEYSCOPE_*` environment variables.

use std::path::{Path, PathBuf};

use keyscope_core::{ConnectOptions, ScanOptions};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything that can be set from a config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeyscopeConfig {
    pub host: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Logical database to inspect.
    pub db: u32,
    /// SCAN MATCH glob.
    pub pattern: String,
    /// SCAN COUNT hint.
    pub count: usize,
    /// Keys to list per type in the big-key report.
    pub top: usize,
    /// Stop the big-key scan at the first key that can't be read.
    pub strict: bool,
}

impl Default for KeyscopeConfig {
    fn default() -> Self {
        let conn = ConnectOptions::default();
        let scan = ScanOptions::default();
        Self {
            host: conn.host,
            port: conn.port,
            password: None,
            db: conn.db,
            pattern: scan.pattern,
            count: scan.batch_size,
            top: scan.top_n,
            strict: scan.strict,
        }
    }
}

impl KeyscopeConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Rejects values the scanner can't work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top == 0 {
            return Err(ConfigError::Invalid("top must be at least 1".into()));
        }
        if self.count == 0 {
            return Err(ConfigError::Invalid("count must be at least 1".into()));
        }
        if self.pattern.is_empty() {
            return Err(ConfigError::Invalid("pattern must not be empty".into()));
        }
        Ok(())
    }

    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            host: self.host.clone(),
            port: self.port,
            password: self.password.clone().filter(|pw| !pw.is_empty()),
            db: self.db,
        }
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            pattern: self.pattern.clone(),
            batch_size: self.count,
            top_n: self.top,
            strict: self.strict,
        }
    }
}
