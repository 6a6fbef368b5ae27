//! Error types
//!
//! Nothing in this crate is fatal: store and codec failures are reported
//! on a value's error channel and the value keeps working in memory.

use std::fmt;
use std::path::PathBuf;

use futures::task::SpawnError;
use thiserror::Error;

/// Failure of a key-value store operation
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backing store cannot be reached (offline, quota, no storage API)
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Filesystem failure in a file-backed store
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The store's backing file exists but does not parse
    #[error("store file {} is corrupt: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure to encode or decode a value
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct CodecError(pub String);

impl CodecError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        Self(err.to_string())
    }
}

/// Which store call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Get,
    Set,
    Remove,
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StoreOp::Get => "get",
            StoreOp::Set => "set",
            StoreOp::Remove => "remove",
        })
    }
}

/// Errors reported on a [`PersistentValue`](crate::PersistentValue)'s error channel
#[derive(Error, Debug)]
pub enum PersistError {
    /// The store could not complete a get/set/remove
    #[error("{op} of `{key}` failed: {source}")]
    StoreUnavailable {
        key: String,
        op: StoreOp,
        #[source]
        source: StoreError,
    },

    /// The stored string did not decode; the default was used instead
    #[error("stored value for `{key}` did not decode: {source}")]
    Deserialization {
        key: String,
        #[source]
        source: CodecError,
    },

    /// The current value could not be encoded; nothing was written
    #[error("value for `{key}` did not encode: {source}")]
    Serialization {
        key: String,
        #[source]
        source: CodecError,
    },

    /// The executor refused the load or write task
    #[error("could not schedule storage task for `{key}`: {source}")]
    Spawn {
        key: String,
        #[source]
        source: SpawnError,
    },
}

impl PersistError {
    /// Key of the value that reported the error
    pub fn key(&self) -> &str {
        match self {
            PersistError::StoreUnavailable { key, .. }
            | PersistError::Deserialization { key, .. }
            | PersistError::Serialization { key, .. }
            | PersistError::Spawn { key, .. } => key,
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;
