//! Processed-message store error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from loading or appending to the durable processed-message store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read processed store '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write processed store '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Processed store '{path}' is not a JSON list of message ids: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode processed store: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Schema migration v{version} failed: {source}")]
    Migration {
        version: u32,
        #[source]
        source: rusqlite::Error,
    },
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
