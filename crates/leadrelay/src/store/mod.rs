//! Durable storage for processed message ids.
//!
//! Stores are load-then-append: the full list is read once at startup and
//! new ids are appended afterwards. Nothing is ever removed.

use std::path::Path;

pub mod error;
pub mod json;
mod schema;
pub mod sqlite;

pub use error::StoreError;
pub use json::JsonFileStore;
pub use sqlite::SqliteStore;

use error::Result;

/// File extensions that select the SQLite backend.
const SQLITE_EXTENSIONS: &[&str] = &["db", "sqlite", "sqlite3"];

/// Append-only persistence for processed message ids.
pub trait ProcessedStore: Send {
    /// Reads every stored id. A store that does not exist yet is empty.
    fn load(&mut self) -> Result<Vec<String>>;

    /// Appends an id, keeping every id already persisted. Appending an id
    /// that is already stored is a no-op.
    fn append(&mut self, message_id: &str) -> Result<()>;

    /// Number of ids currently persisted.
    fn persisted_count(&self) -> Result<u64>;

    /// Human-readable location for logs.
    fn location(&self) -> String;
}

/// Opens the store at `path`, choosing the backend from its extension.
pub fn open_store(path: &Path) -> Result<Box<dyn ProcessedStore>> {
    let is_sqlite = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SQLITE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        });

    if is_sqlite {
        Ok(Box::new(SqliteStore::open(path)?))
    } else {
        Ok(Box::new(JsonFileStore::new(path)))
    }
}
