//! SQLite store: one row per processed message id.

use std::path::Path;

use chrono::Utc;
use log::debug;
use rusqlite::{params, Connection};

use super::error::{Result, StoreError};
use super::{schema, ProcessedStore};

pub struct SqliteStore {
    conn: Connection,
    location: String,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        log::info!("Processed store database opened at {}", path.display());

        Self::init(conn, path.display().to_string())
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?, ":memory:".to_string())
    }

    fn init(conn: Connection, location: String) -> Result<Self> {
        schema::apply(&conn)?;
        Ok(Self { conn, location })
    }
}

impl ProcessedStore for SqliteStore {
    fn load(&mut self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT message_id FROM processed_messages ORDER BY rowid ASC")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }

    fn append(&mut self, message_id: &str) -> Result<()> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO processed_messages (message_id, processed_at)
             VALUES (?1, ?2)",
            params![message_id, Utc::now().to_rfc3339()],
        )?;
        if inserted == 0 {
            debug!("Message {} was already recorded", message_id);
        }
        Ok(())
    }

    fn persisted_count(&self) -> Result<u64> {
        let count: u64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM processed_messages", [], |r| r.get(0))?;
        Ok(count)
    }

    fn location(&self) -> String {
        self.location.clone()
    }
}
