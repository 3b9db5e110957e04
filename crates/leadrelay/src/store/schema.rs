//! Versioned schema for the SQLite store.
//!
//! Applied versions are recorded in `_migrations`; each step runs once.

use rusqlite::{params, Connection};

use super::error::{Result, StoreError};

struct SchemaStep {
    version: u32,
    description: &'static str,
    sql: &'static str,
}

const STEPS: &[SchemaStep] = &[SchemaStep {
    version: 1,
    description: "create_processed_messages_table",
    sql: "CREATE TABLE IF NOT EXISTS processed_messages (
            message_id TEXT PRIMARY KEY NOT NULL,
            processed_at TEXT NOT NULL
          );",
}];

/// Brings the schema on `conn` up to date.
pub(crate) fn apply(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM _migrations",
        [],
        |r| r.get(0),
    )?;

    for step in STEPS.iter().filter(|s| s.version > current) {
        log::info!("Applying schema v{}: {}", step.version, step.description);

        conn.execute_batch(step.sql)
            .map_err(|source| StoreError::Migration {
                version: step.version,
                source,
            })?;
        conn.execute(
            "INSERT INTO _migrations (version, description) VALUES (?1, ?2)",
            params![step.version, step.description],
        )?;
    }

    Ok(())
}
