// Database schema — table creation.
//
// A `schema_version` table tracks applied versions so later migrations can
// be added the same way without touching existing rows.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create the schema on a fresh database; existing tables are left alone.
///
/// Idempotent; `run` calls it on every start.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Highest fully processed feed item id per target.
        -- Stored as TEXT: ids use the full u64 range, SQLite integers are i64.
        CREATE TABLE IF NOT EXISTS checkpoints (
            key TEXT PRIMARY KEY,              -- checkpoint:<account id>
            last_id TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        ",
    )
    .context("Failed to create database tables")?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [1],
    )?;

    Ok(())
}

/// Number of user tables, printed by `amplifier init`.
pub fn table_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}
