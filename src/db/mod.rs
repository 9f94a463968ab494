// Checkpoint storage — where each target's resume point survives restarts.
//
// SQLite via rusqlite with the "bundled" feature, so there's no system
// SQLite dependency. The database file lives wherever AMPLIFIER_DB_PATH
// points. With --ephemeral the in-memory store is used instead and every
// start is a cold start.

pub mod checkpoint;
pub mod memory;
pub mod models;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod queries;
#[cfg(feature = "sqlite")]
pub mod schema;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use checkpoint::{checkpoint_key, Checkpoint};
pub use memory::MemoryCheckpointStore;
pub use traits::CheckpointStore;

#[cfg(feature = "sqlite")]
use anyhow::{Context, Result};
#[cfg(feature = "sqlite")]
use rusqlite::Connection;
#[cfg(feature = "sqlite")]
use std::path::Path;
#[cfg(feature = "sqlite")]
use std::sync::Arc;

/// Open (or create) the database and create tables.
///
/// Called by `amplifier init` and by `run` when the file is missing.
#[cfg(feature = "sqlite")]
pub fn initialize(db_path: &str) -> Result<Connection> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory for database: {}", db_path))?;
        }
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path))?;

    // WAL lets status readers run while target tasks write.
    conn.pragma_update(None, "journal_mode", "WAL")?;

    schema::create_tables(&conn)?;

    Ok(conn)
}

/// Open an existing database (fails if it doesn't exist yet).
#[cfg(feature = "sqlite")]
pub fn open(db_path: &str) -> Result<Connection> {
    if !Path::new(db_path).exists() {
        anyhow::bail!(
            "Database not found at {}. Run `amplifier init` first.",
            db_path
        );
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path))?;

    conn.pragma_update(None, "journal_mode", "WAL")?;

    Ok(conn)
}

/// Initialize the SQLite store and hand it out behind the trait.
#[cfg(feature = "sqlite")]
pub fn initialize_sqlite(db_path: &str) -> Result<Arc<dyn CheckpointStore>> {
    let conn = initialize(db_path)?;
    Ok(Arc::new(sqlite::SqliteCheckpointStore::new(conn)))
}

/// Open an existing SQLite store behind the trait.
#[cfg(feature = "sqlite")]
pub fn open_sqlite(db_path: &str) -> Result<Arc<dyn CheckpointStore>> {
    let conn = open(db_path)?;
    Ok(Arc::new(sqlite::SqliteCheckpointStore::new(conn)))
}
