// Database queries — all SQL for the checkpoint table lives here.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use super::models::CheckpointRecord;

fn parse_id(key: &str, raw: &str) -> Result<u64> {
    raw.parse::<u64>()
        .with_context(|| format!("Corrupt checkpoint for {key}: {raw:?}"))
}

/// Get a checkpoint by key.
pub fn get_checkpoint(conn: &Connection, key: &str) -> Result<Option<u64>> {
    let mut stmt = conn.prepare("SELECT last_id FROM checkpoints WHERE key = ?1")?;
    let raw: Option<String> = stmt.query_row(params![key], |row| row.get(0)).optional()?;
    raw.map(|v| parse_id(key, &v)).transpose()
}

/// Set a checkpoint (upsert).
pub fn set_checkpoint(conn: &Connection, key: &str, value: u64) -> Result<()> {
    conn.execute(
        "INSERT INTO checkpoints (key, last_id, updated_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET last_id = ?2, updated_at = datetime('now')",
        params![key, value.to_string()],
    )?;
    Ok(())
}

/// All checkpoints, ordered by key.
pub fn get_all_checkpoints(conn: &Connection) -> Result<Vec<CheckpointRecord>> {
    let mut stmt =
        conn.prepare("SELECT key, last_id, updated_at FROM checkpoints ORDER BY key")?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(|(key, raw, updated_at)| {
            let last_id = parse_id(&key, &raw)?;
            Ok(CheckpointRecord {
                key,
                last_id,
                updated_at,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::create_tables;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn
    }

    #[test]
    fn test_missing_checkpoint_is_none() {
        let conn = test_conn();
        assert_eq!(get_checkpoint(&conn, "checkpoint:1").unwrap(), None);
    }

    #[test]
    fn test_upsert_overwrites() {
        let conn = test_conn();
        set_checkpoint(&conn, "checkpoint:1", 100).unwrap();
        set_checkpoint(&conn, "checkpoint:1", 250).unwrap();
        assert_eq!(get_checkpoint(&conn, "checkpoint:1").unwrap(), Some(250));
    }

    #[test]
    fn test_full_u64_range_survives() {
        let conn = test_conn();
        set_checkpoint(&conn, "checkpoint:1", u64::MAX).unwrap();
        assert_eq!(get_checkpoint(&conn, "checkpoint:1").unwrap(), Some(u64::MAX));
    }

    #[test]
    fn test_corrupt_value_is_an_error() {
        let conn = test_conn();
        conn.execute(
            "INSERT INTO checkpoints (key, last_id) VALUES ('checkpoint:9', 'abc')",
            [],
        )
        .unwrap();
        assert!(get_checkpoint(&conn, "checkpoint:9").is_err());
    }

    #[test]
    fn test_all_checkpoints_sorted_by_key() {
        let conn = test_conn();
        set_checkpoint(&conn, "checkpoint:2", 20).unwrap();
        set_checkpoint(&conn, "checkpoint:1", 10).unwrap();

        let all = get_all_checkpoints(&conn).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].key, "checkpoint:1");
        assert_eq!(all[0].last_id, 10);
        assert_eq!(all[1].last_id, 20);
        assert!(!all[0].updated_at.is_empty());
    }
}
