// SqliteCheckpointStore — rusqlite backend implementing CheckpointStore.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is !Sync.
// Trait methods lock the mutex, do synchronous rusqlite work, and return.
// Writes from different targets serialize on the mutex; each target owns a
// distinct key so no further coordination is needed.

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;

use super::models::CheckpointRecord;
use super::traits::CheckpointStore;

pub struct SqliteCheckpointStore {
    conn: Mutex<Connection>,
}

impl SqliteCheckpointStore {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

#[async_trait]
impl CheckpointStore for SqliteCheckpointStore {
    async fn get(&self, key: &str) -> Result<u64> {
        let conn = self.conn.lock().await;
        Ok(super::queries::get_checkpoint(&conn, key)?.unwrap_or(0))
    }

    async fn set(&self, key: &str, value: u64) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::set_checkpoint(&conn, key, value)
    }

    async fn entries(&self) -> Result<Vec<CheckpointRecord>> {
        let conn = self.conn.lock().await;
        super::queries::get_all_checkpoints(&conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::create_tables;

    fn test_store() -> SqliteCheckpointStore {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        SqliteCheckpointStore::new(conn)
    }

    #[tokio::test]
    async fn test_trait_absent_key_is_zero() {
        let store = test_store();
        assert_eq!(store.get("checkpoint:42").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_trait_roundtrip() {
        let store = test_store();
        store.set("checkpoint:42", 1234).await.unwrap();
        assert_eq!(store.get("checkpoint:42").await.unwrap(), 1234);
    }

    #[tokio::test]
    async fn test_trait_keys_are_independent() {
        let store = test_store();
        store.set("checkpoint:1", 5).await.unwrap();
        store.set("checkpoint:2", 7).await.unwrap();
        assert_eq!(store.get("checkpoint:1").await.unwrap(), 5);
        assert_eq!(store.get("checkpoint:2").await.unwrap(), 7);
        assert_eq!(store.entries().await.unwrap().len(), 2);
    }
}
