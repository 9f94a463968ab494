// Per-target checkpoint handle.
//
// Read once when the target is set up, then only moved forward by that
// target's own reconciler. The handle keeps the current value in memory so
// cycles don't re-read the store.

use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use super::traits::CheckpointStore;

/// Store key for an account's checkpoint.
pub fn checkpoint_key(account_id: u64) -> String {
    format!("checkpoint:{account_id}")
}

pub struct Checkpoint {
    store: Arc<dyn CheckpointStore>,
    key: String,
    value: u64,
}

impl Checkpoint {
    /// Read the stored value for `key` (0 when absent).
    pub async fn load(store: Arc<dyn CheckpointStore>, key: String) -> Result<Self> {
        let value = store.get(&key).await?;
        Ok(Self { store, key, value })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Highest fully processed id; 0 means no history.
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Move the checkpoint forward to `id` and persist it.
    ///
    /// Returns `Ok(false)` without writing when `id` is not above the current
    /// value. The in-memory value moves even if the write fails, so this
    /// process keeps its progress; the error is handed back for logging.
    pub async fn advance(&mut self, id: u64) -> Result<bool> {
        if id <= self.value {
            return Ok(false);
        }
        self.value = id;
        self.store.set(&self.key, id).await?;
        debug!(key = %self.key, checkpoint = id, "Checkpoint advanced");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryCheckpointStore;

    #[tokio::test]
    async fn test_load_absent_is_zero() {
        let store: Arc<dyn CheckpointStore> = Arc::new(MemoryCheckpointStore::new());
        let cp = Checkpoint::load(store, checkpoint_key(7)).await.unwrap();
        assert_eq!(cp.value(), 0);
        assert_eq!(cp.key(), "checkpoint:7");
    }

    #[tokio::test]
    async fn test_advance_is_monotonic() {
        let store: Arc<dyn CheckpointStore> = Arc::new(MemoryCheckpointStore::new());
        let mut cp = Checkpoint::load(store.clone(), checkpoint_key(7)).await.unwrap();

        assert!(cp.advance(100).await.unwrap());
        assert!(!cp.advance(50).await.unwrap());
        assert!(!cp.advance(100).await.unwrap());

        assert_eq!(cp.value(), 100);
        assert_eq!(store.get("checkpoint:7").await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_load_picks_up_stored_value() {
        let store: Arc<dyn CheckpointStore> = Arc::new(MemoryCheckpointStore::new());
        store.set("checkpoint:7", 321).await.unwrap();
        let cp = Checkpoint::load(store, checkpoint_key(7)).await.unwrap();
        assert_eq!(cp.value(), 321);
    }
}
