// CheckpointStore trait — backend-agnostic async key/value interface.
//
// Implementors: SqliteCheckpointStore (wraps rusqlite), MemoryCheckpointStore.
// All target tasks share one store; each target only touches its own key,
// so backends only need to be safe for concurrent access to distinct keys.

use anyhow::Result;
use async_trait::async_trait;

use super::models::CheckpointRecord;

#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Stored value for `key`, or 0 when nothing has been stored yet.
    async fn get(&self, key: &str) -> Result<u64>;

    /// Store `value` for `key` (upsert).
    async fn set(&self, key: &str, value: u64) -> Result<()>;

    /// Every stored checkpoint, ordered by key.
    async fn entries(&self) -> Result<Vec<CheckpointRecord>>;
}
