// Data models — rows handed out by the checkpoint store.

use serde::{Deserialize, Serialize};

/// One stored checkpoint, as listed by `amplifier status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub key: String,
    pub last_id: u64,
    /// When the value was last written (`YYYY-MM-DD HH:MM:SS`, UTC).
    pub updated_at: String,
}
