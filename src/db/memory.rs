// In-process checkpoint store. Nothing survives a restart.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;

use super::models::CheckpointRecord;
use super::traits::CheckpointStore;

#[derive(Default)]
pub struct MemoryCheckpointStore {
    values: Mutex<HashMap<String, (u64, String)>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn get(&self, key: &str) -> Result<u64> {
        let values = self.values.lock().unwrap();
        Ok(values.get(key).map(|(v, _)| *v).unwrap_or(0))
    }

    async fn set(&self, key: &str, value: u64) -> Result<()> {
        let stamp = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let mut values = self.values.lock().unwrap();
        values.insert(key.to_string(), (value, stamp));
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<CheckpointRecord>> {
        let values = self.values.lock().unwrap();
        let mut records: Vec<CheckpointRecord> = values
            .iter()
            .map(|(key, (last_id, updated_at))| CheckpointRecord {
                key: key.clone(),
                last_id: *last_id,
                updated_at: updated_at.clone(),
            })
            .collect();
        records.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(records)
    }
}
