// Status display — where the checkpoint database lives and what it holds.

use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;

use crate::db::CheckpointStore;

/// Display stored checkpoints to the terminal.
///
/// `store` is `None` when the database file hasn't been created yet.
pub async fn show(store: Option<&Arc<dyn CheckpointStore>>, db_path: &str) -> Result<()> {
    let Some(store) = store else {
        println!("Database: {}", "not initialized".yellow());
        println!("\nRun `amplifier init` to set up the database.");
        return Ok(());
    };

    let file_size = std::fs::metadata(db_path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());
    println!("Database: {} ({})", db_path, file_size);

    let entries = store.entries().await?;
    if entries.is_empty() {
        println!("Checkpoints: {}", "none yet".dimmed());
        println!("  Run `amplifier run --target <account>:<filter>` to start watching");
        return Ok(());
    }

    println!("{}", format!("Checkpoints ({}):", entries.len()).bold());
    for entry in &entries {
        println!(
            "  {:<32} {:>20}  {}",
            entry.key,
            entry.last_id.to_string().green(),
            format!("updated {}", entry.updated_at).dimmed()
        );
    }

    Ok(())
}

/// True when the database file exists at `db_path`.
pub fn database_exists(db_path: &str) -> bool {
    Path::new(db_path).exists()
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }

    #[tokio::test]
    async fn test_show_lists_memory_entries() {
        let store: Arc<dyn CheckpointStore> = Arc::new(crate::db::MemoryCheckpointStore::new());
        store.set("checkpoint:42", 1000).await.unwrap();
        show(Some(&store), "./does-not-exist.db").await.unwrap();
        show(None, "./does-not-exist.db").await.unwrap();
    }
}
