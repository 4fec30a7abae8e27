// ABOUTME: Restore command: JSON file contents into an empty table
// ABOUTME: Parses the file first, then runs the empty-table check, then writes record by record

use crate::commands::RunConfig;
use crate::migration::{self, Progress, RunOutcome};
use crate::store::TableStore;
use crate::utils::format_count;

/// Restore a table from the configured file
///
/// Steps:
/// 1. Read and parse the whole file (no store calls if this fails)
/// 2. Check the table exists and is empty
/// 3. Write each record in file order, stopping at the first failure
pub async fn restore(store: &dyn TableStore, config: &RunConfig) -> RunOutcome {
    tracing::info!(
        "Restoring data for table {} from file {}",
        config.table_name,
        config.file_path.display()
    );

    let records = match migration::load_records(&config.file_path).await {
        Ok(records) => records,
        Err(e) => return RunOutcome::failed(e, 0),
    };
    tracing::info!("Read {} records from file", format_count(records.len() as u64));

    let handle = match migration::check_table(store, &config.table_name, true).await {
        Ok(handle) => handle,
        Err(e) => return RunOutcome::failed(e, 0),
    };

    let progress = Progress::new(
        "Written",
        config.progress_interval,
        Some(records.len() as u64),
        config.show_progress,
    );

    migration::import_records(handle, records, &progress).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::store::MemoryStore;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_restore_invalid_file_never_touches_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "[{\"id\": ").unwrap();

        let store = MemoryStore::new();
        store.create_table("Orders");
        store.set_unreachable(true);

        let outcome = restore(&store, &RunConfig::restore("Orders", &path)).await;
        assert_eq!(outcome.error_kind(), Some(ErrorKind::SourceFileInvalid));
        assert_eq!(store.put_calls(), 0);
    }

    #[tokio::test]
    async fn test_restore_empty_array() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.json");
        std::fs::write(&path, "[\n]").unwrap();

        let store = MemoryStore::new();
        store.create_table("Orders");

        let outcome = restore(&store, &RunConfig::restore("Orders", &path)).await;
        assert!(outcome.succeeded());
        assert_eq!(outcome.records_transferred(), 0);
    }
}
