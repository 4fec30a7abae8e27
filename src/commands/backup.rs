// ABOUTME: Backup command: table contents to a JSON file
// ABOUTME: Checks the destination, runs the table check, then exports every page

use crate::commands::RunConfig;
use crate::migration::{self, Progress, RunOutcome};
use crate::store::TableStore;

/// Back up a table to the configured file
///
/// Steps:
/// 1. Refuse (or, with overwrite, delete) an existing destination file
/// 2. Check the table exists
/// 3. Scan every page and stream the items into the file
///
/// The destination is handled before the store is contacted, so a refused
/// backup performs no store calls at all.
pub async fn backup(store: &dyn TableStore, config: &RunConfig) -> RunOutcome {
    tracing::info!(
        "Backing up data for table {} to file {}",
        config.table_name,
        config.file_path.display()
    );

    if let Err(e) =
        migration::prepare_destination(&config.file_path, config.overwrite_existing).await
    {
        return RunOutcome::failed(e, 0);
    }

    let handle = match migration::check_table(store, &config.table_name, false).await {
        Ok(handle) => handle,
        Err(e) => return RunOutcome::failed(e, 0),
    };

    let progress = Progress::new(
        "Exported",
        config.progress_interval,
        Some(handle.item_count()),
        config.show_progress,
    );

    migration::export(
        handle,
        &config.file_path,
        config.overwrite_existing,
        &progress,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::store::MemoryStore;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_backup_existing_file_checked_before_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.json");
        std::fs::write(&path, "[]").unwrap();

        let store = MemoryStore::new();
        store.set_unreachable(true);

        let outcome = backup(&store, &RunConfig::backup("Orders", &path)).await;
        assert_eq!(outcome.error_kind(), Some(ErrorKind::DestinationExists));
        assert_eq!(store.scan_calls(), 0);
    }

    #[tokio::test]
    async fn test_backup_missing_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.json");

        let outcome = backup(&MemoryStore::new(), &RunConfig::backup("Orders", &path)).await;
        assert_eq!(outcome.error_kind(), Some(ErrorKind::TableNotFound));
        assert!(!path.exists());
    }
}
