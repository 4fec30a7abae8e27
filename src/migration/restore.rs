// ABOUTME: Table import from a JSON backup file
// ABOUTME: Loads the whole array up front, then writes items one at a time and stops at the first failure

use crate::dynamo::converter::json_to_item;
use crate::error::MigrationError;
use crate::migration::guard::TableHandle;
use crate::migration::outcome::RunOutcome;
use crate::migration::progress::Progress;
use crate::utils::format_count;
use serde_json::Value as JsonValue;
use std::path::Path;

/// Read and parse a backup file into its array elements
///
/// The whole file is parsed before anything is written, so a truncated or
/// malformed file is rejected without touching the store.
pub async fn load_records(path: &Path) -> Result<Vec<JsonValue>, MigrationError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| MigrationError::SourceFileInvalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
    serde_json::from_str::<Vec<JsonValue>>(text).map_err(|e| MigrationError::SourceFileInvalid {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Write already-loaded records into the table, in order
///
/// The table is expected to have passed the restore check. On the first record
/// that fails to decode or write the run stops; records before it stay in the
/// table and the outcome's count equals the failing record's index.
pub async fn import_records(
    handle: TableHandle<'_>,
    records: Vec<JsonValue>,
    progress: &Progress,
) -> RunOutcome {
    tracing::info!(
        "Sending {} records to table {}",
        format_count(records.len() as u64),
        handle.table_name()
    );

    let mut written: u64 = 0;
    for (index, value) in records.iter().enumerate() {
        let item = match json_to_item(value) {
            Ok(item) => item,
            Err(source) => {
                progress.abandon();
                return RunOutcome::failed(MigrationError::MalformedRecord { index, source }, written);
            }
        };

        if let Err(source) = handle.put_item(item).await {
            progress.abandon();
            return RunOutcome::failed(
                MigrationError::RecordWriteFailed {
                    index,
                    table: handle.table_name().to_string(),
                    source,
                },
                written,
            );
        }

        written += 1;
        progress.record(written);
    }

    progress.finish(written);
    tracing::info!("Finished writing all {} records to table {}", written, handle.table_name());
    RunOutcome::success(written)
}

/// Load `path` and import every record into the table
pub async fn import(handle: TableHandle<'_>, path: &Path, progress: &Progress) -> RunOutcome {
    match load_records(path).await {
        Ok(records) => import_records(handle, records, progress).await,
        Err(e) => RunOutcome::failed(e, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::migration::guard::check_table;
    use crate::store::MemoryStore;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_load_rejects_missing_file() {
        let dir = tempdir().unwrap();
        let result = load_records(&dir.path().join("missing.json")).await;
        assert_eq!(
            result.err().map(|e| e.kind()),
            Some(ErrorKind::SourceFileInvalid)
        );
    }

    #[tokio::test]
    async fn test_load_skips_byte_order_mark() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bom.json");
        std::fs::write(&path, "\u{feff}[\n{\n  \"id\": \"1\"\n}\n]").unwrap();

        let records = load_records(&path).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["id"], "1");
    }

    #[tokio::test]
    async fn test_load_rejects_non_array() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("object.json");
        std::fs::write(&path, r#"{"id": "1"}"#).unwrap();

        let result = load_records(&path).await;
        assert_eq!(
            result.err().map(|e| e.kind()),
            Some(ErrorKind::SourceFileInvalid)
        );
    }

    #[tokio::test]
    async fn test_load_rejects_truncated_array() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, "[\n{\n  \"id\": \"1\"\n},\n{\n  \"id\": \"2\"\n}").unwrap();

        let result = load_records(&path).await;
        assert_eq!(
            result.err().map(|e| e.kind()),
            Some(ErrorKind::SourceFileInvalid)
        );
    }

    #[tokio::test]
    async fn test_import_writes_in_file_order() {
        let store = MemoryStore::new();
        store.create_table("Orders");
        let records = vec![
            serde_json::json!({"id": "a"}),
            serde_json::json!({"id": "b"}),
            serde_json::json!({"id": "c"}),
        ];

        let handle = check_table(&store, "Orders", true).await.unwrap();
        let outcome = import_records(handle, records, &Progress::hidden("Written", 2)).await;

        assert!(outcome.succeeded());
        assert_eq!(outcome.records_transferred(), 3);
        let ids: Vec<_> = store
            .items("Orders")
            .iter()
            .map(|item| item["id"].as_s().unwrap().clone())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_import_stops_at_malformed_record() {
        let store = MemoryStore::new();
        store.create_table("Orders");
        let records = vec![
            serde_json::json!({"id": "a"}),
            serde_json::json!("not an object"),
            serde_json::json!({"id": "c"}),
        ];

        let handle = check_table(&store, "Orders", true).await.unwrap();
        let outcome = import_records(handle, records, &Progress::hidden("Written", 100)).await;

        assert_eq!(outcome.error_kind(), Some(ErrorKind::MalformedRecord));
        assert_eq!(outcome.failure().and_then(|e| e.record_index()), Some(1));
        assert_eq!(outcome.records_transferred(), 1);
        assert_eq!(store.items("Orders").len(), 1);
    }

    #[tokio::test]
    async fn test_import_stops_at_rejected_write() {
        let store = MemoryStore::new();
        store.create_table("Orders");
        store.fail_put_at(2);
        let records: Vec<_> = (0..5)
            .map(|i| serde_json::json!({"id": i.to_string()}))
            .collect();

        let handle = check_table(&store, "Orders", true).await.unwrap();
        let outcome = import_records(handle, records, &Progress::hidden("Written", 100)).await;

        assert_eq!(outcome.error_kind(), Some(ErrorKind::RecordWriteFailed));
        assert_eq!(outcome.failure().and_then(|e| e.record_index()), Some(2));
        assert_eq!(outcome.records_transferred(), 2);
        assert_eq!(store.put_calls(), 3);
        assert_eq!(store.items("Orders").len(), 2);
    }
}
