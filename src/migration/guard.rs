// ABOUTME: Pre-flight table check shared by backup and restore
// ABOUTME: Confirms the table exists and refuses restores into tables that already hold data

use crate::error::MigrationError;
use crate::store::{ContinuationToken, Record, ScanPage, StoreError, TableDescriptor, TableStore};

/// A table that passed the pre-flight check, bound to the store it lives in.
///
/// Only [`check_table`] creates one; it lives for a single run.
pub struct TableHandle<'a> {
    store: &'a dyn TableStore,
    descriptor: TableDescriptor,
}

impl<'a> TableHandle<'a> {
    pub fn table_name(&self) -> &str {
        &self.descriptor.table_name
    }

    /// Item count reported by describe. DynamoDB refreshes it periodically,
    /// so it is only an estimate for backups.
    pub fn item_count(&self) -> u64 {
        self.descriptor.item_count
    }

    pub async fn scan_page(&self, start: Option<ContinuationToken>) -> Result<ScanPage, StoreError> {
        self.store.scan_page(self.table_name(), start).await
    }

    pub async fn put_item(&self, item: Record) -> Result<(), StoreError> {
        self.store.put_item(self.table_name(), item).await
    }
}

/// Check that `table_name` exists and, for a restore, that it is empty
///
/// # Errors
///
/// - `StoreUnreachable` if describe fails for any reason other than a missing table
/// - `TableNotFound` if the table does not exist
/// - `TableNotEmpty` if `for_restore` is set and the table reports any items
pub async fn check_table<'a>(
    store: &'a dyn TableStore,
    table_name: &str,
    for_restore: bool,
) -> Result<TableHandle<'a>, MigrationError> {
    tracing::debug!("Checking table '{}' (restore: {})", table_name, for_restore);

    let descriptor = store
        .describe(table_name)
        .await
        .map_err(|source| MigrationError::StoreUnreachable {
            table: table_name.to_string(),
            source,
        })?
        .ok_or_else(|| MigrationError::TableNotFound {
            table: table_name.to_string(),
        })?;

    // Only restore into empty tables, so a live table is never overwritten.
    if for_restore && descriptor.item_count > 0 {
        return Err(MigrationError::TableNotEmpty {
            table: table_name.to_string(),
            item_count: descriptor.item_count,
        });
    }

    tracing::info!(
        "✓ Table '{}' found ({} items reported)",
        descriptor.table_name,
        descriptor.item_count
    );

    Ok(TableHandle { store, descriptor })
}
