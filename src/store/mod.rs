// ABOUTME: Table store abstraction consumed by the backup and restore pipelines
// ABOUTME: Describe, paged scan, and single-item put over an already-connected store

pub mod memory;

pub use crate::error::StoreError;
pub use memory::MemoryStore;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::HashMap;

/// One stored item: attribute name to typed value.
pub type Record = HashMap<String, AttributeValue>;

/// Metadata returned by a describe call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    pub table_name: String,
    pub item_count: u64,
}

/// Opaque marker returned by a scan page when more pages remain.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuationToken(pub Record);

/// One bounded page of a full-table scan.
#[derive(Debug, Clone, Default)]
pub struct ScanPage {
    pub items: Vec<Record>,
    pub next: Option<ContinuationToken>,
}

/// Operations the migration engine needs from a table store.
///
/// Implementations are expected to be authenticated and connected already.
/// Retries, if any, belong inside the implementation; the engine never retries.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Describe a table. `Ok(None)` means the table does not exist.
    async fn describe(&self, table_name: &str) -> Result<Option<TableDescriptor>, StoreError>;

    /// Fetch one page of a full scan requesting all attributes.
    async fn scan_page(
        &self,
        table_name: &str,
        start: Option<ContinuationToken>,
    ) -> Result<ScanPage, StoreError>;

    /// Write a single item.
    async fn put_item(&self, table_name: &str, item: Record) -> Result<(), StoreError>;
}
