// ABOUTME: In-process table store with bounded scan pages and failure injection
// ABOUTME: Backs offline runs and the test suite without a DynamoDB endpoint

use super::{ContinuationToken, Record, ScanPage, StoreError, TableDescriptor, TableStore};
use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

const OFFSET_KEY: &str = "__offset";
const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Default)]
struct State {
    tables: HashMap<String, Vec<Record>>,
    unreachable: bool,
    fail_scan_at_page: Option<usize>,
    fail_put_at: Option<usize>,
    scan_calls: usize,
    put_calls: usize,
}

/// Table store kept entirely in memory.
///
/// Scans are served in pages of `page_size` items with an offset token, so
/// multi-page behaviour can be exercised with small tables.
pub struct MemoryStore {
    page_size: usize,
    state: Mutex<State>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            state: Mutex::new(State::default()),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn create_table(&self, table_name: &str) {
        self.state()
            .tables
            .entry(table_name.to_string())
            .or_default();
    }

    pub fn insert_items(&self, table_name: &str, items: impl IntoIterator<Item = Record>) {
        self.state()
            .tables
            .entry(table_name.to_string())
            .or_default()
            .extend(items);
    }

    /// Snapshot of a table's items in insertion order.
    pub fn items(&self, table_name: &str) -> Vec<Record> {
        self.state()
            .tables
            .get(table_name)
            .cloned()
            .unwrap_or_default()
    }

    /// Make every operation fail as if the endpoint could not be reached.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state().unreachable = unreachable;
    }

    /// Fail the scan request for the given zero-based page.
    pub fn fail_scan_at_page(&self, page: usize) {
        self.state().fail_scan_at_page = Some(page);
    }

    /// Reject the put call with the given zero-based call number.
    pub fn fail_put_at(&self, call: usize) {
        self.state().fail_put_at = Some(call);
    }

    pub fn scan_calls(&self) -> usize {
        self.state().scan_calls
    }

    pub fn put_calls(&self) -> usize {
        self.state().put_calls
    }
}

fn offset_token(offset: usize) -> ContinuationToken {
    let mut key = Record::new();
    key.insert(
        OFFSET_KEY.to_string(),
        AttributeValue::N(offset.to_string()),
    );
    ContinuationToken(key)
}

fn token_offset(token: &ContinuationToken) -> Result<usize, StoreError> {
    match token.0.get(OFFSET_KEY) {
        Some(AttributeValue::N(n)) => n
            .parse()
            .map_err(|_| StoreError::new(format!("Invalid ExclusiveStartKey offset '{}'", n))),
        _ => Err(StoreError::new("Invalid ExclusiveStartKey")),
    }
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn describe(&self, table_name: &str) -> Result<Option<TableDescriptor>, StoreError> {
        let state = self.state();
        if state.unreachable {
            return Err(StoreError::new("Could not connect to the endpoint URL"));
        }

        Ok(state.tables.get(table_name).map(|items| TableDescriptor {
            table_name: table_name.to_string(),
            item_count: items.len() as u64,
        }))
    }

    async fn scan_page(
        &self,
        table_name: &str,
        start: Option<ContinuationToken>,
    ) -> Result<ScanPage, StoreError> {
        let mut state = self.state();
        let page_number = state.scan_calls;
        state.scan_calls += 1;

        if state.unreachable {
            return Err(StoreError::new("Could not connect to the endpoint URL"));
        }
        if state.fail_scan_at_page == Some(page_number) {
            return Err(StoreError::new(format!(
                "ProvisionedThroughputExceededException on scan page {}",
                page_number
            )));
        }

        let offset = match start.as_ref() {
            Some(token) => token_offset(token)?,
            None => 0,
        };
        let items = state.tables.get(table_name).ok_or_else(|| {
            StoreError::new(format!("ResourceNotFoundException: table {}", table_name))
        })?;

        let end = (offset + self.page_size).min(items.len());
        let page = items.get(offset..end).map(<[Record]>::to_vec).unwrap_or_default();
        let next = (end < items.len()).then(|| offset_token(end));

        Ok(ScanPage { items: page, next })
    }

    async fn put_item(&self, table_name: &str, item: Record) -> Result<(), StoreError> {
        let mut state = self.state();
        let call = state.put_calls;
        state.put_calls += 1;

        if state.unreachable {
            return Err(StoreError::new("Could not connect to the endpoint URL"));
        }
        if state.fail_put_at == Some(call) {
            return Err(StoreError::new(
                "ValidationException: One or more parameter values were invalid",
            ));
        }
        if item.is_empty() {
            return Err(StoreError::new(
                "ValidationException: Item must contain at least one attribute",
            ));
        }

        state
            .tables
            .get_mut(table_name)
            .ok_or_else(|| {
                StoreError::new(format!("ResourceNotFoundException: table {}", table_name))
            })?
            .push(item);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: usize) -> Record {
        let mut record = Record::new();
        record.insert("id".to_string(), AttributeValue::S(id.to_string()));
        record
    }

    #[tokio::test]
    async fn test_describe_missing_table() {
        let store = MemoryStore::new();
        assert_eq!(store.describe("Nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_scan_pages_until_token_exhausted() {
        let store = MemoryStore::new().with_page_size(2);
        store.insert_items("T", (0..5).map(item));

        let first = store.scan_page("T", None).await.unwrap();
        assert_eq!(first.items.len(), 2);
        let second = store.scan_page("T", first.next).await.unwrap();
        assert_eq!(second.items.len(), 2);
        let third = store.scan_page("T", second.next).await.unwrap();
        assert_eq!(third.items.len(), 1);
        assert!(third.next.is_none());
        assert_eq!(store.scan_calls(), 3);
    }

    #[tokio::test]
    async fn test_put_rejects_empty_item() {
        let store = MemoryStore::new();
        store.create_table("T");
        assert!(store.put_item("T", Record::new()).await.is_err());
        assert!(store.put_item("T", item(1)).await.is_ok());
        assert_eq!(store.items("T").len(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_fails_describe() {
        let store = MemoryStore::new();
        store.create_table("T");
        store.set_unreachable(true);
        assert!(store.describe("T").await.is_err());
    }
}
