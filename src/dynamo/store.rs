// ABOUTME: TableStore implementation over the AWS DynamoDB SDK client
// ABOUTME: Maps describe, paged scan, and put item onto DynamoDB API calls

use crate::store::{ContinuationToken, Record, ScanPage, StoreError, TableDescriptor, TableStore};
use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::Select;
use aws_sdk_dynamodb::Client;

/// DynamoDB-backed table store.
#[derive(Clone)]
pub struct DynamoStore {
    client: Client,
}

impl DynamoStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn store_error(err: impl std::error::Error) -> StoreError {
    StoreError::new(DisplayErrorContext(err).to_string())
}

#[async_trait]
impl TableStore for DynamoStore {
    async fn describe(&self, table_name: &str) -> Result<Option<TableDescriptor>, StoreError> {
        tracing::debug!("Describing table '{}'", table_name);

        let output = match self
            .client
            .describe_table()
            .table_name(table_name)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                let service_error = err.into_service_error();
                if service_error.is_resource_not_found_exception() {
                    return Ok(None);
                }
                return Err(store_error(service_error));
            }
        };

        Ok(output.table().map(|table| TableDescriptor {
            table_name: table.table_name().unwrap_or(table_name).to_string(),
            item_count: table.item_count().unwrap_or(0).max(0) as u64,
        }))
    }

    async fn scan_page(
        &self,
        table_name: &str,
        start: Option<ContinuationToken>,
    ) -> Result<ScanPage, StoreError> {
        let output = self
            .client
            .scan()
            .table_name(table_name)
            .select(Select::AllAttributes)
            .set_exclusive_start_key(start.map(|token| token.0))
            .send()
            .await
            .map_err(store_error)?;

        let next = output
            .last_evaluated_key
            .filter(|key| !key.is_empty())
            .map(ContinuationToken);

        Ok(ScanPage {
            items: output.items.unwrap_or_default(),
            next,
        })
    }

    async fn put_item(&self, table_name: &str, item: Record) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(store_error)?;
        Ok(())
    }
}
