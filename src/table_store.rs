use async_trait::async_trait;

use crate::error::StoreError;

/// A raw stored row: a flat string-keyed map, as the remote table returns
/// it. The core owns encoding/decoding to and from typed entities.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// One page of a table scan.
#[derive(Debug, Clone, Default)]
pub struct ScanPage {
    /// The rows in this page.
    pub rows: Vec<Row>,
    /// Continuation token for the next page; `None` when the scan is done.
    pub next_token: Option<String>,
}

/// Result of a batched write that the store accepted as a request.
///
/// `failed` names the keys of items the store rejected individually
/// (unprocessed items); empty means every item was written.
#[derive(Debug, Clone, Default)]
pub struct BatchPutOutcome {
    /// Keys of rows the store did not accept.
    pub failed: Vec<String>,
}

/// The external key-value table collaborator fronted by
/// [`Repository`](crate::repository::Repository).
///
/// Implementations own transport, timeouts and cancellation; failures
/// surface as [`StoreError`] and are propagated unchanged by the core.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Fetches one page of rows from `table`, resuming after
    /// `exclusive_start_key` when given.
    async fn scan(
        &self,
        table: &str,
        exclusive_start_key: Option<String>,
    ) -> Result<ScanPage, StoreError>;

    /// Writes a batch of rows to `table` in a single request.
    async fn batch_put(&self, table: &str, rows: Vec<Row>) -> Result<BatchPutOutcome, StoreError>;

    /// Deletes the row with the given key from `table`. Deleting a key
    /// that does not exist is not an error.
    async fn delete_by_key(&self, table: &str, key: &str) -> Result<(), StoreError>;
}
