use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::StoreError;
use crate::table_store::{BatchPutOutcome, Row, ScanPage, TableStore};

const DEFAULT_PAGE_SIZE: usize = 100;

/// In-memory [`TableStore`] for tests and ephemeral archives.
///
/// Keeps each table as an ordered key → row map and pages scans the way a
/// remote table would: the continuation token is the last key of the
/// previous page. Scan requests are counted and individual keys can be
/// marked as rejected, so tests can observe caching behavior and batch
/// failures.
pub struct MemoryTableStore {
    tables: RwLock<HashMap<String, BTreeMap<String, Row>>>,
    page_size: usize,
    scan_calls: AtomicU64,
    rejected_keys: RwLock<HashSet<String>>,
}

impl MemoryTableStore {
    /// Creates an empty store with the default page size.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            page_size: DEFAULT_PAGE_SIZE,
            scan_calls: AtomicU64::new(0),
            rejected_keys: RwLock::new(HashSet::new()),
        }
    }

    /// Sets how many rows a single scan request returns.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Number of scan requests served so far (one per page).
    pub fn scan_calls(&self) -> u64 {
        self.scan_calls.load(Ordering::Relaxed)
    }

    /// Marks a key as rejected: batch writes report it as failed.
    pub fn reject_key(&self, key: &str) {
        self.rejected_keys.write().insert(key.to_string());
    }

    /// Number of rows currently stored in `table`.
    pub fn row_count(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, BTreeMap::len)
    }

    /// Inserts a raw row directly, bypassing entity encoding. Lets tests
    /// seed rows the entity decoder must reject.
    pub fn insert_raw(&self, table: &str, key: &str, row: Row) {
        self.tables
            .write()
            .entry(table.to_string())
            .or_default()
            .insert(key.to_string(), row);
    }
}

impl Default for MemoryTableStore {
    fn default() -> Self {
        Self::new()
    }
}

fn row_key(row: &Row) -> Result<String, StoreError> {
    row.get("key")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| StoreError::Unavailable("row is missing its key field".to_string()))
}

#[async_trait]
impl TableStore for MemoryTableStore {
    async fn scan(
        &self,
        table: &str,
        exclusive_start_key: Option<String>,
    ) -> Result<ScanPage, StoreError> {
        self.scan_calls.fetch_add(1, Ordering::Relaxed);

        let tables = self.tables.read();
        let Some(rows) = tables.get(table) else {
            return Ok(ScanPage::default());
        };

        let start = match &exclusive_start_key {
            Some(key) => Bound::Excluded(key.clone()),
            None => Bound::Unbounded,
        };

        let mut page: Vec<(String, Row)> = rows
            .range((start, Bound::Unbounded))
            .take(self.page_size + 1)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let next_token = if page.len() > self.page_size {
            page.truncate(self.page_size);
            page.last().map(|(k, _)| k.clone())
        } else {
            None
        };

        Ok(ScanPage {
            rows: page.into_iter().map(|(_, v)| v).collect(),
            next_token,
        })
    }

    async fn batch_put(&self, table: &str, rows: Vec<Row>) -> Result<BatchPutOutcome, StoreError> {
        let mut failed = Vec::new();
        let rejected = self.rejected_keys.read().clone();
        let mut tables = self.tables.write();
        let stored = tables.entry(table.to_string()).or_default();

        for row in rows {
            let key = row_key(&row)?;
            if rejected.contains(&key) {
                failed.push(key);
            } else {
                stored.insert(key, row);
            }
        }

        Ok(BatchPutOutcome { failed })
    }

    async fn delete_by_key(&self, table: &str, key: &str) -> Result<(), StoreError> {
        if let Some(rows) = self.tables.write().get_mut(table) {
            rows.remove(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(key: &str) -> Row {
        let mut row = Row::new();
        row.insert("key".to_string(), serde_json::Value::String(key.to_string()));
        row
    }

    #[tokio::test]
    async fn scan_pages_with_continuation_tokens() {
        let store = MemoryTableStore::new().with_page_size(2);
        store
            .batch_put("things", vec![row("a"), row("b"), row("c"), row("d"), row("e")])
            .await
            .unwrap();

        let mut seen = Vec::new();
        let mut token = None;
        let mut pages = 0;
        loop {
            let page = store.scan("things", token.take()).await.unwrap();
            pages += 1;
            seen.extend(page.rows.iter().map(|r| r["key"].as_str().unwrap().to_string()));
            match page.next_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        assert_eq!(seen, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(pages, 3);
        assert_eq!(store.scan_calls(), 3);
    }

    #[tokio::test]
    async fn a_full_final_page_ends_the_scan() {
        let store = MemoryTableStore::new().with_page_size(2);
        store
            .batch_put("things", vec![row("a"), row("b")])
            .await
            .unwrap();

        let page = store.scan("things", None).await.unwrap();
        assert_eq!(page.rows.len(), 2);
        assert!(page.next_token.is_none());
    }

    #[tokio::test]
    async fn rejected_keys_surface_in_the_outcome() {
        let store = MemoryTableStore::new();
        store.reject_key("b");

        let outcome = store
            .batch_put("things", vec![row("a"), row("b")])
            .await
            .unwrap();
        assert_eq!(outcome.failed, vec!["b"]);
        assert_eq!(store.row_count("things"), 1);
    }

    #[tokio::test]
    async fn deletes_are_idempotent() {
        let store = MemoryTableStore::new();
        store.batch_put("things", vec![row("a")]).await.unwrap();

        store.delete_by_key("things", "a").await.unwrap();
        store.delete_by_key("things", "a").await.unwrap();
        store.delete_by_key("missing", "a").await.unwrap();
        assert_eq!(store.row_count("things"), 0);
    }
}
