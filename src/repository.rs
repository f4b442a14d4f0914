use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::cache::SnapshotCache;
use crate::error::{ArchiveError, ArchiveResult};
use crate::table_store::{Row, TableStore};
use crate::traits::{EntryKey, TableEntity};

/// Cached, paginated accessor over one table of the external store.
///
/// The single point of contact between in-memory entities and the table
/// store, for exactly one entity type per instantiation; the type's
/// [`TableEntity::TABLE`] const picks the table. Each repository owns its
/// cache slot, so tests can construct isolated instances.
pub struct Repository<T: TableEntity> {
    store: Arc<dyn TableStore>,
    cache: SnapshotCache<T>,
    scan_gate: Mutex<()>,
}

impl<T: TableEntity> Repository<T> {
    /// Creates a repository over the given store with an empty cache.
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self {
            store,
            cache: SnapshotCache::new(),
            scan_gate: Mutex::new(()),
        }
    }

    /// Returns the full materialized set, scanning the table only on a
    /// cache miss.
    ///
    /// Callers receive an owned copy; mutating it never corrupts the
    /// cache. Concurrent cold calls coalesce behind a per-repository
    /// gate, so at most one scan runs for this entity type at a time. A
    /// failed scan leaves the cache empty — the slot is never partially
    /// populated.
    pub async fn fetch_all(&self) -> ArchiveResult<Vec<T>> {
        if let Some(items) = self.cache.peek() {
            debug!(table = T::TABLE, count = items.len(), "cache hit");
            return Ok(items);
        }

        let _gate = self.scan_gate.lock().await;
        // A concurrent caller may have populated the slot while we waited.
        if let Some(items) = self.cache.peek() {
            debug!(table = T::TABLE, count = items.len(), "cache hit");
            return Ok(items);
        }

        let mut items = self.scan_table().await?;
        T::post_process(&mut items);
        self.cache.populate(items.clone());
        debug!(table = T::TABLE, count = items.len(), "cache populated");
        Ok(items)
    }

    /// Writes a single item; see [`put_many`](Self::put_many).
    pub async fn put(&self, item: T) -> ArchiveResult<()> {
        self.put_many(vec![item]).await
    }

    /// Serializes the items to their canonical wire rows and issues one
    /// batched write.
    ///
    /// The cache is invalidated whenever the store accepted at least one
    /// item — never patched in place. Rejected items surface as
    /// [`ArchiveError::Write`] naming them; a store-level failure
    /// propagates unchanged and leaves the cache as it was.
    pub async fn put_many(&self, items: Vec<T>) -> ArchiveResult<()> {
        if items.is_empty() {
            return Ok(());
        }

        let rows: Vec<Row> = items
            .into_iter()
            .map(|item| item.prepare_for_write().encode())
            .collect::<ArchiveResult<_>>()?;
        let total = rows.len();

        let outcome = self.store.batch_put(T::TABLE, rows).await?;
        if outcome.failed.len() < total {
            self.invalidate();
        }
        if outcome.failed.is_empty() {
            debug!(table = T::TABLE, count = total, "batch written");
            Ok(())
        } else {
            Err(ArchiveError::Write {
                failed: outcome.failed,
            })
        }
    }

    /// Deletes the entry with the given key and invalidates the cache.
    ///
    /// Deleting a key that does not exist is not an error.
    pub async fn delete(&self, key: &EntryKey) -> ArchiveResult<()> {
        self.store.delete_by_key(T::TABLE, key.as_str()).await?;
        self.invalidate();
        debug!(table = T::TABLE, key = %key, "deleted");
        Ok(())
    }

    /// Deletes an entry by reading the key off the instance.
    pub async fn delete_item(&self, item: &T) -> ArchiveResult<()> {
        self.delete(item.key()).await
    }

    /// Deletes every entry of the table.
    pub async fn clear_all(&self) -> ArchiveResult<()> {
        let items = self.fetch_all().await?;
        futures::future::try_join_all(items.iter().map(|item| self.delete_item(item))).await?;
        self.invalidate();
        Ok(())
    }

    /// Resets the cache slot; the next `fetch_all` re-scans the table.
    pub fn invalidate(&self) {
        self.cache.invalidate();
        debug!(table = T::TABLE, "cache invalidated");
    }

    /// Drives the paginated scan to completion and decodes every row.
    ///
    /// One undecodable row fails the whole call — no partial results.
    async fn scan_table(&self) -> ArchiveResult<Vec<T>> {
        let mut items = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let page = self.store.scan(T::TABLE, token.take()).await?;
            debug!(table = T::TABLE, rows = page.rows.len(), "scanned page");
            for row in page.rows {
                items.push(T::decode(row)?);
            }
            match page.next_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        Ok(items)
    }
}
