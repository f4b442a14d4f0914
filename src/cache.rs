use parking_lot::RwLock;

/// The per-entity-type cache slot behind a repository.
///
/// The slot has exactly two states: empty, or populated with the full
/// materialized snapshot of one table. There is no partial state — a
/// write invalidates the whole slot and the next fetch re-scans. That
/// all-or-nothing policy is what makes invalidation-on-write safe without
/// fine-grained locking.
#[derive(Debug)]
pub struct SnapshotCache<T> {
    slot: RwLock<Option<Vec<T>>>,
}

impl<T: Clone> SnapshotCache<T> {
    /// Creates an empty slot.
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    /// Returns a copy of the snapshot when populated.
    ///
    /// Callers own the returned vector; mutating it never touches the
    /// cached snapshot.
    pub fn peek(&self) -> Option<Vec<T>> {
        self.slot.read().clone()
    }

    /// Stores a full snapshot, replacing whatever the slot held.
    pub fn populate(&self, items: Vec<T>) {
        *self.slot.write() = Some(items);
    }

    /// Resets the slot to empty.
    pub fn invalidate(&self) {
        *self.slot.write() = None;
    }

    /// True when a snapshot is present.
    pub fn is_populated(&self) -> bool {
        self.slot.read().is_some()
    }
}

impl<T: Clone> Default for SnapshotCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
