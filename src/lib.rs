//! # Opera Archive
//!
//! Core of a personal archive of attended performances: the entity model
//! with opaque immutable keys and approximate dates, a generic cached
//! repository over an external key-value table store, and the pure
//! aggregation algorithms (visit grouping, streak detection, production
//! clustering) that run on the in-memory record set.
//!
//! ## Key Components
//!
//! - `ApproxDate`: date range value type that collapses to a day when exact
//! - `Performance` / `PerformanceDraft`: the central entity and its builder
//! - `Repository<T>`: cached, paginated, batch-writing table accessor
//! - `TableStore`: abstract store collaborator (scan/batch-put/delete)
//! - `MemoryTableStore`: in-memory store for tests and ephemeral archives
//! - `stats`: visit, streak, production and summary aggregations

mod approx_date;
mod cache;
mod entities;
mod error;
mod memory_store;
mod performance;
mod repository;
mod snapshot;
pub mod stats;
mod table_store;
mod traits;

pub use approx_date::ApproxDate;
pub use cache::SnapshotCache;
pub use entities::{
    venue_lookup, PasswordCredential, Venue, WorkYearEntry, PASSWORD_HASH_PREFIX,
};
pub use error::{ArchiveError, ArchiveResult, DateParseError, StoreError};
pub use memory_store::MemoryTableStore;
pub use performance::{
    Performance, PerformanceDraft, ProductionKey, RoleMap, ROLE_CONDUCTOR,
    ROLE_MUSICAL_DIRECTOR, ROLE_STAGE_DIRECTOR,
};
pub use repository::Repository;
pub use snapshot::ArchiveSnapshot;
pub use table_store::{BatchPutOutcome, Row, ScanPage, TableStore};
pub use traits::{EntryKey, TableEntity};
