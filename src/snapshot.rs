use serde::{Deserialize, Serialize};

use crate::entities::{Venue, WorkYearEntry};
use crate::performance::Performance;

/// Combined export of the archive's content tables.
///
/// Password credentials are deliberately left out of exports.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchiveSnapshot {
    /// All performance entries.
    pub performances: Vec<Performance>,
    /// All work premiere-year entries.
    pub works_dates: Vec<WorkYearEntry>,
    /// All venues.
    pub venues: Vec<Venue>,
}

impl ArchiveSnapshot {
    /// Serializes the snapshot to a JSON document.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Reads a snapshot back from a JSON document.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
