use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ArchiveError, ArchiveResult};
use crate::table_store::Row;

/// Opaque identifier of a stored entry.
///
/// Generated once at first construction from a random token, never derived
/// from content, and never changed afterwards. Two coincidentally identical
/// entries therefore never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryKey(String);

impl EntryKey {
    /// Generates a fresh random key.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// The key as a plain string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EntryKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for EntryKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A trait for entities stored in one table of the archive.
///
/// Each implementor maps to exactly one table via [`TABLE`](Self::TABLE);
/// the repository uses that mapping to pick which table to talk to.
pub trait TableEntity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Name of the backing table.
    const TABLE: &'static str;

    /// Returns the entry's opaque key.
    fn key(&self) -> &EntryKey;

    /// Decodes a raw stored row into a validated entity.
    fn decode(row: Row) -> ArchiveResult<Self> {
        serde_json::from_value(serde_json::Value::Object(row)).map_err(|e| {
            ArchiveError::Decode {
                table: Self::TABLE,
                reason: e.to_string(),
            }
        })
    }

    /// Encodes the entity to its canonical wire row.
    fn encode(&self) -> ArchiveResult<Row> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(row)) => Ok(row),
            Ok(other) => Err(ArchiveError::Decode {
                table: Self::TABLE,
                reason: format!("entity did not serialize to a row: {other}"),
            }),
            Err(e) => Err(ArchiveError::Decode {
                table: Self::TABLE,
                reason: e.to_string(),
            }),
        }
    }

    /// Hook applied to each item just before it is written.
    ///
    /// Identity by default; [`PasswordCredential`] uses it to hash
    /// plaintext values exactly once.
    ///
    /// [`PasswordCredential`]: crate::entities::PasswordCredential
    fn prepare_for_write(self) -> Self {
        self
    }

    /// Hook applied to a freshly scanned set before it is cached.
    fn post_process(_items: &mut Vec<Self>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_are_unique_and_opaque() {
        let a = EntryKey::generate();
        let b = EntryKey::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
    }

    #[test]
    fn keys_serialize_transparently() {
        let key = EntryKey::from("abc123");
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"abc123\"");
        let back: EntryKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }
}
