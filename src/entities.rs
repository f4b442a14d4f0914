use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::error::ArchiveResult;
use crate::performance::required;
use crate::traits::{EntryKey, TableEntity};

/// Marker prefix of an already-hashed password value.
pub const PASSWORD_HASH_PREFIX: &str = "sha1$";

/// Premiere-year record of a work, joined to performances informally on
/// `(title, composer)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkYearEntry {
    #[serde(default = "EntryKey::generate")]
    key: EntryKey,
    title: String,
    composer: String,
    year: i32,
}

impl WorkYearEntry {
    /// Creates a validated entry with a fresh key.
    pub fn new(title: &str, composer: &str, year: i32) -> ArchiveResult<Self> {
        Ok(Self {
            key: EntryKey::generate(),
            title: required("title", title)?,
            composer: required("composer", composer)?,
            year,
        })
    }

    /// Work title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Composer.
    pub fn composer(&self) -> &str {
        &self.composer
    }

    /// Premiere year.
    pub fn year(&self) -> i32 {
        self.year
    }
}

impl TableEntity for WorkYearEntry {
    const TABLE: &'static str = "works_dates";

    fn key(&self) -> &EntryKey {
        &self.key
    }
}

/// A venue, referenced from performances by its short code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    #[serde(default = "EntryKey::generate")]
    key: EntryKey,
    name: String,
    short_name: String,
}

impl Venue {
    /// Creates a validated venue with a fresh key.
    pub fn new(name: &str, short_name: &str) -> ArchiveResult<Self> {
        Ok(Self {
            key: EntryKey::generate(),
            name: required("name", name)?,
            short_name: required("short name", short_name)?,
        })
    }

    /// Full venue name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Short code used on performance entries.
    pub fn short_name(&self) -> &str {
        &self.short_name
    }
}

impl TableEntity for Venue {
    const TABLE: &'static str = "venues";

    fn key(&self) -> &EntryKey {
        &self.key
    }
}

/// Builds the short-code → full-name lookup used to label venues.
pub fn venue_lookup(venues: &[Venue]) -> HashMap<String, String> {
    venues
        .iter()
        .map(|v| (v.short_name.clone(), v.name.clone()))
        .collect()
}

/// A stored password, hashed on first write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordCredential {
    #[serde(default = "EntryKey::generate")]
    key: EntryKey,
    label: String,
    password: String,
}

fn hash_password(plain: &str) -> String {
    format!(
        "{PASSWORD_HASH_PREFIX}{}",
        hex::encode(Sha1::digest(plain.as_bytes()))
    )
}

impl PasswordCredential {
    /// Creates a credential with a fresh key. The password may be given
    /// as plaintext; it is hashed when the credential is written.
    pub fn new(label: &str, password: &str) -> ArchiveResult<Self> {
        Ok(Self {
            key: EntryKey::generate(),
            label: required("label", label)?,
            password: required("password", password)?,
        })
    }

    /// What the credential protects.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The stored value, plaintext until first write.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// True once the stored value carries the hash marker.
    pub fn is_hashed(&self) -> bool {
        self.password.starts_with(PASSWORD_HASH_PREFIX)
    }

    /// Checks a plaintext candidate against the stored value.
    pub fn verify(&self, candidate: &str) -> bool {
        if self.is_hashed() {
            hash_password(candidate) == self.password
        } else {
            candidate == self.password
        }
    }
}

impl TableEntity for PasswordCredential {
    const TABLE: &'static str = "passwords";

    fn key(&self) -> &EntryKey {
        &self.key
    }

    /// Hashes a plaintext value exactly once; an already-hashed value
    /// passes through unchanged so re-writing a fetched credential never
    /// double-hashes.
    fn prepare_for_write(mut self) -> Self {
        if !self.is_hashed() {
            self.password = hash_password(&self.password);
        }
        self
    }
}
