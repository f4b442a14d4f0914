use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::approx_date::ApproxDate;
use crate::error::{ArchiveError, ArchiveResult};
use crate::traits::{EntryKey, TableEntity};

/// Role keys checked when deriving the identifying person of a staging.
pub const ROLE_MUSICAL_DIRECTOR: &str = "Musikalische Leitung";
/// Conductor-equivalent fallback role.
pub const ROLE_CONDUCTOR: &str = "Dirigent";
/// Director-equivalent role for staged performances.
pub const ROLE_STAGE_DIRECTOR: &str = "Inszenierung";

/// Trims a required string field, rejecting values that are empty after
/// trimming.
pub(crate) fn required(field: &str, value: &str) -> ArchiveResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ArchiveError::Validation(format!("{field} field is empty")));
    }
    Ok(trimmed.to_string())
}

/// Role → people mapping as stored on a performance.
pub type RoleMap = BTreeMap<String, Vec<String>>;

fn clean_role_map(label: &str, raw: RoleMap) -> ArchiveResult<RoleMap> {
    let mut cleaned = RoleMap::new();
    for (role, people) in raw {
        let role = required(&format!("{label} role"), &role)?;
        let mut names: Vec<String> = Vec::with_capacity(people.len());
        for person in &people {
            let person = person.trim();
            if !person.is_empty() && !names.iter().any(|n| n == person) {
                names.push(person.to_string());
            }
        }
        if names.is_empty() {
            return Err(ArchiveError::Validation(format!(
                "{label} role `{role}` has no names"
            )));
        }
        cleaned.insert(role, names);
    }
    Ok(cleaned)
}

/// Derived grouping key identifying a specific staging of an opera.
///
/// Used only for grouping, never for identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductionKey {
    /// Director (or conductor, for concert performances) of the staging.
    pub identifying_person: String,
    /// Production label.
    pub production: String,
    /// Opera title.
    pub name: String,
    /// Composer.
    pub composer: String,
}

/// A single attended performance, the central archive entity.
///
/// Immutable after construction; "editing" means building a new instance
/// through [`PerformanceDraft`] (reusing the key) and replacing the stored
/// row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Performance {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<ApproxDate>,
    cast: RoleMap,
    leading_team: RoleMap,
    stage: String,
    production: String,
    composer: String,
    comments: String,
    is_concertante: bool,
    archived: bool,
    key: EntryKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    day_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    visit_index: Option<String>,
}

/// Mutable form used to construct or edit a [`Performance`].
///
/// Decodes from stored rows; `build` validates the field set and assigns a
/// fresh key only when the draft carries none.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PerformanceDraft {
    pub name: String,
    #[serde(default)]
    pub date: Option<ApproxDate>,
    #[serde(default)]
    pub cast: RoleMap,
    #[serde(default)]
    pub leading_team: RoleMap,
    pub stage: String,
    pub production: String,
    pub composer: String,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub is_concertante: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    key: Option<EntryKey>,
    #[serde(default)]
    pub day_index: Option<u32>,
    #[serde(default)]
    pub visit_index: Option<String>,
}

impl PerformanceDraft {
    /// Starts a draft from the fields every performance must carry.
    pub fn new(name: &str, composer: &str, stage: &str, production: &str) -> Self {
        Self {
            name: name.to_string(),
            composer: composer.to_string(),
            stage: stage.to_string(),
            production: production.to_string(),
            ..Self::default()
        }
    }

    /// Assigns an existing key to the draft.
    ///
    /// Fails with [`ArchiveError::ImmutableField`] when the draft already
    /// carries one; a key is assigned exactly once.
    pub fn with_key(mut self, key: EntryKey) -> ArchiveResult<Self> {
        if self.key.is_some() {
            return Err(ArchiveError::ImmutableField("key"));
        }
        self.key = Some(key);
        Ok(self)
    }

    /// The key carried over from an existing entry, if any.
    pub fn key(&self) -> Option<&EntryKey> {
        self.key.as_ref()
    }

    /// Validates the draft and freezes it into a [`Performance`].
    pub fn build(self) -> ArchiveResult<Performance> {
        let name = required("name", &self.name)?;
        let stage = required("stage", &self.stage)?;
        let production = required("production", &self.production)?;
        let composer = required("composer", &self.composer)?;
        let cast = clean_role_map("cast", self.cast)?;
        let leading_team = clean_role_map("leading team", self.leading_team)?;

        let visit_index = self
            .visit_index
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Ok(Performance {
            name,
            date: self.date,
            cast,
            leading_team,
            stage,
            production,
            composer,
            comments: self.comments.trim().to_string(),
            is_concertante: self.is_concertante,
            archived: self.archived,
            key: self.key.unwrap_or_else(EntryKey::generate),
            day_index: self.day_index,
            visit_index,
        })
    }
}

impl Performance {
    /// Opera title.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The (possibly approximate) day of the visit, when known.
    pub fn date(&self) -> Option<ApproxDate> {
        self.date
    }

    /// Sung roles and who sang them.
    pub fn cast(&self) -> &RoleMap {
        &self.cast
    }

    /// Production roles (director, conductor, ...).
    pub fn leading_team(&self) -> &RoleMap {
        &self.leading_team
    }

    /// Venue short code.
    pub fn stage(&self) -> &str {
        &self.stage
    }

    /// Label identifying the specific staging.
    pub fn production(&self) -> &str {
        &self.production
    }

    /// Composer of the work.
    pub fn composer(&self) -> &str {
        &self.composer
    }

    /// Free-text notes.
    pub fn comments(&self) -> &str {
        &self.comments
    }

    /// True for concert performances without staging.
    pub fn is_concertante(&self) -> bool {
        self.is_concertante
    }

    /// True when the entry is excluded from default views but retained.
    pub fn is_archived(&self) -> bool {
        self.archived
    }

    /// Opaque immutable identifier.
    pub fn key(&self) -> &EntryKey {
        &self.key
    }

    /// Ordering hint within a multi-performance day.
    pub fn day_index(&self) -> Option<u32> {
        self.day_index
    }

    /// Shared label of a multi-performance visit, when part of one.
    pub fn visit_index(&self) -> Option<&str> {
        self.visit_index.as_deref()
    }

    /// The work this performance belongs to, as a `(title, composer)` pair.
    pub fn opera(&self) -> (&str, &str) {
        (&self.name, &self.composer)
    }

    /// Reopens the entry for editing, carrying the key along.
    pub fn to_draft(&self) -> PerformanceDraft {
        PerformanceDraft {
            name: self.name.clone(),
            date: self.date,
            cast: self.cast.clone(),
            leading_team: self.leading_team.clone(),
            stage: self.stage.clone(),
            production: self.production.clone(),
            composer: self.composer.clone(),
            comments: self.comments.clone(),
            is_concertante: self.is_concertante,
            archived: self.archived,
            key: Some(self.key.clone()),
            day_index: self.day_index,
            visit_index: self.visit_index.clone(),
        }
    }

    /// Derives the grouping key of the staging, when one can be named.
    ///
    /// The identifying person is looked up over the leading team in a
    /// fixed role order: musical direction then conductor for concert
    /// performances, stage direction otherwise. The first listed person
    /// of the first present role wins; `None` when no role matches.
    pub fn production_key(&self) -> Option<ProductionKey> {
        let roles: &[&str] = if self.is_concertante {
            &[ROLE_MUSICAL_DIRECTOR, ROLE_CONDUCTOR]
        } else {
            &[ROLE_STAGE_DIRECTOR]
        };

        let identifying_person = roles
            .iter()
            .find_map(|role| self.leading_team.get(*role))
            .and_then(|people| people.first())?;

        Some(ProductionKey {
            identifying_person: identifying_person.clone(),
            production: self.production.clone(),
            name: self.name.clone(),
            composer: self.composer.clone(),
        })
    }
}

impl<'de> Deserialize<'de> for Performance {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let draft = PerformanceDraft::deserialize(deserializer)?;
        draft.build().map_err(serde::de::Error::custom)
    }
}

impl TableEntity for Performance {
    const TABLE: &'static str = "performances";

    fn key(&self) -> &EntryKey {
        &self.key
    }

    /// Newest first; entries of a shared day keep their day order,
    /// undated entries sort last.
    fn post_process(items: &mut Vec<Self>) {
        fn rank(p: &Performance) -> (NaiveDate, u32) {
            (
                p.date.map(|d| d.earliest_date()).unwrap_or(NaiveDate::MIN),
                p.day_index.unwrap_or(0),
            )
        }
        items.sort_by(|a, b| rank(b).cmp(&rank(a)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> PerformanceDraft {
        let mut draft = PerformanceDraft::new(
            "Tosca",
            "Giacomo Puccini",
            "WSO",
            "Wallmann",
        );
        draft.leading_team.insert(
            ROLE_STAGE_DIRECTOR.to_string(),
            vec!["Margarethe Wallmann".to_string()],
        );
        draft
    }

    #[test]
    fn build_trims_and_validates() {
        let mut d = draft();
        d.name = "  Tosca  ".to_string();
        d.comments = " great evening ".to_string();
        let p = d.build().unwrap();
        assert_eq!(p.name(), "Tosca");
        assert_eq!(p.comments(), "great evening");
    }

    #[test]
    fn empty_required_field_is_rejected() {
        for field in ["name", "stage", "production", "composer"] {
            let mut d = draft();
            match field {
                "name" => d.name = "   ".to_string(),
                "stage" => d.stage = String::new(),
                "production" => d.production = " ".to_string(),
                _ => d.composer = String::new(),
            }
            let err = d.build().unwrap_err();
            assert!(matches!(err, ArchiveError::Validation(_)), "{field}");
        }
    }

    #[test]
    fn role_lists_are_deduplicated_in_order() {
        let mut d = draft();
        d.cast.insert(
            "Tosca".to_string(),
            vec![
                " Maria Callas ".to_string(),
                "Maria Callas".to_string(),
                "Renata Tebaldi".to_string(),
            ],
        );
        let p = d.build().unwrap();
        assert_eq!(
            p.cast()["Tosca"],
            vec!["Maria Callas".to_string(), "Renata Tebaldi".to_string()]
        );
    }

    #[test]
    fn role_without_names_is_rejected() {
        let mut d = draft();
        d.cast.insert("Tosca".to_string(), vec!["  ".to_string()]);
        assert!(matches!(
            d.build().unwrap_err(),
            ArchiveError::Validation(_)
        ));
    }

    #[test]
    fn key_is_generated_once_and_survives_round_trips() {
        let p = draft().build().unwrap();
        let key = p.key().clone();

        let json = serde_json::to_string(&p).unwrap();
        let back: Performance = serde_json::from_str(&json).unwrap();
        assert_eq!(back.key(), &key);

        // Editing keeps the key.
        let mut edit = back.to_draft();
        edit.comments = "revisited".to_string();
        let edited = edit.build().unwrap();
        assert_eq!(edited.key(), &key);
    }

    #[test]
    fn key_cannot_be_reassigned() {
        let p = draft().build().unwrap();
        let err = p.to_draft().with_key(EntryKey::generate()).unwrap_err();
        assert!(matches!(err, ArchiveError::ImmutableField("key")));
    }

    #[test]
    fn distinct_entries_never_collide() {
        let a = draft().build().unwrap();
        let b = draft().build().unwrap();
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn empty_visit_index_is_normalized_away() {
        let mut d = draft();
        d.visit_index = Some("  ".to_string());
        assert_eq!(d.build().unwrap().visit_index(), None);
    }

    #[test]
    fn production_key_uses_director_for_staged_performances() {
        let p = draft().build().unwrap();
        let key = p.production_key().unwrap();
        assert_eq!(key.identifying_person, "Margarethe Wallmann");
        assert_eq!(key.production, "Wallmann");
    }

    #[test]
    fn production_key_falls_back_to_conductor_when_concertante() {
        let mut d = draft();
        d.is_concertante = true;
        d.leading_team.clear();
        d.leading_team.insert(
            ROLE_CONDUCTOR.to_string(),
            vec!["Karl Böhm".to_string()],
        );
        let p = d.build().unwrap();
        assert_eq!(p.production_key().unwrap().identifying_person, "Karl Böhm");

        // Musical direction outranks the plain conductor role.
        let mut d = draft();
        d.is_concertante = true;
        d.leading_team.clear();
        d.leading_team.insert(
            ROLE_CONDUCTOR.to_string(),
            vec!["Karl Böhm".to_string()],
        );
        d.leading_team.insert(
            ROLE_MUSICAL_DIRECTOR.to_string(),
            vec!["Herbert von Karajan".to_string()],
        );
        let p = d.build().unwrap();
        assert_eq!(
            p.production_key().unwrap().identifying_person,
            "Herbert von Karajan"
        );
    }

    #[test]
    fn production_key_is_absent_without_identifying_person() {
        let mut d = draft();
        d.leading_team.clear();
        let p = d.build().unwrap();
        assert_eq!(p.production_key(), None);

        // A director does not identify a concert performance.
        let mut d = draft();
        d.is_concertante = true;
        let p = d.build().unwrap();
        assert_eq!(p.production_key(), None);
    }

    #[test]
    fn decoding_an_invalid_row_fails() {
        let json = r#"{"name":"","stage":"WSO","production":"X","composer":"Verdi"}"#;
        assert!(serde_json::from_str::<Performance>(json).is_err());
    }

    #[test]
    fn post_process_sorts_newest_first_with_day_order() {
        let mut items: Vec<Performance> = Vec::new();
        for (name, date, day_index) in [
            ("Aida", Some("2024-05-01"), None),
            ("Tosca", Some("2024-05-03"), Some(1)),
            ("Otello", Some("2024-05-03"), Some(2)),
            ("Nabucco", None, None),
        ] {
            let mut d = draft();
            d.name = name.to_string();
            d.date = date.map(|t| t.parse().unwrap());
            d.day_index = day_index;
            items.push(d.build().unwrap());
        }

        Performance::post_process(&mut items);
        let names: Vec<&str> = items.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["Otello", "Tosca", "Aida", "Nabucco"]);
    }
}
