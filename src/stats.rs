//! Derived aggregations over the in-memory record set.
//!
//! Pure functions only: everything here operates on a slice of
//! [`Performance`] entries the caller already fetched and never talks to
//! the store.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate};

use crate::performance::{Performance, ProductionKey};
use crate::traits::EntryKey;

/// Key of one visit group.
///
/// Records sharing a non-empty visit index belong to one visit; every
/// other record forms its own singleton group under its own entry key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VisitKey {
    /// Shared multi-performance visit (e.g. a double bill).
    Visit(String),
    /// A performance attended on its own.
    Single(EntryKey),
}

/// Groups records into visits.
///
/// Every input record lands in exactly one group; records without a visit
/// index are never merged with each other, even when otherwise identical.
pub fn group_by_visit(records: &[Performance]) -> HashMap<VisitKey, Vec<&Performance>> {
    let mut groups: HashMap<VisitKey, Vec<&Performance>> = HashMap::new();
    for record in records {
        let key = match record.visit_index() {
            Some(index) => VisitKey::Visit(index.to_string()),
            None => VisitKey::Single(record.key().clone()),
        };
        groups.entry(key).or_default().push(record);
    }
    groups
}

/// A maximal run of consecutive calendar days with at least one attended
/// performance each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Streak {
    /// Number of consecutive days.
    pub length: u32,
    /// First day of the run.
    pub start: NaiveDate,
    /// Last day of the run.
    pub end: NaiveDate,
}

/// Finds the `n` longest attendance streaks.
///
/// Operates on the distinct, sorted earliest dates of all dated records.
/// Ordered by length descending, ties broken by the more recent end. An
/// isolated date is a streak of length 1 — callers usually treat a
/// longest streak of 1 as "no streak worth mentioning".
pub fn top_streaks(records: &[Performance], n: usize) -> Vec<Streak> {
    let mut dates: Vec<NaiveDate> = records
        .iter()
        .filter_map(|p| p.date())
        .map(|d| d.earliest_date())
        .collect();
    dates.sort_unstable();
    dates.dedup();

    let mut streaks = Vec::new();
    let mut run: Option<(NaiveDate, NaiveDate)> = None;
    for day in dates {
        match run {
            Some((start, end)) if end.succ_opt() == Some(day) => run = Some((start, day)),
            Some((start, end)) => {
                streaks.push(make_streak(start, end));
                run = Some((day, day));
            }
            None => run = Some((day, day)),
        }
    }
    if let Some((start, end)) = run {
        streaks.push(make_streak(start, end));
    }

    streaks.sort_by(|a, b| b.length.cmp(&a.length).then(b.end.cmp(&a.end)));
    streaks.truncate(n);
    streaks
}

fn make_streak(start: NaiveDate, end: NaiveDate) -> Streak {
    Streak {
        length: (end - start).num_days() as u32 + 1,
        start,
        end,
    }
}

/// Maps each opera `(title, composer)` to the distinct stagings seen.
///
/// Only records whose staging can be named (see
/// [`Performance::production_key`]) contribute; an opera seen exclusively
/// without an identifying person does not appear.
pub fn production_groups(records: &[Performance]) -> HashMap<(String, String), HashSet<ProductionKey>> {
    let mut groups: HashMap<(String, String), HashSet<ProductionKey>> = HashMap::new();
    for record in records {
        if let Some(key) = record.production_key() {
            let (name, composer) = record.opera();
            groups
                .entry((name.to_string(), composer.to_string()))
                .or_default()
                .insert(key);
        }
    }
    groups
}

/// Operas seen in more than one staging, most stagings first.
pub fn multi_production_operas(records: &[Performance]) -> Vec<((String, String), usize)> {
    let mut operas: Vec<((String, String), usize)> = production_groups(records)
        .into_iter()
        .filter(|(_, productions)| productions.len() > 1)
        .map(|(opera, productions)| (opera, productions.len()))
        .collect();
    operas.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    operas
}

/// Total number of distinct stagings across all operas.
pub fn total_distinct_productions(records: &[Performance]) -> usize {
    production_groups(records)
        .values()
        .map(HashSet::len)
        .sum()
}

/// Filters out archived entries, the default-view rule.
pub fn active(records: &[Performance]) -> Vec<&Performance> {
    records.iter().filter(|p| !p.is_archived()).collect()
}

/// Top-level archive counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// Total performances.
    pub performances: usize,
    /// Distinct `(title, composer)` works.
    pub distinct_operas: usize,
    /// Distinct composers.
    pub distinct_composers: usize,
    /// Distinct venues (by short code).
    pub distinct_venues: usize,
    /// Concert performances without staging.
    pub concertante: usize,
    /// Distinct stagings across all operas.
    pub distinct_productions: usize,
    /// Inclusive span of years between the earliest and latest dated
    /// record; `None` when nothing is dated.
    pub year_span: Option<u32>,
}

/// Computes the overview counters of the archive.
pub fn summarize(records: &[Performance]) -> ArchiveSummary {
    let operas: HashSet<(&str, &str)> = records.iter().map(|p| p.opera()).collect();
    let composers: HashSet<&str> = records.iter().map(|p| p.composer()).collect();
    let venues: HashSet<&str> = records.iter().map(|p| p.stage()).collect();

    let first_year = records
        .iter()
        .filter_map(|p| p.date())
        .map(|d| d.earliest_date().year())
        .min();
    let last_year = records
        .iter()
        .filter_map(|p| p.date())
        .map(|d| d.latest_date().year())
        .max();
    let year_span = match (first_year, last_year) {
        (Some(first), Some(last)) => Some((last - first) as u32 + 1),
        _ => None,
    };

    ArchiveSummary {
        performances: records.len(),
        distinct_operas: operas.len(),
        distinct_composers: composers.len(),
        distinct_venues: venues.len(),
        concertante: records.iter().filter(|p| p.is_concertante()).count(),
        distinct_productions: total_distinct_productions(records),
        year_span,
    }
}

/// Shortens a composer name to initials plus surname, e.g.
/// "Giuseppe Verdi" → "G. Verdi".
pub fn truncate_composer_name(composer: &str) -> String {
    let parts: Vec<&str> = composer.split_whitespace().collect();
    let Some((last, rest)) = parts.split_last() else {
        return String::new();
    };
    let mut shortened: Vec<String> = rest
        .iter()
        .filter_map(|part| part.chars().next())
        .map(|initial| format!("{initial}."))
        .collect();
    shortened.push((*last).to_string());
    shortened.join(" ")
}

const TITLE_ARTICLES: &[&str] = &[
    "A ", "The ", "An ", "Der ", "Die ", "Das ", "La ", "Le ", "L'", "L\u{2019}",
];

/// Sort key that ignores a leading article, so "La Bohème" files under B.
pub fn title_sort_key(title: &str) -> String {
    let trimmed = title.trim();
    for article in TITLE_ARTICLES {
        if let Some(stripped) = trimmed.strip_prefix(article) {
            return stripped.trim_start().to_string();
        }
    }
    trimmed.to_string()
}
