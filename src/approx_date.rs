use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DateParseError;

const RANGE_SEPARATOR: &str = " to ";

/// A calendar date known only up to a closed range.
///
/// Collapses to a single day when the range is exact. Ordering is defined
/// on the `(earliest, latest)` pair, earliest first, so sorting records by
/// date sorts by the earliest possible day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApproxDate {
    earliest: NaiveDate,
    latest: NaiveDate,
}

impl ApproxDate {
    /// Creates a date range from an explicit pair of bounds.
    pub fn new(earliest: NaiveDate, latest: NaiveDate) -> Result<Self, DateParseError> {
        if earliest > latest {
            return Err(DateParseError::InvertedRange { earliest, latest });
        }
        Ok(Self { earliest, latest })
    }

    /// Creates an exact single-day date.
    pub fn exact(date: NaiveDate) -> Self {
        Self {
            earliest: date,
            latest: date,
        }
    }

    /// The earliest day the date could fall on.
    pub fn earliest_date(&self) -> NaiveDate {
        self.earliest
    }

    /// The latest day the date could fall on.
    pub fn latest_date(&self) -> NaiveDate {
        self.latest
    }

    /// True when the range pins down a single day.
    pub fn is_exact(&self) -> bool {
        self.earliest == self.latest
    }

    /// Canonical wire form: `YYYY-MM-DD` when exact, otherwise
    /// `YYYY-MM-DD to YYYY-MM-DD`. Round-trips through [`FromStr`].
    pub fn to_wire(&self) -> String {
        if self.is_exact() {
            self.earliest.format("%Y-%m-%d").to_string()
        } else {
            format!(
                "{}{}{}",
                self.earliest.format("%Y-%m-%d"),
                RANGE_SEPARATOR,
                self.latest.format("%Y-%m-%d")
            )
        }
    }
}

/// Resolves a calendar partial (`YYYY`, `YYYY-MM` or `YYYY-MM-DD`) to the
/// range of days it covers.
fn parse_partial(text: &str) -> Result<(NaiveDate, NaiveDate), DateParseError> {
    let unrecognized = || DateParseError::UnrecognizedFormat(text.to_string());

    let mut parts = text.splitn(3, '-');
    let year: i32 = parts
        .next()
        .filter(|p| p.len() == 4)
        .and_then(|p| p.parse().ok())
        .ok_or_else(unrecognized)?;

    let month: Option<u32> = match parts.next() {
        Some(p) => Some(p.parse().map_err(|_| unrecognized())?),
        None => None,
    };
    let day: Option<u32> = match parts.next() {
        Some(p) => Some(p.parse().map_err(|_| unrecognized())?),
        None => None,
    };

    match (month, day) {
        (None, _) => {
            let first = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(unrecognized)?;
            let last = NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(unrecognized)?;
            Ok((first, last))
        }
        (Some(month), None) => {
            let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(unrecognized)?;
            let next_month = if month == 12 {
                NaiveDate::from_ymd_opt(year + 1, 1, 1)
            } else {
                NaiveDate::from_ymd_opt(year, month + 1, 1)
            };
            let last = next_month
                .and_then(|d| d.pred_opt())
                .ok_or_else(unrecognized)?;
            Ok((first, last))
        }
        (Some(month), Some(day)) => {
            let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(unrecognized)?;
            Ok((date, date))
        }
    }
}

impl FromStr for ApproxDate {
    type Err = DateParseError;

    /// Accepts an exact day (`2024-05-12`), a calendar partial (`2024`,
    /// `2024-05`) or two partials joined by `" to "`. A range expression
    /// takes the earliest day of its left operand and the latest day of
    /// its right.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if text.contains(RANGE_SEPARATOR) {
            let operands: Vec<&str> = text
                .split(RANGE_SEPARATOR)
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .collect();
            if operands.len() != 2 {
                return Err(DateParseError::MalformedRange(text.trim().to_string()));
            }
            let (earliest, _) = parse_partial(operands[0])?;
            let (_, latest) = parse_partial(operands[1])?;
            Self::new(earliest, latest)
        } else {
            let (earliest, latest) = parse_partial(text.trim())?;
            Self::new(earliest, latest)
        }
    }
}

impl fmt::Display for ApproxDate {
    /// Compact human rendering: shared year/month components are written
    /// once. `1-3.05.2024`, `30.04-2.05.2024`, `30.12.2023-2.01.2024`, or
    /// a single `12.05.2024` when exact.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (e, l) = (self.earliest, self.latest);
        if self.is_exact() {
            write!(f, "{}.{:02}.{}", e.day(), e.month(), e.year())
        } else if e.year() == l.year() && e.month() == l.month() {
            write!(f, "{}-{}.{:02}.{}", e.day(), l.day(), e.month(), e.year())
        } else if e.year() == l.year() {
            write!(
                f,
                "{}.{:02}-{}.{:02}.{}",
                e.day(),
                e.month(),
                l.day(),
                l.month(),
                e.year()
            )
        } else {
            write!(
                f,
                "{}.{:02}.{}-{}.{:02}.{}",
                e.day(),
                e.month(),
                e.year(),
                l.day(),
                l.month(),
                l.year()
            )
        }
    }
}

impl Serialize for ApproxDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_wire())
    }
}

impl<'de> Deserialize<'de> for ApproxDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(D::Error::custom)
    }
}
