//! Filter and search engine over the canonical report list.
//!
//! [`apply`] is pure: it borrows the canonical list and returns a new,
//! filtered (and optionally sorted) vector. The canonical list is never
//! reordered or mutated.
//!
//! # Criteria
//!
//! | Field | Match |
//! |-------|-------|
//! | `text_query` | case-insensitive substring of title, plain-text description, official name or position |
//! | `official_name` | case-insensitive substring of official name |
//! | `county` | exact county code |
//! | `date_order` | stable sort by parsed date, `newest` or `oldest` first |
//!
//! All criteria combine with AND. Empty strings disable a criterion.
//!
//! # Text query threshold
//!
//! A text query only starts filtering once it is [`MIN_QUERY_CHARS`]
//! characters long. One or two characters are treated as "still typing" and
//! leave the list unfiltered, exactly as an empty query does.

use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::Report;

/// Shortest text query that filters.
pub const MIN_QUERY_CHARS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateOrder {
    Newest,
    Oldest,
}

impl FromStr for DateOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "newest" => Ok(DateOrder::Newest),
            "oldest" => Ok(DateOrder::Oldest),
            other => Err(format!(
                "unknown date order '{}'. Use newest or oldest.",
                other
            )),
        }
    }
}

impl fmt::Display for DateOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateOrder::Newest => f.write_str("newest"),
            DateOrder::Oldest => f.write_str("oldest"),
        }
    }
}

/// Active filter and sort options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub official_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_order: Option<DateOrder>,
}

impl Criteria {
    /// Lower-cased text query, or `None` while it is below the threshold.
    pub fn active_text_query(&self) -> Option<String> {
        self.text_query
            .as_deref()
            .filter(|q| q.chars().count() >= MIN_QUERY_CHARS)
            .map(str::to_lowercase)
    }

    fn active_official(&self) -> Option<String> {
        self.official_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .map(str::to_lowercase)
    }

    fn active_county(&self) -> Option<&str> {
        self.county.as_deref().filter(|c| !c.is_empty())
    }

    /// True when applying these criteria would return the input unchanged.
    pub fn is_identity(&self) -> bool {
        self.active_text_query().is_none()
            && self.active_official().is_none()
            && self.active_county().is_none()
            && self.date_order.is_none()
    }

    /// Drop every criterion.
    pub fn clear(&mut self) {
        *self = Criteria::default();
    }
}

/// Derive the display list from the canonical list.
pub fn apply(reports: &[Report], criteria: &Criteria) -> Vec<Report> {
    let query = criteria.active_text_query();
    let official = criteria.active_official();
    let county = criteria.active_county();

    let mut filtered: Vec<Report> = reports
        .iter()
        .filter(|r| query.as_deref().map_or(true, |q| matches_text(r, q)))
        .filter(|r| {
            official
                .as_deref()
                .map_or(true, |name| r.official.name.to_lowercase().contains(name))
        })
        .filter(|r| county.map_or(true, |code| r.county == code))
        .cloned()
        .collect();

    if let Some(order) = criteria.date_order {
        sort_by_date(&mut filtered, order);
    }
    filtered
}

fn matches_text(report: &Report, query: &str) -> bool {
    report.title.to_lowercase().contains(query)
        || report.plain_description().to_lowercase().contains(query)
        || report.official.name.to_lowercase().contains(query)
        || report.official.position.to_lowercase().contains(query)
}

/// Stable sort by parsed date. Unparseable dates count as the oldest.
pub fn sort_by_date(reports: &mut [Report], order: DateOrder) {
    match order {
        DateOrder::Oldest => reports.sort_by_cached_key(|r| r.parsed_date()),
        DateOrder::Newest => reports.sort_by_cached_key(|r| Reverse(r.parsed_date())),
    }
}

/// Unique, non-empty official names in first-seen order.
pub fn distinct_officials(reports: &[Report]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for report in reports {
        let name = report.official.name.trim();
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}
