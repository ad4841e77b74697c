//! Date reconciliation shared by every pipeline stage.
//!
//! Sources disagree on date formats (GDELT compact stamps, RSS RFC 2822,
//! NewsAPI RFC 3339, bare days). [`canonicalize`] maps all of them onto
//! ISO-8601 and everything else onto [`UNKNOWN_DATE`], so downstream code only
//! ever sees one of those two shapes.

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Canonical marker for a date that could not be parsed.
pub const UNKNOWN_DATE: &str = "unknown";

/// Assigned by sources with no publication date of their own (encyclopedic pages).
pub const HISTORICAL_DATE: &str = "1900-01-01";

const DAY_FORMAT: &str = "%Y-%m-%d";

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(19\d{2}|20\d{2})\b").unwrap());

/// Reparses a source-specific date string into canonical ISO form.
///
/// Canonical outputs map to themselves, so applying this twice is a no-op.
pub fn canonicalize(raw: &str) -> String {
    let s = raw.trim();
    if s.is_empty() || s.eq_ignore_ascii_case(UNKNOWN_DATE) {
        return UNKNOWN_DATE.to_string();
    }

    if s.len() == 14 && s.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveDateTime::parse_from_str(s, "%Y%m%d%H%M%S")
            .map(|dt| dt.date().format(DAY_FORMAT).to_string())
            .unwrap_or_else(|_| UNKNOWN_DATE.to_string());
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%SZ") {
        return dt.date().format(DAY_FORMAT).to_string();
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.to_rfc3339_opts(SecondsFormat::Secs, true);
    }

    if let Ok(day) = NaiveDate::parse_from_str(s, DAY_FORMAT) {
        return day.format(DAY_FORMAT).to_string();
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return dt.to_rfc3339_opts(SecondsFormat::Secs, true);
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return dt.format("%Y-%m-%dT%H:%M:%S").to_string();
        }
    }

    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(day) = NaiveDate::parse_from_str(s, "%Y%m%d") {
            return day.format(DAY_FORMAT).to_string();
        }
    }

    UNKNOWN_DATE.to_string()
}

/// Parses any supported date string down to a bare calendar day.
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let canonical = canonicalize(raw);
    canonical
        .get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, DAY_FORMAT).ok())
}

/// Bare `YYYY-MM-DD`, or [`UNKNOWN_DATE`].
pub fn canonical_day(raw: &str) -> String {
    match parse_day(raw) {
        Some(day) => day.format(DAY_FORMAT).to_string(),
        None => UNKNOWN_DATE.to_string(),
    }
}

/// First 19xx/20xx year mentioned in a query.
pub fn query_year(query: &str) -> Option<i32> {
    YEAR_RE
        .captures(query)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub fn bucket_date(raw: &str) -> BucketDate {
    parse_day(raw).map_or(BucketDate::Unknown, BucketDate::Day)
}

/// Timeline grouping key. Variant order makes `Unknown` sort after every day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum BucketDate {
    Day(NaiveDate),
    Unknown,
}

impl fmt::Display for BucketDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketDate::Day(day) => write!(f, "{}", day.format(DAY_FORMAT)),
            BucketDate::Unknown => f.write_str(UNKNOWN_DATE),
        }
    }
}

impl From<BucketDate> for String {
    fn from(date: BucketDate) -> Self {
        date.to_string()
    }
}

impl From<String> for BucketDate {
    fn from(raw: String) -> Self {
        bucket_date(&raw)
    }
}
