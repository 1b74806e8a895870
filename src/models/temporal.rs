//! Timestamp parsing and time-range filters.
//!
//! Agents send ISO-8601 strings with and without offsets (Python's
//! `datetime.isoformat()` omits the offset), so parsing accepts both and
//! treats offset-less values as UTC.

use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Naive layouts accepted after RFC 3339 fails.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Parses an ISO-8601 timestamp into UTC.
///
/// Accepts RFC 3339 (`2025-01-15T10:30:00Z`, `...+02:00`), naive
/// date-times (`2025-01-15T10:30:00.123`) and bare dates (`2025-01-15`,
/// midnight UTC).
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Raw `{start, end}` time range as sent by callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TimeRangeArgs {
    /// Inclusive lower bound (ISO-8601).
    pub start: Option<String>,
    /// Inclusive upper bound (ISO-8601).
    pub end: Option<String>,
}

/// A validated, inclusive time window. Either bound may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TimeRange {
    /// Inclusive lower bound.
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound.
    pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
    /// Creates a closed range.
    #[must_use]
    pub const fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Validates raw bounds; `field` names the argument in errors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if a bound is not a timestamp or if
    /// `start` is after `end`.
    pub fn from_args(args: &TimeRangeArgs, field: &str) -> Result<Self> {
        let parse = |raw: Option<&String>, bound: &str| -> Result<Option<DateTime<Utc>>> {
            raw.map(|value| {
                parse_timestamp(value).ok_or_else(|| {
                    Error::validation(
                        format!("{field}.{bound}"),
                        format!("expected an ISO-8601 timestamp, got '{value}'"),
                    )
                })
            })
            .transpose()
        };

        let range = Self {
            start: parse(args.start.as_ref(), "start")?,
            end: parse(args.end.as_ref(), "end")?,
        };

        if let (Some(start), Some(end)) = (range.start, range.end) {
            if start > end {
                return Err(Error::validation(field, "start must not be after end"));
            }
        }

        Ok(range)
    }

    /// Returns true if `ts` lies inside the window.
    #[must_use]
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start.is_none_or(|start| ts >= start) && self.end.is_none_or(|end| ts <= end)
    }

    /// Returns true if neither bound is set.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}
