//! Date range resolution.
//!
//! The range inputs are free text: sentinels for "from the beginning" and
//! "up to today", or literal dates in any form the date parser accepts. The
//! resolved range is normalized so the lower bound never exceeds the upper,
//! whichever way round the user typed them.

// ============================================================================
// Imports
// ============================================================================

use chrono::{Datelike, NaiveDate};

use crate::date::parse_date_string;
use crate::error::{Error, Result};

// ============================================================================
// RangeBound
// ============================================================================

/// One parsed range input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeBound {
    /// No constraint on this side.
    Open,
    /// A concrete calendar date.
    Date(NaiveDate),
}

/// Parses one range input.
///
/// Sentinels (case-insensitive): empty, `start`/`anfang`, `end`/`ende` mean
/// open; `today`/`heute` mean the current date. Anything else must parse as
/// a literal date or the run aborts with [`Error::InvalidDate`] naming the
/// offending field.
pub fn parse_bound(field: &str, input: &str, today: NaiveDate) -> Result<RangeBound> {
    let normalized = input.trim().to_lowercase();
    match normalized.as_str() {
        "" | "start" | "anfang" | "end" | "ende" => Ok(RangeBound::Open),
        "today" | "heute" => Ok(RangeBound::Date(today)),
        _ => parse_date_string(input, today.year())
            .and_then(|parts| parts.to_naive_date())
            .map(RangeBound::Date)
            .ok_or_else(|| Error::invalid_date(field, input)),
    }
}

// ============================================================================
// RunRange
// ============================================================================

/// Normalized date range of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunRange {
    lower: Option<NaiveDate>,
    upper: Option<NaiveDate>,
}

impl RunRange {
    /// Resolves both inputs and normalizes their order.
    pub fn resolve(from: &str, to: &str, today: NaiveDate) -> Result<Self> {
        let from = parse_bound("from", from, today)?;
        let to = parse_bound("to", to, today)?;

        let (lower, upper) = match (from, to) {
            (RangeBound::Date(a), RangeBound::Date(b)) if a > b => (Some(b), Some(a)),
            (RangeBound::Date(a), RangeBound::Date(b)) => (Some(a), Some(b)),
            (RangeBound::Date(a), RangeBound::Open) => (Some(a), None),
            (RangeBound::Open, RangeBound::Date(b)) => (None, Some(b)),
            (RangeBound::Open, RangeBound::Open) => (None, None),
        };
        Ok(Self { lower, upper })
    }

    /// Whether `date` falls inside the range, bounds inclusive.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.lower.is_none_or(|lower| date >= lower)
            && self.upper.is_none_or(|upper| date <= upper)
    }

    /// Lower bound, if any. Drives the preload stop.
    #[inline]
    #[must_use]
    pub fn lower(&self) -> Option<NaiveDate> {
        self.lower
    }

    /// Upper bound, if any.
    #[inline]
    #[must_use]
    pub fn upper(&self) -> Option<NaiveDate> {
        self.upper
    }

    /// Whether both sides are open.
    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.lower.is_none() && self.upper.is_none()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        day(2024, 6, 15)
    }

    #[test]
    fn test_sentinels() {
        assert_eq!(parse_bound("from", "", today()).unwrap(), RangeBound::Open);
        assert_eq!(parse_bound("from", "Start", today()).unwrap(), RangeBound::Open);
        assert_eq!(parse_bound("from", "ANFANG", today()).unwrap(), RangeBound::Open);
        assert_eq!(parse_bound("to", "ende", today()).unwrap(), RangeBound::Open);
        assert_eq!(
            parse_bound("to", "heute", today()).unwrap(),
            RangeBound::Date(today())
        );
        assert_eq!(
            parse_bound("to", "Today", today()).unwrap(),
            RangeBound::Date(today())
        );
    }

    #[test]
    fn test_literal_date() {
        assert_eq!(
            parse_bound("from", "01.03.2024", today()).unwrap(),
            RangeBound::Date(day(2024, 3, 1))
        );
        // Missing year falls back to today's year.
        assert_eq!(
            parse_bound("from", "01.03.", today()).unwrap(),
            RangeBound::Date(day(2024, 3, 1))
        );
    }

    #[test]
    fn test_invalid_literal_names_field() {
        let err = parse_bound("from", "gibberish", today()).unwrap_err();
        match err {
            Error::InvalidDate { field, value } => {
                assert_eq!(field, "from");
                assert_eq!(value, "gibberish");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_resolution_is_order_independent() {
        let forward = RunRange::resolve("01.01.2024", "31.01.2024", today()).unwrap();
        let reversed = RunRange::resolve("31.01.2024", "01.01.2024", today()).unwrap();
        assert_eq!(forward, reversed);
        assert_eq!(forward.lower(), Some(day(2024, 1, 1)));
        assert_eq!(forward.upper(), Some(day(2024, 1, 31)));
    }

    #[test]
    fn test_contains_bounds_inclusive() {
        let range = RunRange::resolve("02.01.2024", "04.01.2024", today()).unwrap();
        assert!(!range.contains(day(2024, 1, 1)));
        assert!(range.contains(day(2024, 1, 2)));
        assert!(range.contains(day(2024, 1, 4)));
        assert!(!range.contains(day(2024, 1, 5)));
    }

    #[test]
    fn test_open_range_contains_everything() {
        let range = RunRange::resolve("start", "end", today()).unwrap();
        assert!(range.is_unbounded());
        assert!(range.contains(day(1999, 1, 1)));
        assert!(range.contains(day(2199, 12, 31)));
    }

    #[test]
    fn test_half_open_range() {
        let range = RunRange::resolve("01.06.2024", "heute", today()).unwrap();
        assert!(!range.contains(day(2024, 5, 31)));
        assert!(range.contains(day(2024, 6, 15)));
        assert!(!range.contains(day(2024, 6, 16)));
    }
}
