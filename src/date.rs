//! Free-text date parsing and token formatting.
//!
//! Timeline rows and document buttons expose dates as locale-dependent text
//! fragments ("20.12.", "03/05/2024", "5. März"). This module reconstructs a
//! canonical [`DateParts`] from such fragments and formats it back through a
//! `YYYY`/`YY`/`MM`/`DD`/`hh`/`mm` token template.
//!
//! # Example
//!
//! ```
//! use docharvest::date::{parse_date_string, format_date_parts};
//!
//! let parts = parse_date_string("15/03/2024", 2024).unwrap();
//! assert_eq!((parts.day, parts.month, parts.year), (15, 3, 2024));
//!
//! assert_eq!(format_date_parts(&parts, "YYYY-MM-DD"), "2024-03-15");
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::{Captures, Regex};

// ============================================================================
// Regexes
// ============================================================================

/// Slash-separated `D/M[/Y]` fragment.
static SLASH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})/(\d{1,2})(?:/(\d{2,4}))?").expect("slash date regex"));

/// Day-first dotted `D.M.[YY[YY]]` fragment.
static DOT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})\.(\d{1,2})\.?(\d{2,4})?").expect("dotted date regex"));

/// `D. <MonthName>` fragment.
static DAY_MONTH_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,2})\.\s*([A-Za-zÄÖÜäöüß]+)").expect("month name date regex")
});

/// Date/time format tokens, longest-match first.
static FORMAT_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"YYYY|YY|MM|DD|hh|mm").expect("format token regex"));

/// Runs of separators left behind by empty token substitutions.
static SEPARATOR_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([._\-])[._\-]+").expect("separator run regex"));

/// Trailing separators after token substitution.
static TRAILING_SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[._\-]+$").expect("trailing separator regex"));

/// A calendar year (not the hour part of an `HH:MM` time).
static HEADING_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"((?:19|20)\d{2})").expect("heading year regex"));

// ============================================================================
// DateParts
// ============================================================================

/// Canonical date intermediate shared by the range filter and the filename
/// formatter.
///
/// Never partially valid: parsing either resolves day, month and year, or
/// fails entirely. Hour and minute are only present when a modal header
/// revealed a time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateParts {
    /// Four-digit calendar year.
    pub year: i32,
    /// Month, 1-12.
    pub month: u32,
    /// Day of month, 1-31.
    pub day: u32,
    /// Hour of day, if a time was available.
    pub hour: Option<u32>,
    /// Minute, if a time was available.
    pub minute: Option<u32>,
}

impl DateParts {
    /// Creates date parts without a time of day.
    #[inline]
    #[must_use]
    pub const fn new(year: i32, month: u32, day: u32) -> Self {
        Self {
            year,
            month,
            day,
            hour: None,
            minute: None,
        }
    }

    /// Converts to a calendar date for range comparison.
    ///
    /// Returns `None` for calendar-invalid triples such as February 31st.
    #[must_use]
    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }
}

// ============================================================================
// Month Names
// ============================================================================

/// Normalizes a month name for table lookup.
///
/// Lowercases, expands umlaut digraphs (ä→ae, ö→oe, ü→ue, ß→ss), folds the
/// common acute/grave/circumflex accents, and drops whitespace.
#[must_use]
pub fn normalize_month_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars().flat_map(char::to_lowercase) {
        match c {
            'ä' => out.push_str("ae"),
            'ö' => out.push_str("oe"),
            'ü' => out.push_str("ue"),
            'ß' => out.push_str("ss"),
            'á' | 'à' | 'â' => out.push('a'),
            'é' | 'è' | 'ê' => out.push('e'),
            'í' | 'ì' | 'î' => out.push('i'),
            'ó' | 'ò' | 'ô' => out.push('o'),
            'ú' | 'ù' | 'û' => out.push('u'),
            c if c.is_whitespace() => {}
            c => out.push(c),
        }
    }
    out
}

/// Looks up a month number from its normalized name.
///
/// Fixed 12-entry table; "december" is accepted as an alias alongside
/// "dezember" because both appear in the wild on the same timeline.
#[must_use]
pub fn month_from_name(name: &str) -> Option<u32> {
    let month = match normalize_month_name(name).as_str() {
        "januar" => 1,
        "februar" => 2,
        "maerz" => 3,
        "april" => 4,
        "mai" => 5,
        "juni" => 6,
        "juli" => 7,
        "august" => 8,
        "september" => 9,
        "oktober" => 10,
        "november" => 11,
        "dezember" | "december" => 12,
        _ => return None,
    };
    Some(month)
}

// ============================================================================
// Parsing
// ============================================================================

/// Parses a free-text date fragment into [`DateParts`].
///
/// Accepted forms, tried in order:
///
/// 1. Slash `D/M[/Y]`. If one component exceeds 12 it is unambiguously the
///    day; when both are ≤ 12 the day/month order is assumed (policy choice,
///    not inferred).
/// 2. Dotted day-first `D.M.[YY[YY]]`.
/// 3. `D. <MonthName>` against the fixed month table.
///
/// Two-digit years are promoted by adding 2000. A missing year falls back to
/// `fallback_year`. Missing or out-of-range day/month fails the whole parse.
/// Never panics; unparseable input returns `None`.
#[must_use]
pub fn parse_date_string(text: &str, fallback_year: i32) -> Option<DateParts> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let mut day: Option<u32> = None;
    let mut month: Option<u32> = None;
    let mut year: Option<i32> = None;

    if let Some(caps) = SLASH_RE.captures(text) {
        let a: u32 = caps.get(1)?.as_str().parse().ok()?;
        let b: u32 = caps.get(2)?.as_str().parse().ok()?;
        // Component > 12 forces its role; day-first otherwise.
        if a > 12 && b <= 12 {
            day = Some(a);
            month = Some(b);
        } else if b > 12 && a <= 12 {
            day = Some(b);
            month = Some(a);
        } else {
            day = Some(a);
            month = Some(b);
        }
        year = parse_year_capture(&caps);
    }

    if day.is_none() || month.is_none() {
        if let Some(caps) = DOT_RE.captures(text) {
            day = caps.get(1).and_then(|m| m.as_str().parse().ok());
            month = caps.get(2).and_then(|m| m.as_str().parse().ok());
            year = parse_year_capture(&caps);
        }
    }

    if day.is_none() || month.is_none() {
        if let Some(caps) = DAY_MONTH_NAME_RE.captures(text) {
            day = caps.get(1).and_then(|m| m.as_str().parse().ok());
            month = caps.get(2).and_then(|m| month_from_name(m.as_str()));
        }
    }

    let (day, month) = (day?, month?);
    if !(1..=31).contains(&day) || !(1..=12).contains(&month) {
        return None;
    }

    Some(DateParts::new(year.unwrap_or(fallback_year), month, day))
}

/// Extracts an optional two-or-four-digit year from the third capture group.
fn parse_year_capture(caps: &Captures<'_>) -> Option<i32> {
    let year: i32 = caps.get(3)?.as_str().parse().ok()?;
    Some(if year < 100 { year + 2000 } else { year })
}

/// Extracts the first plausible calendar year from a section heading.
///
/// Returns `None` if the heading carries no `19xx`/`20xx` year.
#[must_use]
pub fn extract_year_from_heading(text: &str) -> Option<i32> {
    HEADING_YEAR_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

// ============================================================================
// Resolution
// ============================================================================

/// Text sources a date can be reconstructed from, in priority order.
///
/// Built from the pending capture metadata: the document button may expose
/// its own date text, the timeline row carries a coarse fragment, the section
/// heading supplies the year, and an open overlay header may reveal an exact
/// year and time the list row lacks.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateSources<'a> {
    /// Date text on the document button itself, if any.
    pub doc_date: Option<&'a str>,
    /// Date fragment from the timeline row subtitle.
    pub item_date: Option<&'a str>,
    /// Year inferred from the nearest preceding section heading.
    pub item_year: Option<i32>,
    /// Exact year from the overlay header, overrides the coarse year.
    pub modal_year: Option<i32>,
    /// Hour of day from the overlay header.
    pub modal_hour: Option<u32>,
    /// Minute from the overlay header.
    pub modal_minute: Option<u32>,
}

/// Resolves [`DateParts`] from heterogeneous sources.
///
/// Tries the document's own date text first, then the item's. The modal year,
/// when present, wins over the section-heading year as the fallback; modal
/// hour/minute attach a time of day to whatever date resolved.
#[must_use]
pub fn resolve_date_parts(sources: &DateSources<'_>, current_year: i32) -> Option<DateParts> {
    let fallback_year = sources
        .modal_year
        .or(sources.item_year)
        .unwrap_or(current_year);

    let mut parts = sources
        .doc_date
        .and_then(|text| parse_date_string(text, fallback_year))
        .or_else(|| {
            sources
                .item_date
                .and_then(|text| parse_date_string(text, fallback_year))
        })?;

    parts.hour = sources.modal_hour;
    parts.minute = sources.modal_minute;
    Some(parts)
}

// ============================================================================
// Formatting
// ============================================================================

/// Formats [`DateParts`] through a token template.
///
/// Substitutes `YYYY`, `YY`, `MM`, `DD`, `hh`, `mm` literally; everything but
/// `YYYY` is zero-padded to two digits. Unresolved hour/minute tokens expand
/// to nothing, and the separator runs they leave behind collapse so a format
/// like `YYYY-MM-DD_hhmm` degrades to `YYYY-MM-DD` instead of trailing a `_`.
#[must_use]
pub fn format_date_parts(parts: &DateParts, format: &str) -> String {
    let substituted = FORMAT_TOKEN_RE.replace_all(format, |caps: &Captures<'_>| {
        match caps.get(0).map_or("", |m| m.as_str()) {
            "YYYY" => parts.year.to_string(),
            "YY" => format!("{:02}", parts.year.rem_euclid(100)),
            "MM" => format!("{:02}", parts.month),
            "DD" => format!("{:02}", parts.day),
            "hh" => parts.hour.map_or_else(String::new, |h| format!("{h:02}")),
            "mm" => parts.minute.map_or_else(String::new, |m| format!("{m:02}")),
            other => other.to_string(),
        }
    });

    let collapsed = SEPARATOR_RUN_RE.replace_all(&substituted, "$1");
    TRAILING_SEPARATOR_RE.replace(&collapsed, "").into_owned()
}

// ============================================================================
// Tests
// ============================================================================
