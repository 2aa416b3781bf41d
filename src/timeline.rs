//! Timeline readout.
//!
//! Pure extraction: these functions read item rows, section headings and
//! overlay headers into plain data and never click anything. Rows show dates
//! without years; the year comes from the nearest preceding section heading
//! and, once an overlay is open, from the overlay's own header.

// ============================================================================
// Imports
// ============================================================================

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::config::Selectors;
use crate::date::{DateParts, extract_year_from_heading, parse_date_string};
use crate::page::{ElementRef, Page};

// ============================================================================
// Patterns
// ============================================================================

static LEADING_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d{1,2}[./]\d{1,2}(?:[./]\d{2,4})?\.?)\s*(.*)$")
        .expect("leading date pattern is valid")
});

static LEADING_SEPARATORS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s\-.:,·]+").expect("separator pattern is valid"));

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:19|20)\d{2}").expect("year pattern is valid"));

static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2}):(\d{2})").expect("time pattern is valid"));

// ============================================================================
// ItemContext
// ============================================================================

/// What the timeline shows about one item, before and after its overlay is
/// opened. The `modal_*` fields stay `None` until overlay enrichment runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemContext {
    /// Row title.
    pub title: Option<String>,
    /// Leading date fragment of the subtitle, e.g. `"05.03."`.
    pub date_fragment: Option<String>,
    /// Subtitle remainder after the date fragment.
    pub subtitle: Option<String>,
    /// Year from the nearest preceding section heading.
    pub year: Option<i32>,
    /// Exact year from the overlay header.
    pub modal_year: Option<i32>,
    /// Hour of day from the overlay header.
    pub modal_hour: Option<u32>,
    /// Minute from the overlay header.
    pub modal_minute: Option<u32>,
}

impl ItemContext {
    /// Resolves the item's calendar date for range filtering.
    ///
    /// `None` when the row showed no parseable date; the caller treats such
    /// items as always in range.
    #[must_use]
    pub fn resolved_date(&self, current_year: i32) -> Option<NaiveDate> {
        let fallback_year = self.modal_year.or(self.year).unwrap_or(current_year);
        self.date_fragment
            .as_deref()
            .and_then(|text| parse_date_string(text, fallback_year))
            .as_ref()
            .and_then(DateParts::to_naive_date)
    }
}

// ============================================================================
// Subtitle Splitting
// ============================================================================

/// Splits a row subtitle into its leading date fragment and the remainder.
///
/// Two shapes occur: a leading numeric date (`"05.03. Sparplan"`) and a
/// `" - "`-separated form (`"05.03. - Sparplan"` or `"Gestern - Sparplan"`).
/// Leading separators are stripped from the remainder. A subtitle with no
/// recognizable date yields `(None, Some(text))`.
#[must_use]
pub fn split_subtitle(text: &str) -> (Option<String>, Option<String>) {
    let text = text.trim();
    if text.is_empty() {
        return (None, None);
    }

    if let Some(caps) = LEADING_DATE_RE.captures(text) {
        let fragment = caps[1].trim().to_string();
        let rest = LEADING_SEPARATORS_RE.replace(&caps[2], "").trim().to_string();
        let rest = if rest.is_empty() { None } else { Some(rest) };
        return (Some(fragment), rest);
    }

    if let Some((left, right)) = text.split_once(" - ") {
        let left = left.trim();
        let right = right.trim();
        let fragment = if left.is_empty() { None } else { Some(left.to_string()) };
        let rest = if right.is_empty() { None } else { Some(right.to_string()) };
        return (fragment, rest);
    }

    (None, Some(text.to_string()))
}

// ============================================================================
// List Readout
// ============================================================================

/// Visible clickable timeline entries, in document order.
pub async fn list_items(page: &dyn Page, selectors: &Selectors) -> Vec<ElementRef> {
    let mut items = Vec::new();
    for element in page.query(&selectors.list_item).await {
        if element.rect().await.is_visible() {
            items.push(element);
        }
    }
    items
}

/// Year of the section heading nearest above `item`.
///
/// Headings and items interleave in document order; the last heading seen
/// before the item wins.
pub async fn section_year_for_item(
    page: &dyn Page,
    item: &ElementRef,
    selectors: &Selectors,
) -> Option<i32> {
    let combined = format!("{}, {}", selectors.section_heading, selectors.list_item);
    let mut year = None;
    for element in page.query(&combined).await {
        if element.matches(&selectors.section_heading).await {
            if let Some(found) = extract_year_from_heading(&element.text().await) {
                year = Some(found);
            }
        } else if element.contains(item).await {
            return year;
        }
    }
    None
}

/// Reads the pre-overlay context of one timeline item.
pub async fn item_context(
    page: &dyn Page,
    item: &ElementRef,
    selectors: &Selectors,
) -> ItemContext {
    let title = match item.query_first(&selectors.item_title).await {
        Some(element) => non_empty(element.text().await),
        None => None,
    };
    let (date_fragment, subtitle) = match item.query_first(&selectors.item_subtitle).await {
        Some(element) => split_subtitle(&element.text().await),
        None => (None, None),
    };
    let year = section_year_for_item(page, item, selectors).await;

    ItemContext {
        title,
        date_fragment,
        subtitle,
        year,
        ..ItemContext::default()
    }
}

/// Resolved date of the last loaded item, for the preload lower-bound stop.
pub async fn last_item_date(
    page: &dyn Page,
    selectors: &Selectors,
    current_year: i32,
) -> Option<NaiveDate> {
    let items = list_items(page, selectors).await;
    let last = items.last()?;
    let context = item_context(page, last, selectors).await;
    context.resolved_date(current_year)
}

// ============================================================================
// Overlay Readout
// ============================================================================

/// Year and time of day from the overlay's combined date/time header.
///
/// The year must not be the hour side of an `HH:MM` and must stand alone as
/// four digits.
pub async fn modal_time_info(
    overlay: &ElementRef,
    selectors: &Selectors,
) -> (Option<i32>, Option<u32>, Option<u32>) {
    let Some(header) = overlay.query_first(&selectors.modal_time_header).await else {
        return (None, None, None);
    };
    let text = header.text().await;
    (
        standalone_year(&text),
        TIME_RE
            .captures(&text)
            .and_then(|caps| caps[1].parse::<u32>().ok())
            .filter(|hour| *hour < 24),
        TIME_RE
            .captures(&text)
            .and_then(|caps| caps[2].parse::<u32>().ok())
            .filter(|minute| *minute < 60),
    )
}

/// First four-digit year in `text` that is not embedded in a longer digit
/// run and not immediately followed by a colon.
fn standalone_year(text: &str) -> Option<i32> {
    for found in YEAR_RE.find_iter(text) {
        let before = text[..found.start()].chars().next_back();
        let after = text[found.end()..].chars().next();
        if before.is_some_and(|c| c.is_ascii_digit()) {
            continue;
        }
        if after.is_some_and(|c| c.is_ascii_digit() || c == ':') {
            continue;
        }
        return found.as_str().parse().ok();
    }
    None
}

// ============================================================================
// Document Actions
// ============================================================================

/// One document action inside an open overlay.
pub struct DocAction {
    /// The clickable element.
    pub element: ElementRef,
    /// Declared title, falling back to `"Document N"`.
    pub title: String,
    /// Date text on the action itself, when the page variant shows one.
    pub date: Option<String>,
}

/// Visible document actions inside the open overlay.
pub async fn document_actions(overlay: &ElementRef, selectors: &Selectors) -> Vec<DocAction> {
    let mut actions = Vec::new();
    for element in overlay.query(&selectors.doc_action).await {
        if !element.rect().await.is_visible() {
            continue;
        }

        let title = match element.query_first(&selectors.doc_title).await {
            Some(child) => non_empty(child.text().await),
            None => None,
        };
        let title = match title {
            Some(title) => title,
            None => match element.attribute("title").await.and_then(non_empty) {
                Some(title) => title,
                None => format!("Document {}", actions.len() + 1),
            },
        };

        let date = match element.query_first(&selectors.doc_date).await {
            Some(child) => non_empty(child.text().await),
            None => None,
        };

        actions.push(DocAction { element, title, date });
    }
    actions
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_leading_numeric_date() {
        let (fragment, rest) = split_subtitle("05.03. Sparplan ausgeführt");
        assert_eq!(fragment.as_deref(), Some("05.03."));
        assert_eq!(rest.as_deref(), Some("Sparplan ausgeführt"));
    }

    #[test]
    fn test_split_dash_separated() {
        let (fragment, rest) = split_subtitle("Gestern - Sparplan");
        assert_eq!(fragment.as_deref(), Some("Gestern"));
        assert_eq!(rest.as_deref(), Some("Sparplan"));
    }

    #[test]
    fn test_split_date_then_dash() {
        let (fragment, rest) = split_subtitle("05.03. - Sparplan");
        assert_eq!(fragment.as_deref(), Some("05.03."));
        assert_eq!(rest.as_deref(), Some("Sparplan"));
    }

    #[test]
    fn test_split_no_date() {
        let (fragment, rest) = split_subtitle("Kauf ausgeführt");
        assert_eq!(fragment, None);
        assert_eq!(rest.as_deref(), Some("Kauf ausgeführt"));
    }

    #[test]
    fn test_split_empty() {
        assert_eq!(split_subtitle("   "), (None, None));
    }

    #[test]
    fn test_split_full_date_with_year() {
        let (fragment, rest) = split_subtitle("05.03.2024 Sparplan");
        assert_eq!(fragment.as_deref(), Some("05.03.2024"));
        assert_eq!(rest.as_deref(), Some("Sparplan"));
    }

    #[test]
    fn test_resolved_date_uses_heading_year() {
        let context = ItemContext {
            date_fragment: Some("05.03.".into()),
            year: Some(2023),
            ..ItemContext::default()
        };
        assert_eq!(
            context.resolved_date(2026),
            NaiveDate::from_ymd_opt(2023, 3, 5)
        );
    }

    #[test]
    fn test_resolved_date_modal_year_wins() {
        let context = ItemContext {
            date_fragment: Some("05.03.".into()),
            year: Some(2023),
            modal_year: Some(2022),
            ..ItemContext::default()
        };
        assert_eq!(
            context.resolved_date(2026),
            NaiveDate::from_ymd_opt(2022, 3, 5)
        );
    }

    #[test]
    fn test_resolved_date_none_without_fragment() {
        let context = ItemContext {
            year: Some(2023),
            ..ItemContext::default()
        };
        assert_eq!(context.resolved_date(2026), None);
    }

    #[test]
    fn test_resolved_date_invalid_calendar_day() {
        let context = ItemContext {
            date_fragment: Some("31.02.".into()),
            year: Some(2024),
            ..ItemContext::default()
        };
        assert_eq!(context.resolved_date(2026), None);
    }

    #[test]
    fn test_standalone_year() {
        assert_eq!(standalone_year("5. März 2024, 14:30"), Some(2024));
        // The hour side of a time is not a year.
        assert_eq!(standalone_year("um 2015:30 Uhr"), None);
        // Embedded in a longer digit run.
        assert_eq!(standalone_year("ID 920240001"), None);
        assert_eq!(standalone_year("kein Jahr"), None);
    }
}
