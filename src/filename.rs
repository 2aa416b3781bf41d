//! Download filename construction.
//!
//! Expands the user's template (`{title}`, `{date}`, `{subtitle}`, `{doc}`)
//! against captured metadata, sanitizes the result for the filesystem, and
//! enforces a `.pdf` extension. When custom naming is off, the name is taken
//! from the final path segment of the download URL.

// ============================================================================
// Imports
// ============================================================================

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::config::Config;
use crate::date::{format_date_parts, resolve_date_parts};
use crate::intercept::PendingDownloadMeta;

// ============================================================================
// Constants
// ============================================================================

/// Name used when everything else comes up empty.
const FALLBACK_STEM: &str = "document";

static ILLEGAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[\\/:*?"<>|\x00-\x1f]"#).expect("filename char pattern is valid")
});

static COLLAPSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s_]+").expect("whitespace run pattern is valid"));

static EDGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^_+|_+$").expect("edge underscore pattern is valid"));

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{(\w+)\}").expect("template token pattern is valid")
});

// ============================================================================
// Sanitization
// ============================================================================

/// Makes `raw` safe as a filename stem.
///
/// Characters illegal on common filesystems and control characters become
/// underscores, runs of whitespace and underscores collapse to a single
/// underscore, and edge
/// underscores are trimmed. An empty result becomes `"document"`. The
/// function is idempotent: sanitizing a sanitized name is a no-op.
#[must_use]
pub fn sanitize_filename(raw: &str) -> String {
    let replaced = ILLEGAL_RE.replace_all(raw, "_");
    let collapsed = COLLAPSE_RE.replace_all(&replaced, "_");
    let trimmed = EDGE_RE.replace_all(&collapsed, "");
    if trimmed.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        trimmed.into_owned()
    }
}

// ============================================================================
// Name Construction
// ============================================================================

/// Builds the final download filename for a captured navigation.
///
/// With custom naming enabled, template tokens are expanded case
/// insensitively; tokens whose metadata is absent, and tokens the engine
/// does not know, vanish (the sanitizer collapses the leftover separators).
/// With custom naming disabled, or when expansion produces nothing usable,
/// the URL's final path segment supplies the stem. The result always ends
/// in `.pdf`.
#[must_use]
pub fn build_download_name(meta: &PendingDownloadMeta, url: &str, config: &Config) -> String {
    let stem = if config.use_custom_names {
        let expanded = expand_template(meta, url, config);
        let clean = sanitize_filename(&expanded);
        if clean == FALLBACK_STEM {
            meta.doc_title
                .as_deref()
                .map(sanitize_filename)
                .filter(|s| s.as_str() != FALLBACK_STEM)
                .or_else(|| url_stem(url).map(|tail| sanitize_filename(&tail)))
                .unwrap_or(clean)
        } else {
            clean
        }
    } else {
        url_stem(url).map_or_else(|| FALLBACK_STEM.to_string(), |tail| sanitize_filename(&tail))
    };
    ensure_pdf(&stem)
}

/// Expands template tokens against the captured metadata.
///
/// The `{doc}` token backfills from the URL tail when no document title was
/// captured; a date that fails to resolve leaves the raw fragment in place so
/// the name still carries whatever the page showed.
fn expand_template(meta: &PendingDownloadMeta, url: &str, config: &Config) -> String {
    let date = resolve_date_parts(&meta.date_sources(), current_year())
        .map(|parts| format_date_parts(&parts, &config.date_format))
        .or_else(|| meta.doc_date.clone())
        .or_else(|| meta.item_date.clone())
        .unwrap_or_default();

    TOKEN_RE
        .replace_all(&config.filename_template, |caps: &regex::Captures<'_>| {
            let token = caps[1].to_ascii_lowercase();
            match token.as_str() {
                "title" => meta.item_title.clone().unwrap_or_default(),
                "subtitle" => meta.item_subtitle.clone().unwrap_or_default(),
                "doc" => meta
                    .doc_title
                    .clone()
                    .or_else(|| url_stem(url))
                    .unwrap_or_default(),
                "date" => date.clone(),
                _ => String::new(),
            }
        })
        .into_owned()
}

/// Extracts the final path segment of the URL, without query or extension.
fn url_stem(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.filter(|s| !s.is_empty()).next_back()?;
    let stem = segment.strip_suffix(".pdf").unwrap_or(segment);
    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}

/// Appends `.pdf` unless already present (case insensitive).
fn ensure_pdf(stem: &str) -> String {
    if stem.to_ascii_lowercase().ends_with(".pdf") {
        stem.to_string()
    } else {
        format!("{stem}.pdf")
    }
}

fn current_year() -> i32 {
    use chrono::Datelike;
    chrono::Local::now().year()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    fn meta() -> PendingDownloadMeta {
        PendingDownloadMeta {
            doc_title: Some("Abrechnung".into()),
            doc_date: Some("05.03.2024".into()),
            doc_index: 1,
            doc_total: 1,
            item_title: Some("Kauf".into()),
            item_date: None,
            item_subtitle: Some("Sparplan".into()),
            item_year: None,
            modal_year: None,
            modal_hour: None,
            modal_minute: None,
        }
    }

    fn config() -> Config {
        Config {
            date_format: "YYYY-MM-DD".into(),
            ..Config::default()
        }
    }

    #[test]
    fn test_sanitize_replaces_illegal_chars() {
        assert_eq!(sanitize_filename("a/b\\c:d*e?f\"g<h>i|j"), "a_b_c_d_e_f_g_h_i_j");
    }

    #[test]
    fn test_sanitize_collapses_runs_and_trims_edges() {
        assert_eq!(sanitize_filename("  Kauf   Sparplan  "), "Kauf_Sparplan");
        assert_eq!(sanitize_filename("__a___b__"), "a_b");
    }

    #[test]
    fn test_sanitize_empty_falls_back() {
        assert_eq!(sanitize_filename(""), "document");
        assert_eq!(sanitize_filename("  __  "), "document");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let once = sanitize_filename("a / b : c");
        assert_eq!(sanitize_filename(&once), once);
    }

    #[test]
    fn test_build_expands_all_tokens() {
        let name = build_download_name(&meta(), "https://host/x.pdf", &config());
        assert_eq!(name, "2024-03-05_Kauf_Sparplan_Abrechnung.pdf");
    }

    #[test]
    fn test_build_tokens_case_insensitive() {
        let cfg = Config {
            filename_template: "{DOC}_{Title}".into(),
            ..config()
        };
        let name = build_download_name(&meta(), "https://host/x.pdf", &cfg);
        assert_eq!(name, "Abrechnung_Kauf.pdf");
    }

    #[test]
    fn test_build_missing_metadata_token_vanishes() {
        let mut m = meta();
        m.item_subtitle = None;
        let name = build_download_name(&m, "https://host/x.pdf", &config());
        assert_eq!(name, "2024-03-05_Kauf_Abrechnung.pdf");
    }

    #[test]
    fn test_build_unknown_token_vanishes() {
        let cfg = Config {
            filename_template: "{doc}_{bogus}".into(),
            ..config()
        };
        let name = build_download_name(&meta(), "https://host/x.pdf", &cfg);
        assert_eq!(name, "Abrechnung.pdf");
    }

    #[test]
    fn test_build_empty_expansion_uses_url_tail() {
        let empty = PendingDownloadMeta {
            doc_index: 1,
            doc_total: 1,
            ..PendingDownloadMeta::default()
        };
        let name = build_download_name(
            &empty,
            "https://host/statements/report-2024.pdf?sig=abc",
            &config(),
        );
        assert_eq!(name, "report-2024.pdf");
    }

    #[test]
    fn test_build_custom_names_off_uses_url_tail() {
        let cfg = Config {
            use_custom_names: false,
            ..config()
        };
        let name = build_download_name(&meta(), "https://host/a/b/statement.pdf", &cfg);
        assert_eq!(name, "statement.pdf");
    }

    proptest! {
        // Sanitized names never carry filesystem-hostile characters, and
        // sanitizing twice changes nothing.
        #[test]
        fn prop_sanitize_clean_and_idempotent(raw in ".{0,64}") {
            let clean = sanitize_filename(&raw);
            prop_assert!(!clean.is_empty());
            prop_assert!(!clean.contains(['\\', '/', ':', '*', '?', '"', '<', '>', '|']));
            prop_assert!(!clean.chars().any(|c| ('\x00'..='\x1f').contains(&c)));
            prop_assert_eq!(sanitize_filename(&clean), clean);
        }
    }

    #[test]
    fn test_build_unparseable_url_falls_back() {
        let cfg = Config {
            use_custom_names: false,
            ..config()
        };
        let name = build_download_name(&meta(), "not a url", &cfg);
        assert_eq!(name, "document.pdf");
    }
}
