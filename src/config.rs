//! Run configuration and persisted settings.
//!
//! A [`Config`] is an immutable snapshot taken at run start: the orchestrator
//! never re-reads live settings mid-run (the cooperative stop flag is the one
//! exception, and it lives outside the config).
//!
//! Selector strings and route paths are configuration, not core logic. The
//! defaults carry the values for the site this crate was written against, and
//! an embedder pointing the engine at a different timeline swaps them out
//! wholesale.
//!
//! # Example
//!
//! ```
//! use docharvest::config::Config;
//!
//! let config = Config::default();
//! assert!(config.use_custom_names);
//! assert_eq!(config.filename_template, "{date}_{title}_{subtitle}_{doc}");
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Settings Keys
// ============================================================================

/// Well-known keys in the persisted settings store.
pub mod keys {
    /// Filename template (`{title}`, `{date}`, `{subtitle}`, `{doc}`).
    pub const FILENAME_TEMPLATE: &str = "docharvest_filename_template";
    /// Date/time format (`YYYY`, `YY`, `MM`, `DD`, `hh`, `mm`).
    pub const DATE_FORMAT: &str = "docharvest_date_format";
    /// Whether downloads are renamed through the template.
    pub const USE_CUSTOM_NAMES: &str = "docharvest_use_custom_names";
    /// UI language preference, round-tripped for the embedder.
    pub const LANGUAGE: &str = "docharvest_lang";
    /// Last-used lower range bound input.
    pub const RANGE_FROM: &str = "docharvest_range_from";
    /// Last-used upper range bound input.
    pub const RANGE_TO: &str = "docharvest_range_to";
}

// ============================================================================
// SettingsStore
// ============================================================================

/// Persisted user preferences, string values by key.
///
/// External collaborator: the engine only reads/writes strings and defaults
/// each key independently when it is absent or invalid. The backing store
/// (browser local storage, a file, an in-memory map) is the embedder's
/// concern.
pub trait SettingsStore: Send + Sync {
    /// Returns the stored value for `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`.
    fn set(&self, key: &str, value: &str);
}

// ============================================================================
// Selectors
// ============================================================================

/// CSS selectors binding the engine to a concrete host page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selectors {
    /// Clickable timeline entries.
    pub list_item: String,
    /// Class marking document actions, excluded from the list query.
    pub doc_action_marker: String,
    /// Document-download actions inside an open overlay.
    pub doc_action: String,
    /// Title child of a document action.
    pub doc_title: String,
    /// Date text child of a document action, when the variant exposes one.
    pub doc_date: String,
    /// Overlay/modal container candidates.
    pub overlay: String,
    /// Backdrop of the active overlay.
    pub backdrop: String,
    /// Recognized close controls.
    pub close_control: String,
    /// Title child of a timeline entry.
    pub item_title: String,
    /// Subtitle child of a timeline entry (date fragment + remainder).
    pub item_subtitle: String,
    /// Section headings that bound items by calendar year.
    pub section_heading: String,
    /// Overlay header element exposing a combined date/time string.
    pub modal_time_header: String,
    /// Root of the timeline; its absence signals session loss.
    pub timeline_root: String,
    /// Candidates for the route tab controls.
    pub route_tab: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            list_item: ".clickable.timelineEventAction:not(.detailDocuments__action)".into(),
            doc_action_marker: "detailDocuments__action".into(),
            doc_action: ".clickable.timelineEventAction.detailDocuments__action".into(),
            doc_title: ".detailDocuments__documentTitle".into(),
            doc_date: ".detailDocuments__documentDate".into(),
            overlay: ".sideModal, [class*=\"sideModal\"], [role=\"dialog\"], .modal, [class*=\"Modal\"]"
                .into(),
            backdrop: ".sideModal__backdrop, .barrier.-sideModal, [class*=\"backdrop\"]".into(),
            close_control: "button.closeButton.sideModal__close, .closeButton.sideModal__close, \
                            .sideModal__close, [aria-label=\"Close\"], [aria-label=\"Schließen\"]"
                .into(),
            item_title: ".timelineV2Event__title".into(),
            item_subtitle: ".timelineV2Event__subtitle".into(),
            section_heading: "h2.timelineMonthDivider".into(),
            modal_time_header: ".detailHeader__subheading.-time, p.detailHeader__subheading".into(),
            timeline_root: ".timeline, .timeline__entries, ol.timeline__entries".into(),
            route_tab: "a[href], button, [role=\"tab\"], [data-qa*=\"tab\"]".into(),
        }
    }
}

// ============================================================================
// Routes
// ============================================================================

/// Routes the run can be pinned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routes {
    /// Transactions tab path.
    pub transactions: String,
    /// Activities tab path.
    pub activities: String,
    /// Visible label of the transactions tab control.
    pub transactions_label: String,
    /// Visible label of the activities tab control.
    pub activities_label: String,
}

impl Default for Routes {
    fn default() -> Self {
        Self {
            transactions: "/profile/transactions".into(),
            activities: "/profile/activities".into(),
            transactions_label: "Transaktionen".into(),
            activities_label: "Aktivität".into(),
        }
    }
}

impl Routes {
    /// Picks the route to pin based on where the page currently is.
    #[must_use]
    pub fn desired_for_path(&self, current_path: &str) -> String {
        if current_path.contains("/activities") {
            self.activities.clone()
        } else {
            self.transactions.clone()
        }
    }

    /// Returns `true` if `path` is one of the authenticated timeline routes.
    #[must_use]
    pub fn is_timeline_path(&self, path: &str) -> bool {
        path.starts_with(&self.transactions) || path.starts_with(&self.activities)
    }

    /// Returns the visible tab label for a route path.
    #[must_use]
    pub fn label_for(&self, path: &str) -> &str {
        if path.ends_with("/activities") {
            &self.activities_label
        } else {
            &self.transactions_label
        }
    }
}

// ============================================================================
// Timings
// ============================================================================

/// Pacing profile: every wait the engine performs is one of these bounded
/// delays or poll windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingProfile {
    /// Settle delay after clicking a timeline item.
    pub open_settle: Duration,
    /// Gap between document-action clicks.
    pub doc_click_gap: Duration,
    /// Delay after closing an overlay before the next item.
    pub close_settle: Duration,
    /// Short pace at the end of each item iteration.
    pub item_pace: Duration,
    /// Settle delay after triggering an incremental list load.
    pub scroll_settle: Duration,
    /// Delay after focusing a document action before clicking it.
    pub focus_delay: Duration,
    /// Poll interval while waiting for an overlay to appear.
    pub overlay_poll: Duration,
    /// Window to confirm an overlay is gone after a close attempt.
    pub close_check_window: Duration,
    /// Gap after a backdrop click before re-checking.
    pub backdrop_click_gap: Duration,
}

impl TimingProfile {
    /// The slow profile, tuned for reliability on a loaded page.
    #[must_use]
    pub const fn slow() -> Self {
        Self {
            open_settle: Duration::from_millis(900),
            doc_click_gap: Duration::from_millis(900),
            close_settle: Duration::from_millis(900),
            item_pace: Duration::from_millis(120),
            scroll_settle: Duration::from_millis(500),
            focus_delay: Duration::from_millis(80),
            overlay_poll: Duration::from_millis(50),
            close_check_window: Duration::from_millis(500),
            backdrop_click_gap: Duration::from_millis(80),
        }
    }

    /// The fast profile, for pages that keep up.
    #[must_use]
    pub const fn fast() -> Self {
        Self {
            open_settle: Duration::from_millis(300),
            doc_click_gap: Duration::from_millis(220),
            close_settle: Duration::from_millis(300),
            item_pace: Duration::from_millis(60),
            scroll_settle: Duration::from_millis(300),
            focus_delay: Duration::from_millis(40),
            overlay_poll: Duration::from_millis(40),
            close_check_window: Duration::from_millis(300),
            backdrop_click_gap: Duration::from_millis(60),
        }
    }
}

/// All timing knobs: the two pacing profiles plus the fixed windows that do
/// not vary with slow mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timings {
    /// Slow pacing profile.
    pub slow: TimingProfile,
    /// Fast pacing profile.
    pub fast: TimingProfile,
    /// Ceiling for overlay appearance after a click.
    pub overlay_ceiling: Duration,
    /// Wait after a route re-assertion before re-checking the path.
    pub route_fix: Duration,
    /// Auto-expiry of an armed capture slot with no navigation.
    pub capture_expiry: Duration,
    /// Grace period before force-closing a popup tied to no capture.
    pub popup_grace: Duration,
    /// Poll interval for overlay-gone confirmation.
    pub overlay_gone_poll: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            slow: TimingProfile::slow(),
            fast: TimingProfile::fast(),
            overlay_ceiling: Duration::from_secs(5),
            route_fix: Duration::from_millis(800),
            capture_expiry: Duration::from_secs(10),
            popup_grace: Duration::from_millis(1500),
            overlay_gone_poll: Duration::from_millis(40),
        }
    }
}

// ============================================================================
// Config
// ============================================================================

/// Default filename template.
pub const DEFAULT_FILENAME_TEMPLATE: &str = "{date}_{title}_{subtitle}_{doc}";

/// Default date/time format.
pub const DEFAULT_DATE_FORMAT: &str = "YYYY-MM-DD_hhmm";

/// Immutable run configuration snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Filename template expanded per captured download.
    pub filename_template: String,
    /// Date/time token format for the `{date}` token.
    pub date_format: String,
    /// Rename downloads through the template instead of the URL tail.
    pub use_custom_names: bool,
    /// Trigger incremental list loading before iterating.
    pub auto_load_more: bool,
    /// Use the slow pacing profile.
    pub slow_mode: bool,
    /// Re-assert the pinned route when the page navigates away.
    pub lock_tab: bool,
    /// UI language preference ("en"/"de"), stored for the embedder.
    pub language: String,
    /// Last-used free-text lower bound.
    pub range_from: String,
    /// Last-used free-text upper bound.
    pub range_to: String,
    /// Host page selectors.
    pub selectors: Selectors,
    /// Route pinning.
    pub routes: Routes,
    /// All pacing and poll windows.
    pub timings: Timings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            filename_template: DEFAULT_FILENAME_TEMPLATE.into(),
            date_format: DEFAULT_DATE_FORMAT.into(),
            use_custom_names: true,
            auto_load_more: true,
            slow_mode: true,
            lock_tab: true,
            language: "en".into(),
            range_from: String::new(),
            range_to: String::new(),
            selectors: Selectors::default(),
            routes: Routes::default(),
            timings: Timings::default(),
        }
    }
}

impl Config {
    /// Returns the active pacing profile.
    #[inline]
    #[must_use]
    pub fn pace(&self) -> &TimingProfile {
        if self.slow_mode {
            &self.timings.slow
        } else {
            &self.timings.fast
        }
    }

    /// Builds a config from the settings store.
    ///
    /// Each key defaults independently: an absent or unparseable value falls
    /// back without disturbing the others.
    #[must_use]
    pub fn from_store(store: &dyn SettingsStore) -> Self {
        let mut config = Self::default();

        if let Some(template) = store.get(keys::FILENAME_TEMPLATE)
            && !template.trim().is_empty()
        {
            config.filename_template = template;
        }
        if let Some(format) = store.get(keys::DATE_FORMAT)
            && !format.trim().is_empty()
        {
            config.date_format = format;
        }
        if let Some(flag) = store.get(keys::USE_CUSTOM_NAMES) {
            config.use_custom_names = parse_bool(&flag).unwrap_or(config.use_custom_names);
        }
        if let Some(lang) = store.get(keys::LANGUAGE)
            && (lang == "en" || lang == "de")
        {
            config.language = lang;
        }
        if let Some(from) = store.get(keys::RANGE_FROM) {
            config.range_from = from;
        }
        if let Some(to) = store.get(keys::RANGE_TO) {
            config.range_to = to;
        }

        config
    }

    /// Writes the user-editable settings back to the store.
    pub fn persist(&self, store: &dyn SettingsStore) {
        store.set(keys::FILENAME_TEMPLATE, &self.filename_template);
        store.set(keys::DATE_FORMAT, &self.date_format);
        store.set(
            keys::USE_CUSTOM_NAMES,
            if self.use_custom_names { "true" } else { "false" },
        );
        store.set(keys::LANGUAGE, &self.language);
        store.set(keys::RANGE_FROM, &self.range_from);
        store.set(keys::RANGE_TO, &self.range_to);
    }

    /// Validates the snapshot before a run.
    pub fn validate(&self) -> Result<()> {
        if self.filename_template.trim().is_empty() {
            return Err(Error::config("filename template is empty"));
        }
        if self.date_format.trim().is_empty() {
            return Err(Error::config("date format is empty"));
        }
        Ok(())
    }
}

/// Parses the stored boolean spellings ("true"/"1" and "false"/"0").
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================
