//! Run status reporting.
//!
//! Statuses are typed, not strings: the embedder renders them however it
//! likes (the `Display` impl is a plain English rendering). Every state the
//! run passes through is published on the runner's watch channel.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Severity
// ============================================================================

/// Display class of a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Progress,
    Warn,
    Error,
    Success,
}

// ============================================================================
// Status
// ============================================================================

/// One observable state of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// No run in progress.
    Idle,
    /// Scanning the page for timeline entries.
    Searching,
    /// Triggering incremental loads; `loaded` entries so far.
    LoadingMore { loaded: usize },
    /// Entries loaded, applying the date filter.
    Filtering { total: usize },
    /// Opening the overlay of item `index` of `total`.
    OpeningItem { index: usize, total: usize },
    /// Item `index` produced no overlay in time; skipped.
    NoOverlay { index: usize },
    /// Clicking through `count` document actions of item `index`.
    OpeningDocuments { index: usize, count: usize },
    /// Closing the overlay of item `index`.
    ClosingOverlay { index: usize },
    /// Item `index` finished; `matched` items in range so far.
    ItemDone { index: usize, matched: usize },
    /// Stop was requested; winding down.
    StopRequested,
    /// Run finished normally.
    Done { matched: usize, documents: usize },
    /// Run stopped early at item `index`.
    Aborted { index: usize },
    /// The page showed no timeline entries at all.
    NoEntries,
    /// Entries existed but none fell inside the range.
    NoMatches,
    /// A range input failed to parse; the run never started.
    InvalidDate { field: String, value: String },
    /// Session or route lost at item `index` of `total`.
    SessionLost { index: usize, total: usize },
}

impl Status {
    /// Display class for this status.
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::Idle | Self::Searching | Self::Filtering { .. } => Severity::Info,
            Self::LoadingMore { .. }
            | Self::OpeningItem { .. }
            | Self::OpeningDocuments { .. }
            | Self::ClosingOverlay { .. }
            | Self::ItemDone { .. } => Severity::Progress,
            Self::NoOverlay { .. } | Self::StopRequested | Self::NoEntries | Self::NoMatches => {
                Severity::Warn
            }
            Self::InvalidDate { .. } | Self::SessionLost { .. } => Severity::Error,
            Self::Done { .. } => Severity::Success,
            Self::Aborted { .. } => Severity::Warn,
        }
    }

    /// Whether the run is over once this status is published.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Done { .. }
                | Self::Aborted { .. }
                | Self::NoEntries
                | Self::NoMatches
                | Self::InvalidDate { .. }
                | Self::SessionLost { .. }
        )
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Searching => write!(f, "Searching for timeline entries"),
            Self::LoadingMore { loaded } => {
                write!(f, "Loading more entries ({loaded} so far)")
            }
            Self::Filtering { total } => write!(f, "Filtering {total} entries"),
            Self::OpeningItem { index, total } => {
                write!(f, "Opening item {index} of {total}")
            }
            Self::NoOverlay { index } => {
                write!(f, "Item {index}: no overlay appeared, skipping")
            }
            Self::OpeningDocuments { index, count } => {
                write!(f, "Item {index}: opening {count} documents")
            }
            Self::ClosingOverlay { index } => write!(f, "Item {index}: closing overlay"),
            Self::ItemDone { index, matched } => {
                write!(f, "Item {index} done ({matched} matched)")
            }
            Self::StopRequested => write!(f, "Stop requested"),
            Self::Done { matched, documents } => {
                write!(f, "Done: {matched} items matched, {documents} documents saved")
            }
            Self::Aborted { index } => write!(f, "Aborted at item {index}"),
            Self::NoEntries => write!(f, "No timeline entries found"),
            Self::NoMatches => write!(f, "No entries matched the date range"),
            Self::InvalidDate { field, value } => {
                write!(f, "Invalid date in '{field}': {value}")
            }
            Self::SessionLost { index, total } => {
                write!(f, "Session lost at item {index} of {total}")
            }
        }
    }
}

// ============================================================================
// RunOutcome
// ============================================================================

/// Terminal result of a run that did not fail outright.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// Every loaded item was visited.
    Completed { matched: usize, documents: usize },
    /// Stopped early at `index`.
    Aborted { index: usize },
    /// Nothing to do: no entries, or none in range.
    NoMatches,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_classes() {
        assert_eq!(Status::Searching.severity(), Severity::Info);
        assert_eq!(
            Status::OpeningItem { index: 1, total: 5 }.severity(),
            Severity::Progress
        );
        assert_eq!(Status::NoOverlay { index: 2 }.severity(), Severity::Warn);
        assert_eq!(
            Status::SessionLost { index: 3, total: 10 }.severity(),
            Severity::Error
        );
        assert_eq!(
            Status::Done { matched: 2, documents: 4 }.severity(),
            Severity::Success
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(Status::Done { matched: 0, documents: 0 }.is_terminal());
        assert!(Status::SessionLost { index: 3, total: 10 }.is_terminal());
        assert!(Status::NoMatches.is_terminal());
        assert!(!Status::Searching.is_terminal());
        assert!(!Status::StopRequested.is_terminal());
    }

    #[test]
    fn test_display_mentions_indices() {
        let status = Status::SessionLost { index: 3, total: 10 };
        let text = status.to_string();
        assert!(text.contains('3'));
        assert!(text.contains("10"));
    }

    #[test]
    fn test_status_serializes() {
        let status = Status::OpeningItem { index: 2, total: 7 };
        let json = serde_json::to_string(&status).unwrap();
        let back: Status = serde_json::from_str(&json).unwrap();
        assert_eq!(back, status);
    }
}
