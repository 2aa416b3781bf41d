//! Error types for docharvest.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use docharvest::{Result, Error};
//!
//! async fn example(runner: &Runner) -> Result<()> {
//!     let report = runner.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Input | [`Error::InvalidDate`], [`Error::Config`] |
//! | Overlay | [`Error::OverlayTimeout`], [`Error::OverlayStuck`] |
//! | Download | [`Error::DownloadFailed`], [`Error::DownloadTimeout`] |
//! | Session | [`Error::SessionLost`], [`Error::RouteLost`] |
//! | Page | [`Error::Page`], [`Error::StaleElement`] |
//! | External | [`Error::Json`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging. Recoverable errors
/// (overlay and download failures) degrade a single item or document; fatal
/// errors (session loss) terminate the run.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Input Errors
    // ========================================================================
    /// A free-text range bound did not parse as a date.
    ///
    /// Reported before the run touches the page, naming the offending field.
    #[error("Invalid date in \"{field}\": {value}")]
    InvalidDate {
        /// Which input field held the value ("from" or "to").
        field: String,
        /// The raw text the user typed.
        value: String,
    },

    /// Configuration error.
    ///
    /// Returned when the run configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Overlay Errors
    // ========================================================================
    /// No overlay appeared for a clicked timeline item within the ceiling.
    ///
    /// Recoverable: the orchestrator skips the item.
    #[error("No overlay for item {index} after {timeout_ms}ms")]
    OverlayTimeout {
        /// Index of the item whose overlay never appeared.
        index: usize,
        /// Milliseconds waited before giving up.
        timeout_ms: u64,
    },

    /// The overlay would not close after all strategies.
    ///
    /// Recoverable: the run continues, the next open supersedes stale state.
    #[error("Overlay for item {index} would not close")]
    OverlayStuck {
        /// Index of the item whose overlay stayed open.
        index: usize,
    },

    // ========================================================================
    // Download Errors
    // ========================================================================
    /// The managed download call reported failure.
    ///
    /// Recoverable: the interceptor falls back to the original navigation.
    #[error("Managed download failed for {url}: {message}")]
    DownloadFailed {
        /// URL of the document that failed to save.
        url: String,
        /// Error reported by the download sink.
        message: String,
    },

    /// The managed download call timed out.
    ///
    /// Recoverable: the interceptor falls back to the original navigation.
    #[error("Managed download timed out for {url}")]
    DownloadTimeout {
        /// URL of the document whose save timed out.
        url: String,
    },

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// The authenticated view disappeared mid-run.
    ///
    /// Fatal for the current run; the user must re-authenticate and restart.
    #[error("Session lost at item {index}/{total}")]
    SessionLost {
        /// Index reached when the session was lost.
        index: usize,
        /// Last index of the run.
        total: usize,
    },

    /// The pinned route could not be re-asserted.
    #[error("Could not return to route {path}")]
    RouteLost {
        /// The route the run is pinned to.
        path: String,
    },

    // ========================================================================
    // Page Errors
    // ========================================================================
    /// A host page interaction failed.
    ///
    /// Call sites treat this as a degraded step, never a run abort.
    #[error("Page error: {message}")]
    Page {
        /// Description of the page failure.
        message: String,
    },

    /// An element handle is no longer attached to the page.
    #[error("Stale element: {context}")]
    StaleElement {
        /// What the element was being used for.
        context: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates an invalid date error.
    #[inline]
    pub fn invalid_date(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidDate {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an overlay timeout error.
    #[inline]
    pub fn overlay_timeout(index: usize, timeout_ms: u64) -> Self {
        Self::OverlayTimeout { index, timeout_ms }
    }

    /// Creates an overlay stuck error.
    #[inline]
    pub fn overlay_stuck(index: usize) -> Self {
        Self::OverlayStuck { index }
    }

    /// Creates a download failed error.
    #[inline]
    pub fn download_failed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DownloadFailed {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a download timeout error.
    #[inline]
    pub fn download_timeout(url: impl Into<String>) -> Self {
        Self::DownloadTimeout { url: url.into() }
    }

    /// Creates a session lost error.
    #[inline]
    pub fn session_lost(index: usize, total: usize) -> Self {
        Self::SessionLost { index, total }
    }

    /// Creates a route lost error.
    #[inline]
    pub fn route_lost(path: impl Into<String>) -> Self {
        Self::RouteLost { path: path.into() }
    }

    /// Creates a page error.
    #[inline]
    pub fn page(message: impl Into<String>) -> Self {
        Self::Page {
            message: message.into(),
        }
    }

    /// Creates a stale element error.
    #[inline]
    pub fn stale_element(context: impl Into<String>) -> Self {
        Self::StaleElement {
            context: context.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::OverlayTimeout { .. } | Self::DownloadTimeout { .. }
        )
    }

    /// Returns `true` if this error degrades one item or document only.
    ///
    /// The orchestrator skips past recoverable errors and continues the run.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::OverlayTimeout { .. }
                | Self::OverlayStuck { .. }
                | Self::DownloadFailed { .. }
                | Self::DownloadTimeout { .. }
                | Self::Page { .. }
                | Self::StaleElement { .. }
        )
    }

    /// Returns `true` if this error terminates the whole run.
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::SessionLost { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::invalid_date("from", "99.99.9999");
        assert_eq!(err.to_string(), "Invalid date in \"from\": 99.99.9999");
    }

    #[test]
    fn test_session_lost_display() {
        let err = Error::session_lost(3, 9);
        assert_eq!(err.to_string(), "Session lost at item 3/9");
    }

    #[test]
    fn test_is_timeout() {
        let timeout_err = Error::overlay_timeout(2, 5000);
        let other_err = Error::config("test");

        assert!(timeout_err.is_timeout());
        assert!(!other_err.is_timeout());
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::overlay_timeout(0, 5000).is_recoverable());
        assert!(Error::download_failed("https://x/doc.pdf", "disk full").is_recoverable());
        assert!(Error::page("element vanished").is_recoverable());
        assert!(!Error::session_lost(1, 4).is_recoverable());
        assert!(!Error::invalid_date("to", "??").is_recoverable());
    }

    #[test]
    fn test_is_fatal() {
        assert!(Error::session_lost(0, 0).is_fatal());
        assert!(!Error::overlay_stuck(1).is_fatal());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
