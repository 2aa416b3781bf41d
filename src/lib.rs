//! docharvest - Unattended batch download of documents from a paginated
//! web timeline.
//!
//! The engine visits every entry of an authenticated timeline in order,
//! opens each entry's detail overlay, and clicks through the document
//! actions inside it. Navigations those clicks would trigger are
//! intercepted and turned into managed downloads under deterministic,
//! metadata-derived filenames.
//!
//! # Architecture
//!
//! The host environment is an injected capability, not a hard dependency:
//!
//! - **[`Page`] / [`PageElement`]**: the DOM surface (query, geometry,
//!   click, hit test)
//! - **[`WindowOpener`] / [`PopupWindow`]**: the window-opening capability
//!   the interceptor decorates
//! - **[`DownloadSink`]**: the managed download facility
//! - **[`SettingsStore`]**: persisted string preferences
//!
//! Key design principles:
//!
//! - One pending capture system-wide: arm the [`CaptureSlot`], click, the
//!   next navigation claims it
//! - Every wait is a fixed sleep or a bounded poll; nothing blocks forever
//! - A broken step degrades that one item; only session loss ends the run
//! - Configuration is an immutable snapshot taken at run start
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use docharvest::{Config, DownloadInterceptor, Result, Runner};
//! # use docharvest::{DownloadSink, Page, WindowOpener};
//! # async fn demo(
//! #     page: Arc<dyn Page>,
//! #     opener: Arc<dyn WindowOpener>,
//! #     sink: Arc<dyn DownloadSink>,
//! # ) -> Result<()> {
//! let config = Arc::new(Config::default());
//! let interceptor = Arc::new(DownloadInterceptor::new(opener, sink, Arc::clone(&config)));
//! let runner = Runner::new(page, interceptor, config);
//!
//! let mut status = runner.status();
//! tokio::spawn(async move {
//!     while status.changed().await.is_ok() {
//!         println!("{}", *status.borrow());
//!     }
//! });
//!
//! let outcome = runner.run().await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | [`Config`], [`Selectors`], [`Timings`], [`SettingsStore`] |
//! | [`date`] | Free-text date parsing, resolution and formatting |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`filename`] | Template expansion and filename sanitization |
//! | [`intercept`] | Capture slot, popup tracking, download interception |
//! | [`overlay`] | Overlay open/close lifecycle |
//! | [`page`] | Host page traits: [`Page`], [`PageElement`] |
//! | [`run`] | Range resolution, status reporting, the [`Runner`] |
//! | [`scroll`] | Incremental list loading |
//! | [`timeline`] | Item/document context extraction |
//! | [`wait`] | Bounded polling combinator |

// ============================================================================
// Modules
// ============================================================================

/// Run configuration, selectors, timings and the settings store.
pub mod config;

/// Free-text date parsing, source resolution and token formatting.
pub mod date;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Download filename construction.
pub mod filename;

/// Download interception: capture slot, popup tracking, the interceptor.
pub mod intercept;

/// Overlay open/close lifecycle.
pub mod overlay;

/// Host page contract.
///
/// The engine's only view of the DOM: [`Page`] and [`PageElement`] are
/// implemented by the embedder.
pub mod page;

/// Run orchestration: range, status, runner.
pub mod run;

/// Incremental list loading.
pub mod scroll;

/// Timeline readout: items, headings, overlay headers, document actions.
pub mod timeline;

/// Bounded polling.
pub mod wait;

#[cfg(test)]
pub(crate) mod testutil;

// ============================================================================
// Re-exports
// ============================================================================

// Configuration
pub use config::{Config, Selectors, SettingsStore, TimingProfile, Timings};

// Error types
pub use error::{Error, Result};

// Interception surface
pub use intercept::{
    CaptureSlot, DownloadInterceptor, DownloadOutcome, DownloadRequest, DownloadSink,
    PendingDownloadMeta, PopupRef, PopupTracker, PopupWindow, WindowOpener,
};

// Host page contract
pub use page::{ElementRef, Page, PageElement, Rect};

// Run surface
pub use run::{RangeBound, RunOutcome, RunRange, Runner, Severity, Status, StopHandle};
