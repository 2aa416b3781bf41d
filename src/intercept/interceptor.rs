//! The download interceptor.
//!
//! A decorator over the host's window-opening capability. While the capture
//! slot is armed, navigations that would have opened a document in a new
//! window are redirected into the managed download sink under a built
//! filename; everything else passes through untouched.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::filename::build_download_name;
use crate::intercept::popups::{PopupRef, PopupTracker};
use crate::intercept::slot::{CaptureSlot, PendingDownloadMeta};

// ============================================================================
// DownloadSink
// ============================================================================

/// One managed download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Absolute URL of the document.
    pub url: String,
    /// Filename the download should be saved under.
    pub suggested_name: String,
    /// Whether to prompt the user for a location. Always `false` here; the
    /// whole point is unattended operation.
    pub save_as_dialog: bool,
}

/// Result of a managed download attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The sink saved the file.
    Success,
    /// The sink gave up waiting.
    Timeout,
    /// The sink failed outright.
    Error(String),
}

/// The host's managed download capability.
#[async_trait]
pub trait DownloadSink: Send + Sync {
    /// Saves the document, returning when the download settles.
    async fn download(&self, request: DownloadRequest) -> DownloadOutcome;
}

// ============================================================================
// WindowOpener
// ============================================================================

/// The host's real window-opening capability, the one being decorated.
#[async_trait]
pub trait WindowOpener: Send + Sync {
    /// Opens `url` in a new window, returning a handle if one was created.
    async fn open(&self, url: &str) -> Option<PopupRef>;
}

// ============================================================================
// DownloadInterceptor
// ============================================================================

/// Decorator over [`WindowOpener`] that turns document navigations into
/// managed downloads while the capture slot is armed.
pub struct DownloadInterceptor {
    slot: CaptureSlot,
    tracker: PopupTracker,
    opener: Arc<dyn WindowOpener>,
    sink: Arc<dyn DownloadSink>,
    config: Arc<Config>,
    completed: AtomicUsize,
}

impl DownloadInterceptor {
    /// Creates an interceptor over the given host capabilities.
    pub fn new(
        opener: Arc<dyn WindowOpener>,
        sink: Arc<dyn DownloadSink>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            slot: CaptureSlot::new(),
            tracker: PopupTracker::new(),
            opener,
            sink,
            config,
            completed: AtomicUsize::new(0),
        }
    }

    /// Arms the capture slot for the next navigation and starts the expiry
    /// timer. A capture that nothing claims within the expiry window is
    /// dropped and its cycle popups are force-closed.
    pub fn arm(&self, meta: PendingDownloadMeta) {
        let generation = self.slot.arm(meta);
        let slot = self.slot.clone();
        let tracker = self.tracker.clone();
        let expiry = self.config.timings.capture_expiry;
        tokio::spawn(async move {
            tokio::time::sleep(expiry).await;
            if let Some(stale) = slot.try_expire(generation) {
                warn!(
                    doc_index = stale.doc_index,
                    "Pending capture expired unclaimed"
                );
                tracker.close_all().await;
            }
        });
    }

    /// Drops any pending capture.
    pub fn clear(&self) {
        self.slot.clear();
    }

    /// Whether a capture is pending.
    #[inline]
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.slot.is_armed()
    }

    /// Number of downloads the sink has completed.
    #[inline]
    #[must_use]
    pub fn downloads_completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Intercepted window-open.
    ///
    /// With an armed slot and a concrete URL the open becomes a managed save
    /// and no window appears. Otherwise the real opener runs; the popup is
    /// tracked, as a capture candidate when a slot is armed, with a grace
    /// timer when not.
    pub async fn open_window(&self, url: &str) -> Option<PopupRef> {
        if is_concrete_url(url)
            && let Some(meta) = self.slot.consume()
        {
            return match self.capture(url, meta).await {
                DownloadOutcome::Success => {
                    self.tracker.close_all().await;
                    None
                }
                outcome => {
                    warn!(url = %url, ?outcome, "Managed save failed, opening real window");
                    self.opener.open(url).await
                }
            };
        }

        let popup = self.opener.open(url).await?;
        let armed = self.slot.is_armed();
        self.tracker.track(Arc::clone(&popup), armed);
        if !armed {
            self.tracker
                .grace_close(popup.id(), self.config.timings.popup_grace);
        }
        Some(popup)
    }

    /// Navigation observed inside a popup. Returns `true` when the
    /// navigation was captured and the popup's load should be suppressed.
    ///
    /// Only location-tracked popups are candidates; a navigation of the main
    /// page or of an untracked window is never intercepted.
    pub async fn on_popup_navigate(&self, popup: &PopupRef, url: &str) -> bool {
        if !is_concrete_url(url) || !self.tracker.is_location_tracked(popup.id()) {
            return false;
        }
        let Some(meta) = self.slot.consume() else {
            return false;
        };

        match self.capture(url, meta).await {
            DownloadOutcome::Success => {
                self.tracker.close_all().await;
                true
            }
            outcome => {
                warn!(url = %url, ?outcome, "Managed save failed, letting popup load");
                self.tracker.untrack(popup.id());
                false
            }
        }
    }

    /// Runs one managed save and counts it on success.
    async fn capture(&self, url: &str, meta: PendingDownloadMeta) -> DownloadOutcome {
        let suggested_name = build_download_name(&meta, url, &self.config);
        debug!(url = %url, name = %suggested_name, "Capturing download");

        let outcome = self
            .sink
            .download(DownloadRequest {
                url: url.to_string(),
                suggested_name: suggested_name.clone(),
                save_as_dialog: false,
            })
            .await;

        if outcome == DownloadOutcome::Success {
            self.completed.fetch_add(1, Ordering::SeqCst);
            info!(name = %suggested_name, "Download saved");
        }
        outcome
    }
}

/// A URL worth capturing: non-empty and not a blank placeholder.
fn is_concrete_url(url: &str) -> bool {
    let trimmed = url.trim();
    !trimmed.is_empty() && trimmed != "about:blank"
}

// ============================================================================
// Tests
// ============================================================================
