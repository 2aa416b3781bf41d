//! Popup window tracking.
//!
//! Windows opened during a capture cycle are tracked so they can be closed
//! once the download has been claimed, and so a navigation inside one can be
//! told apart from a global navigation of the main page.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

// ============================================================================
// PopupWindow
// ============================================================================

/// Shared handle to a live popup.
pub type PopupRef = Arc<dyn PopupWindow>;

/// A popup window the host opened on the engine's behalf.
#[async_trait]
pub trait PopupWindow: Send + Sync {
    /// Stable identifier for the lifetime of the popup.
    fn id(&self) -> u64;

    /// Closes the popup. Closing an already-closed popup is a no-op.
    async fn close(&self);
}

// ============================================================================
// PopupTracker
// ============================================================================

struct TrackedPopup {
    popup: PopupRef,
    /// Navigations inside this popup are candidates for capture.
    location_tracked: bool,
}

/// Set of live popups belonging to the current capture cycle.
///
/// Cheap to clone; all clones share the same set.
#[derive(Clone, Default)]
pub struct PopupTracker {
    popups: Arc<Mutex<Vec<TrackedPopup>>>,
}

impl PopupTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking a popup.
    pub fn track(&self, popup: PopupRef, location_tracked: bool) {
        debug!(popup_id = popup.id(), location_tracked, "Tracking popup");
        self.popups.lock().push(TrackedPopup {
            popup,
            location_tracked,
        });
    }

    /// Marks an already-tracked popup as a capture candidate.
    pub fn mark_location_tracked(&self, id: u64) {
        for tracked in self.popups.lock().iter_mut() {
            if tracked.popup.id() == id {
                tracked.location_tracked = true;
            }
        }
    }

    /// Whether navigations in this popup may be captured.
    #[must_use]
    pub fn is_location_tracked(&self, id: u64) -> bool {
        self.popups
            .lock()
            .iter()
            .any(|t| t.popup.id() == id && t.location_tracked)
    }

    /// Stops tracking a popup without closing it.
    pub fn untrack(&self, id: u64) -> Option<PopupRef> {
        let mut popups = self.popups.lock();
        let position = popups.iter().position(|t| t.popup.id() == id)?;
        Some(popups.remove(position).popup)
    }

    /// Number of tracked popups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.popups.lock().len()
    }

    /// Whether no popups are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.popups.lock().is_empty()
    }

    /// Closes and forgets every tracked popup.
    pub async fn close_all(&self) {
        let drained: Vec<TrackedPopup> = std::mem::take(&mut *self.popups.lock());
        for tracked in drained {
            debug!(popup_id = tracked.popup.id(), "Closing tracked popup");
            tracked.popup.close().await;
        }
    }

    /// Gives a popup `grace` to become tied to a capture, then force-closes
    /// it if it is still tracked and still not a capture candidate.
    pub fn grace_close(&self, id: u64, grace: Duration) {
        let tracker = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            let stray = {
                let mut popups = tracker.popups.lock();
                popups
                    .iter()
                    .position(|t| t.popup.id() == id && !t.location_tracked)
                    .map(|position| popups.remove(position).popup)
            };
            if let Some(popup) = stray {
                debug!(popup_id = id, "Force-closing stray popup after grace");
                popup.close().await;
            }
        });
    }
}

// ============================================================================
// Tests
// ============================================================================
