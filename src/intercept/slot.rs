//! Single-slot capture mailbox.
//!
//! The orchestrator arms the slot with document metadata immediately before
//! clicking a document action; the very next intercepted navigation claims
//! it. At most one capture is pending system-wide at any instant.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::date::DateSources;

// ============================================================================
// PendingDownloadMeta
// ============================================================================

/// Everything known about a document at the moment its action is clicked.
///
/// Carried from arm to capture so the filename builder can run against the
/// state the page showed when the click happened, not whatever it shows by
/// the time the navigation fires.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingDownloadMeta {
    /// Title of the document action, if one was declared.
    pub doc_title: Option<String>,
    /// Date text on the document action itself.
    pub doc_date: Option<String>,
    /// 1-based position of this document within its overlay.
    pub doc_index: usize,
    /// Number of document actions in the overlay.
    pub doc_total: usize,
    /// Timeline item title.
    pub item_title: Option<String>,
    /// Date fragment from the item subtitle.
    pub item_date: Option<String>,
    /// Subtitle remainder after the date fragment.
    pub item_subtitle: Option<String>,
    /// Year from the nearest preceding section heading.
    pub item_year: Option<i32>,
    /// Exact year from the overlay header.
    pub modal_year: Option<i32>,
    /// Hour of day from the overlay header.
    pub modal_hour: Option<u32>,
    /// Minute from the overlay header.
    pub modal_minute: Option<u32>,
}

impl PendingDownloadMeta {
    /// Views the metadata as inputs to the date resolver.
    #[must_use]
    pub fn date_sources(&self) -> DateSources<'_> {
        DateSources {
            doc_date: self.doc_date.as_deref(),
            item_date: self.item_date.as_deref(),
            item_year: self.item_year,
            modal_year: self.modal_year,
            modal_hour: self.modal_hour,
            modal_minute: self.modal_minute,
        }
    }
}

// ============================================================================
// CaptureSlot
// ============================================================================

#[derive(Default)]
struct SlotState {
    pending: Option<PendingDownloadMeta>,
    generation: u64,
}

/// The one pending capture, if any.
///
/// Cheap to clone; all clones share the same slot. Every arm bumps a
/// generation counter, and expiry is generation-guarded: a timer from a
/// previous arm can never clear a newer capture.
#[derive(Clone, Default)]
pub struct CaptureSlot {
    state: Arc<Mutex<SlotState>>,
}

impl CaptureSlot {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the slot and returns the new generation.
    ///
    /// Arming over a still-pending capture overwrites it with a warning. The
    /// page has at this point already been clicked for the previous document
    /// and produced no navigation; the freshest metadata wins.
    pub fn arm(&self, meta: PendingDownloadMeta) -> u64 {
        let mut state = self.state.lock();
        if let Some(stale) = state.pending.take() {
            warn!(
                doc_index = stale.doc_index,
                doc_title = stale.doc_title.as_deref().unwrap_or("?"),
                "Overwriting unclaimed pending capture"
            );
        }
        state.generation += 1;
        state.pending = Some(meta);
        debug!(generation = state.generation, "Capture slot armed");
        state.generation
    }

    /// Takes the pending capture, leaving the slot empty.
    pub fn consume(&self) -> Option<PendingDownloadMeta> {
        let mut state = self.state.lock();
        let meta = state.pending.take();
        if meta.is_some() {
            state.generation += 1;
        }
        meta
    }

    /// Copies the pending capture without claiming it.
    #[must_use]
    pub fn peek(&self) -> Option<PendingDownloadMeta> {
        self.state.lock().pending.clone()
    }

    /// Empties the slot unconditionally.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        if state.pending.take().is_some() {
            state.generation += 1;
        }
    }

    /// Whether a capture is pending.
    #[inline]
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.state.lock().pending.is_some()
    }

    /// Clears the slot only if `generation` is still current and a capture
    /// is pending. Expiry timers call this so a timer outlived by a newer
    /// arm or a consume is harmless.
    pub fn try_expire(&self, generation: u64) -> Option<PendingDownloadMeta> {
        let mut state = self.state.lock();
        if state.generation != generation {
            return None;
        }
        let meta = state.pending.take();
        if meta.is_some() {
            state.generation += 1;
        }
        meta
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(index: usize) -> PendingDownloadMeta {
        PendingDownloadMeta {
            doc_index: index,
            doc_total: 2,
            doc_title: Some(format!("Doc {index}")),
            ..PendingDownloadMeta::default()
        }
    }

    #[test]
    fn test_arm_then_consume() {
        let slot = CaptureSlot::new();
        assert!(!slot.is_armed());

        slot.arm(meta(1));
        assert!(slot.is_armed());

        let taken = slot.consume().unwrap();
        assert_eq!(taken.doc_index, 1);
        assert!(!slot.is_armed());
        assert!(slot.consume().is_none());
    }

    #[test]
    fn test_arm_overwrites_pending() {
        let slot = CaptureSlot::new();
        slot.arm(meta(1));
        slot.arm(meta(2));
        assert_eq!(slot.consume().unwrap().doc_index, 2);
        assert!(!slot.is_armed());
    }

    #[test]
    fn test_peek_does_not_claim() {
        let slot = CaptureSlot::new();
        slot.arm(meta(1));
        assert_eq!(slot.peek().unwrap().doc_index, 1);
        assert!(slot.is_armed());
    }

    #[test]
    fn test_stale_expiry_is_harmless() {
        let slot = CaptureSlot::new();
        let old_generation = slot.arm(meta(1));
        slot.consume();

        // A second capture armed after the first was claimed.
        slot.arm(meta(2));
        assert!(slot.try_expire(old_generation).is_none());
        assert!(slot.is_armed());
    }

    #[test]
    fn test_current_expiry_clears() {
        let slot = CaptureSlot::new();
        let generation = slot.arm(meta(1));
        let expired = slot.try_expire(generation).unwrap();
        assert_eq!(expired.doc_index, 1);
        assert!(!slot.is_armed());
    }

    #[test]
    fn test_clear_invalidates_expiry() {
        let slot = CaptureSlot::new();
        let generation = slot.arm(meta(1));
        slot.clear();
        assert!(slot.try_expire(generation).is_none());
    }
}
