//! Download interception.
//!
//! Three pieces cooperate to turn document navigations into managed saves:
//!
//! | Piece | Role |
//! |-------|------|
//! | [`CaptureSlot`] | single-slot mailbox holding the one pending capture |
//! | [`PopupTracker`] | live popups of the current capture cycle |
//! | [`DownloadInterceptor`] | decorator wiring slot + tracker + sink |
//!
//! The invariant across all three: at most one capture is pending at any
//! instant, and it is claimed by the first navigation that fires after the
//! slot was armed.

pub mod interceptor;
pub mod popups;
pub mod slot;

pub use interceptor::{
    DownloadInterceptor, DownloadOutcome, DownloadRequest, DownloadSink, WindowOpener,
};
pub use popups::{PopupRef, PopupTracker, PopupWindow};
pub use slot::{CaptureSlot, PendingDownloadMeta};
