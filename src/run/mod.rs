//! Run orchestration.
//!
//! [`RunRange`] turns the free-text range inputs into calendar bounds,
//! [`Status`] is the typed progress surface, and [`Runner`] drives the
//! actual pass over the timeline.

pub mod range;
pub mod runner;
pub mod status;

pub use range::{RangeBound, RunRange};
pub use runner::{Runner, StopHandle};
pub use status::{RunOutcome, Severity, Status};
