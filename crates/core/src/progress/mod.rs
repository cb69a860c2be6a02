//! Progress observation for in-flight downloads.
//!
//! The fetch layer pushes raw byte-count samples into a per-request
//! `SharedProgress`; an independent `ProgressReporter` task samples it
//! periodically and renders user-facing updates.

mod reporter;
mod types;

pub use reporter::{render_bar, ProgressReporter, StatusMessage, StatusUpdater};
pub use types::{ProgressPhase, ProgressSink, ProgressState, SharedProgress};
