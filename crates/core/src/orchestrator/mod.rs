//! End-to-end download orchestration.

mod runner;
mod types;

pub use runner::DownloadOrchestrator;
pub use types::{Artifact, DownloadError};
