//! Per-request progress state.

use chrono::{DateTime, Utc};
use std::sync::Mutex;

use crate::fetcher::ProgressSample;

/// Phase of an in-flight download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
    Downloading,
    Finished,
}

/// Sampled completion state for one request.
///
/// Owned by a single request's task pair: the fetch callback writes,
/// the periodic reporter reads. Never shared across requests.
#[derive(Debug, Clone, Copy)]
pub struct ProgressState {
    /// Completion percentage in [0, 100]. Unset until a sample with a
    /// known or estimated total arrives.
    pub percent: Option<f32>,
    pub phase: ProgressPhase,
    pub last_sampled_at: DateTime<Utc>,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            percent: None,
            phase: ProgressPhase::Downloading,
            last_sampled_at: Utc::now(),
        }
    }
}

/// Something that accepts progress samples.
///
/// Any fetch layer that can produce byte counts satisfies this shape.
pub trait ProgressSink: Send + Sync {
    fn accept(&self, sample: ProgressSample);
}

/// The concrete sink backing one request's progress state.
#[derive(Debug, Default)]
pub struct SharedProgress {
    state: Mutex<ProgressState>,
}

impl SharedProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ProgressState {
        *self.state.lock().unwrap()
    }

    /// Marks the download finished. Used by the orchestrator when the
    /// fetch layer completes without emitting its own finished event.
    pub fn finish(&self) {
        let mut state = self.state.lock().unwrap();
        state.phase = ProgressPhase::Finished;
        state.last_sampled_at = Utc::now();
    }
}

impl ProgressSink for SharedProgress {
    fn accept(&self, sample: ProgressSample) {
        let mut state = self.state.lock().unwrap();
        state.last_sampled_at = Utc::now();
        match sample {
            ProgressSample::Bytes {
                downloaded,
                total,
                total_estimate,
            } => {
                // Exact total wins over the estimate; no total means no update.
                if let Some(total) = total.or(total_estimate).filter(|t| *t > 0) {
                    let pct = (downloaded as f64 / total as f64 * 100.0).min(100.0);
                    state.percent = Some(pct as f32);
                }
            }
            ProgressSample::Finished => {
                state.phase = ProgressPhase::Finished;
            }
        }
    }
}
