//! Periodic progress reporter.
//!
//! Samples one request's shared progress state on a fixed interval and
//! re-renders the user-facing status message, but only when the sampled
//! percentage has moved more than a point since the last emission. Raw
//! samples can be noisy or non-monotonic; the threshold keeps the chat
//! from being spammed with redundant edits.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::types::{ProgressPhase, SharedProgress};
use crate::channel::{ChannelError, ChannelTransport, MessageRef};

/// Minimum advance (percentage points) between emissions.
const EMIT_THRESHOLD_PCT: f32 = 1.0;

const BAR_CELLS: usize = 10;

/// Something the reporter can push rendered status text into.
#[async_trait]
pub trait StatusUpdater: Send + Sync {
    async fn update(&self, text: &str) -> Result<(), ChannelError>;
}

/// StatusUpdater that edits a previously sent chat message in place.
pub struct StatusMessage {
    transport: Arc<dyn ChannelTransport>,
    msg: MessageRef,
}

impl StatusMessage {
    pub fn new(transport: Arc<dyn ChannelTransport>, msg: MessageRef) -> Self {
        Self { transport, msg }
    }

    pub fn message(&self) -> MessageRef {
        self.msg
    }

    pub fn transport(&self) -> &Arc<dyn ChannelTransport> {
        &self.transport
    }
}

#[async_trait]
impl StatusUpdater for StatusMessage {
    async fn update(&self, text: &str) -> Result<(), ChannelError> {
        self.transport.edit_text(&self.msg, text).await
    }
}

/// Renders a textual progress bar for a percentage in [0, 100].
pub fn render_bar(percent: f32) -> String {
    let clamped = percent.clamp(0.0, 100.0);
    let filled = ((clamped / 100.0) * BAR_CELLS as f32).round() as usize;
    let mut bar = String::with_capacity(BAR_CELLS * 3 + 8);
    for _ in 0..filled {
        bar.push('█');
    }
    for _ in filled..BAR_CELLS {
        bar.push('░');
    }
    format!("{} {:.0}%", bar, clamped)
}

/// Samples shared progress state and emits rendered updates until the
/// download finishes.
pub struct ProgressReporter {
    shared: Arc<SharedProgress>,
    status: Arc<dyn StatusUpdater>,
    title: String,
    interval: Duration,
}

impl ProgressReporter {
    pub fn new(
        shared: Arc<SharedProgress>,
        status: Arc<dyn StatusUpdater>,
        title: impl Into<String>,
        interval: Duration,
    ) -> Self {
        Self {
            shared,
            status,
            title: title.into(),
            interval,
        }
    }

    /// Runs until the FINISHED flip is observed. Emission failures (e.g.
    /// the status message was deleted) are logged and swallowed; they
    /// never abort the download.
    pub async fn run(self) {
        let mut last_emitted: Option<f32> = None;

        loop {
            tokio::time::sleep(self.interval).await;

            let snapshot = self.shared.snapshot();
            if snapshot.phase == ProgressPhase::Finished {
                break;
            }

            // No sample with a usable total yet
            let Some(percent) = snapshot.percent else {
                continue;
            };

            let advanced = last_emitted
                .map(|prev| percent - prev > EMIT_THRESHOLD_PCT)
                .unwrap_or(true);
            if !advanced {
                continue;
            }

            let text = format!("⬇️ Downloading: {}\n{}", self.title, render_bar(percent));
            match self.status.update(&text).await {
                Ok(()) => last_emitted = Some(percent),
                Err(e) => warn!("Failed to emit progress update: {}", e),
            }
        }

        debug!("Progress reporter for '{}' finished", self.title);
    }
}
