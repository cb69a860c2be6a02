//! Type definitions for the download orchestrator.

use std::path::PathBuf;
use thiserror::Error;

use crate::fetcher::MediaMetadata;

/// A finished download, ready for delivery.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub title: String,
    pub metadata: MediaMetadata,
}

/// Errors from running a download end to end.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("Download timed out after {0}s")]
    Timeout(u64),

    #[error("Fetch completed but produced no output file")]
    NoOutputProduced,

    #[error("Download failed: {0}")]
    Unexpected(String),
}

impl DownloadError {
    /// A short message suitable for showing to the requesting user.
    /// Internal detail stays in the logs.
    pub fn user_message(&self) -> &'static str {
        match self {
            DownloadError::ResourceUnavailable(_) => {
                "😕 This video is unavailable or cannot be downloaded. \
                 Please check the link and try again."
            }
            DownloadError::Timeout(_) => "⏳ The download took too long and was cancelled.",
            DownloadError::NoOutputProduced | DownloadError::Unexpected(_) => {
                "❌ Something went wrong while processing your request. Please try again later."
            }
        }
    }
}
