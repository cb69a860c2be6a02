//! Error types for the fetcher module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while probing or fetching a resource.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The fetch layer reported the resource as invalid, private or removed.
    #[error("Resource unavailable: {reason}")]
    Unavailable { reason: String },

    /// Fetcher binary not found.
    #[error("Fetcher binary not found at path: {}", path.display())]
    BinaryNotFound { path: PathBuf },

    /// The fetch process failed.
    #[error("Fetch failed: {reason}")]
    Failed {
        reason: String,
        stderr: Option<String>,
    },

    /// The fetch timed out.
    #[error("Fetch timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Failed to parse probe output.
    #[error("Failed to parse media info: {reason}")]
    ParseError { reason: String },

    /// I/O error during the fetch.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Creates a fetch-failed error with captured stderr.
    pub fn failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Creates an unavailable-resource error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }
}
