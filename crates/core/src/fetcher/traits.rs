//! Trait definitions for the fetcher module.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::error::FetchError;
use super::types::{DownloadPlan, MediaMetadata};
use crate::progress::ProgressSink;

/// A fetcher that can probe and download remote media resources.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Returns the name of this fetcher implementation.
    fn name(&self) -> &str;

    /// Whether separate video+audio streams can be merged after download.
    fn can_merge_streams(&self) -> bool;

    /// Probes the resource for title and descriptive metadata without
    /// downloading any payload bytes.
    async fn probe(&self, url: &str) -> Result<MediaMetadata, FetchError>;

    /// Downloads the resource into `dest_dir` using the plan's format
    /// preferences, reporting progress events to the sink as they arrive.
    ///
    /// If the sink stops caring, fetching continues without reporting.
    async fn fetch(
        &self,
        url: &str,
        plan: &DownloadPlan,
        dest_dir: &Path,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<(), FetchError>;

    /// Validates that the fetcher is properly configured and ready.
    async fn validate(&self) -> Result<(), FetchError>;
}

/// Locates the file produced by a completed fetch.
///
/// The fetch layer names output files itself, so the caller scans the
/// per-request directory instead of guessing the extension.
pub async fn find_output_file(dest_dir: &Path) -> Result<Option<PathBuf>, FetchError> {
    let mut entries = tokio::fs::read_dir(dest_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let meta = entry.metadata().await?;
        // Skip .part leftovers from an interrupted fetch
        if meta.is_file() && entry.path().extension().map(|e| e != "part").unwrap_or(true) {
            return Ok(Some(entry.path()));
        }
    }
    Ok(None)
}
