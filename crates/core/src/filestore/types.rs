//! Type definitions for the file store.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

/// Errors from file store operations.
#[derive(Debug, Error)]
pub enum FileStoreError {
    #[error("No stored file for handle '{handle}'")]
    NotFound { handle: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A file held by the store, addressed by an opaque handle.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub handle: String,
    pub path: PathBuf,
    pub original_name: String,
    pub created_at: DateTime<Utc>,
    pub retrieved: bool,
}

/// An opened stored file, ready to be streamed to a client.
pub struct RetrievedFile {
    pub file: tokio::fs::File,
    pub original_name: String,
    pub size_bytes: u64,
}
