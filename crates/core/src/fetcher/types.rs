//! Types for media fetch operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User-selected quality preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    /// Up to 1080p video.
    Hd,
    /// Up to 480p video.
    Sd,
    /// Audio only.
    Audio,
}

impl QualityTier {
    /// Returns the string representation for callbacks and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Hd => "hd",
            QualityTier::Sd => "sd",
            QualityTier::Audio => "audio",
        }
    }

    /// Parses a callback payload back into a tier.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "hd" => Some(QualityTier::Hd),
            "sd" => Some(QualityTier::Sd),
            "audio" => Some(QualityTier::Audio),
            _ => None,
        }
    }
}

/// An accepted download request. Immutable once built.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    /// Validated resource URL.
    pub url: String,
    pub tier: QualityTier,
    pub requested_at: DateTime<Utc>,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>, tier: QualityTier) -> Self {
        Self {
            url: url.into(),
            tier,
            requested_at: Utc::now(),
        }
    }
}

/// Ordered format preferences, consumed once by the fetch operation.
#[derive(Debug, Clone)]
pub struct DownloadPlan {
    preferences: Vec<String>,
}

impl DownloadPlan {
    pub fn new(preferences: Vec<String>) -> Self {
        debug_assert!(!preferences.is_empty());
        Self { preferences }
    }

    pub fn preferences(&self) -> &[String] {
        &self.preferences
    }

    /// The preference list in yt-dlp `-f` syntax (fallbacks joined by `/`).
    pub fn as_format_arg(&self) -> String {
        self.preferences.join("/")
    }

    pub fn len(&self) -> usize {
        self.preferences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.preferences.is_empty()
    }
}

/// Descriptive metadata from the metadata-only probe.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploader: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// A progress event emitted by the fetch layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressSample {
    Bytes {
        downloaded: u64,
        /// Exact total when the fetch layer knows it.
        total: Option<u64>,
        /// Estimate used when the exact total is unknown.
        total_estimate: Option<u64>,
    },
    Finished,
}
