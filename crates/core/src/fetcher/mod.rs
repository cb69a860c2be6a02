//! Media fetching.
//!
//! Resolves a quality tier into an ordered list of format preferences,
//! probes remote resources for metadata, and drives the yt-dlp subprocess
//! that does the actual transfer.

mod error;
mod formats;
mod traits;
mod types;
mod ytdlp;

pub use error::FetchError;
pub use formats::select_formats;
pub use traits::{find_output_file, MediaFetcher};
pub use types::{DownloadPlan, DownloadRequest, MediaMetadata, ProgressSample, QualityTier};
pub use ytdlp::YtDlpFetcher;
