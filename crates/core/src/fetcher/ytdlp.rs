//! yt-dlp based fetcher implementation.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::error::FetchError;
use super::traits::MediaFetcher;
use super::types::{DownloadPlan, MediaMetadata, ProgressSample};
use crate::config::DownloaderConfig;
use crate::progress::ProgressSink;

/// Marker prefix for progress lines on stdout, so fetch output and
/// progress samples cannot be confused.
const PROGRESS_PREFIX: &str = "cfp";

/// stderr fragments the extraction layer uses for dead or gated resources.
const UNAVAILABLE_MARKERS: &[&str] = &[
    "Video unavailable",
    "Private video",
    "This video is not available",
    "has been removed",
    "account associated with this video has been terminated",
    "Unsupported URL",
    "is not a valid URL",
    "HTTP Error 404",
];

/// yt-dlp subprocess fetcher.
pub struct YtDlpFetcher {
    config: DownloaderConfig,
    merge_capable: bool,
}

impl YtDlpFetcher {
    /// Creates a fetcher without post-processing support.
    pub fn new(config: DownloaderConfig) -> Self {
        Self {
            config,
            merge_capable: false,
        }
    }

    /// Creates a fetcher, probing for ffmpeg to decide whether separate
    /// video+audio streams can be offered (they require a merge step).
    pub async fn detect(config: DownloaderConfig) -> Self {
        let merge_capable = Command::new(&config.ffmpeg_path)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await
            .map(|o| o.status.success())
            .unwrap_or(false);

        if !merge_capable {
            debug!(
                "ffmpeg not found at {:?}, merged-stream formats disabled",
                config.ffmpeg_path
            );
        }

        Self {
            config,
            merge_capable,
        }
    }

    /// Builds the yt-dlp argument list for a download.
    fn build_fetch_args(&self, url: &str, plan: &DownloadPlan, dest_dir: &Path) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            plan.as_format_arg(),
            "-o".to_string(),
            dest_dir
                .join("%(title)s.%(ext)s")
                .to_string_lossy()
                .to_string(),
            "--newline".to_string(),
            "--no-warnings".to_string(),
            "--no-playlist".to_string(),
            "--progress-template".to_string(),
            format!(
                "download:{} %(progress.downloaded_bytes)s %(progress.total_bytes)s %(progress.total_bytes_estimate)s",
                PROGRESS_PREFIX
            ),
        ];

        if self.merge_capable {
            args.extend([
                "--ffmpeg-location".to_string(),
                self.config.ffmpeg_path.to_string_lossy().to_string(),
            ]);
        }

        args.push(url.to_string());
        args
    }

    /// Parses a progress-template line into a sample.
    fn parse_progress_line(line: &str) -> Option<ProgressSample> {
        let rest = line.trim().strip_prefix(PROGRESS_PREFIX)?;
        let mut parts = rest.split_whitespace();
        let downloaded = parse_size(parts.next()?)?;
        let total = parts.next().and_then(parse_size);
        let total_estimate = parts.next().and_then(parse_size);
        Some(ProgressSample::Bytes {
            downloaded,
            total,
            total_estimate,
        })
    }

    /// Parses the `-J` probe output into metadata.
    fn parse_probe_output(output: &str) -> Result<MediaMetadata, FetchError> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            title: Option<String>,
            uploader: Option<String>,
            view_count: Option<u64>,
            duration: Option<f64>,
            description: Option<String>,
            #[serde(default)]
            tags: Vec<String>,
        }

        let probe: ProbeOutput =
            serde_json::from_str(output).map_err(|e| FetchError::ParseError {
                reason: format!("Failed to parse probe output: {}", e),
            })?;

        Ok(MediaMetadata {
            title: probe.title.unwrap_or_else(|| "video".to_string()),
            uploader: probe.uploader,
            view_count: probe.view_count,
            duration_secs: probe.duration.map(|d| d.max(0.0) as u64),
            description: probe.description,
            tags: probe.tags,
        })
    }

    /// Classifies a failed subprocess run from its stderr.
    fn classify_failure(stderr: &str) -> FetchError {
        for marker in UNAVAILABLE_MARKERS {
            if stderr.contains(marker) {
                return FetchError::unavailable(
                    stderr
                        .lines()
                        .find(|l| l.contains(marker))
                        .unwrap_or(marker)
                        .trim()
                        .to_string(),
                );
            }
        }
        FetchError::failed(
            "yt-dlp exited with an error",
            if stderr.is_empty() {
                None
            } else {
                Some(stderr.to_string())
            },
        )
    }

    fn spawn_error(&self, e: std::io::Error) -> FetchError {
        if e.kind() == std::io::ErrorKind::NotFound {
            FetchError::BinaryNotFound {
                path: self.config.ytdlp_path.clone(),
            }
        } else {
            FetchError::Io(e)
        }
    }
}

fn parse_size(s: &str) -> Option<u64> {
    s.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v as u64)
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    fn can_merge_streams(&self) -> bool {
        self.merge_capable
    }

    async fn probe(&self, url: &str) -> Result<MediaMetadata, FetchError> {
        let output = Command::new(&self.config.ytdlp_path)
            .args(["-J", "--no-warnings", "--no-playlist"])
            .arg(url)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(Self::classify_failure(&String::from_utf8_lossy(
                &output.stderr,
            )));
        }

        Self::parse_probe_output(&String::from_utf8_lossy(&output.stdout))
    }

    async fn fetch(
        &self,
        url: &str,
        plan: &DownloadPlan,
        dest_dir: &Path,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<(), FetchError> {
        tokio::fs::create_dir_all(dest_dir).await?;

        let args = self.build_fetch_args(url, plan, dest_dir);
        let mut child = Command::new(&self.config.ytdlp_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| FetchError::failed("Failed to capture yt-dlp stdout", None))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| FetchError::failed("Failed to capture yt-dlp stderr", None))?;

        // Drain stderr concurrently so a chatty process never stalls on a
        // full pipe; keep it for failure classification.
        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            let mut collected = String::new();
            while let Ok(Some(line)) = lines.next_line().await {
                collected.push_str(&line);
                collected.push('\n');
            }
            collected
        });

        let timeout_duration = Duration::from_secs(self.config.fetch_timeout_secs);
        let result = timeout(timeout_duration, async {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if let Some(sample) = Self::parse_progress_line(&line) {
                    progress.accept(sample);
                }
            }
            child.wait().await
        })
        .await;

        let status = match result {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => return Err(FetchError::Io(e)),
            Err(_) => {
                let _ = child.kill().await;
                return Err(FetchError::Timeout {
                    timeout_secs: self.config.fetch_timeout_secs,
                });
            }
        };

        let stderr_output = stderr_task.await.unwrap_or_default();

        if !status.success() {
            return Err(Self::classify_failure(&stderr_output));
        }

        progress.accept(ProgressSample::Finished);
        Ok(())
    }

    async fn validate(&self) -> Result<(), FetchError> {
        let result = Command::new(&self.config.ytdlp_path)
            .arg("--version")
            .output()
            .await;

        if let Err(e) = result {
            return Err(self.spawn_error(e));
        }

        tokio::fs::create_dir_all(&self.config.work_dir).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::formats::select_formats;
    use crate::fetcher::QualityTier;

    fn fetcher(merge: bool) -> YtDlpFetcher {
        YtDlpFetcher {
            config: DownloaderConfig::default(),
            merge_capable: merge,
        }
    }

    #[test]
    fn test_build_fetch_args() {
        let plan = select_formats(QualityTier::Sd, false);
        let args = fetcher(false).build_fetch_args(
            "https://youtu.be/abc123",
            &plan,
            Path::new("/tmp/work/req"),
        );

        assert_eq!(args[0], "-f");
        assert!(args[1].starts_with("best[height<=480][ext=mp4]/"));
        assert!(args[1].ends_with("/worst"));
        assert!(args.contains(&"--newline".to_string()));
        assert!(args.contains(&"--no-playlist".to_string()));
        assert!(!args.contains(&"--ffmpeg-location".to_string()));
        assert_eq!(args.last().unwrap(), "https://youtu.be/abc123");
    }

    #[test]
    fn test_build_fetch_args_with_merge() {
        let plan = select_formats(QualityTier::Hd, true);
        let args =
            fetcher(true).build_fetch_args("https://youtu.be/abc123", &plan, Path::new("/tmp"));
        assert!(args.contains(&"--ffmpeg-location".to_string()));
        assert!(args[1].contains("bestvideo[height<=1080]+bestaudio"));
    }

    #[test]
    fn test_parse_progress_line() {
        let sample = YtDlpFetcher::parse_progress_line("cfp 1024 2048 NA").unwrap();
        assert_eq!(
            sample,
            ProgressSample::Bytes {
                downloaded: 1024,
                total: Some(2048),
                total_estimate: None,
            }
        );
    }

    #[test]
    fn test_parse_progress_line_estimate_only() {
        let sample = YtDlpFetcher::parse_progress_line("cfp 512 NA 4096.7").unwrap();
        assert_eq!(
            sample,
            ProgressSample::Bytes {
                downloaded: 512,
                total: None,
                total_estimate: Some(4096),
            }
        );
    }

    #[test]
    fn test_parse_progress_line_ignores_other_output() {
        assert!(YtDlpFetcher::parse_progress_line("[download] Destination: x.mp4").is_none());
        assert!(YtDlpFetcher::parse_progress_line("").is_none());
    }

    #[test]
    fn test_parse_probe_output() {
        let json = r#"{
            "title": "Test Video",
            "uploader": "Some Channel",
            "view_count": 12345,
            "duration": 215.0,
            "description": "A description",
            "tags": ["music", "live"]
        }"#;
        let meta = YtDlpFetcher::parse_probe_output(json).unwrap();
        assert_eq!(meta.title, "Test Video");
        assert_eq!(meta.uploader.as_deref(), Some("Some Channel"));
        assert_eq!(meta.view_count, Some(12345));
        assert_eq!(meta.duration_secs, Some(215));
        assert_eq!(meta.tags.len(), 2);
    }

    #[test]
    fn test_parse_probe_output_minimal() {
        let meta = YtDlpFetcher::parse_probe_output("{}").unwrap();
        assert_eq!(meta.title, "video");
        assert!(meta.uploader.is_none());
        assert!(meta.tags.is_empty());
    }

    #[test]
    fn test_parse_probe_output_invalid() {
        let result = YtDlpFetcher::parse_probe_output("not json");
        assert!(matches!(result, Err(FetchError::ParseError { .. })));
    }

    #[test]
    fn test_classify_unavailable() {
        let err = YtDlpFetcher::classify_failure("ERROR: [youtube] abc123: Video unavailable");
        assert!(matches!(err, FetchError::Unavailable { .. }));
    }

    #[test]
    fn test_classify_other_failure_keeps_stderr() {
        let err = YtDlpFetcher::classify_failure("ERROR: unable to write data");
        match err {
            FetchError::Failed { stderr, .. } => {
                assert!(stderr.unwrap().contains("unable to write data"));
            }
            other => panic!("Expected Failed, got {:?}", other),
        }
    }
}
