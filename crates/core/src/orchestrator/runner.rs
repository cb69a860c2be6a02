//! Download orchestration.
//!
//! Runs one request end to end: probe, format selection, the fetch itself
//! under the concurrency cap, progress reporting on the side, and locating
//! the finished output file.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::types::{Artifact, DownloadError};
use crate::config::DownloaderConfig;
use crate::fetcher::{
    find_output_file, select_formats, DownloadRequest, FetchError, MediaFetcher,
};
use crate::progress::{ProgressReporter, ProgressSink, SharedProgress, StatusUpdater};

pub struct DownloadOrchestrator {
    config: DownloaderConfig,
    fetcher: Arc<dyn MediaFetcher>,
    semaphore: Arc<Semaphore>,
}

impl DownloadOrchestrator {
    pub fn new(config: DownloaderConfig, fetcher: Arc<dyn MediaFetcher>) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent));
        Self {
            config,
            fetcher,
            semaphore,
        }
    }

    /// Runs a request to completion and returns the finished artifact.
    ///
    /// The probe happens before the concurrency permit is taken; only the
    /// transfer itself counts against the cap.
    pub async fn run(
        &self,
        request: &DownloadRequest,
        status: Arc<dyn StatusUpdater>,
    ) -> Result<Artifact, DownloadError> {
        let metadata = self
            .fetcher
            .probe(&request.url)
            .await
            .map_err(map_fetch_error)?;

        info!(
            "Starting {} download of '{}' ({})",
            request.tier.as_str(),
            metadata.title,
            request.url
        );

        let plan = select_formats(request.tier, self.fetcher.can_merge_streams());
        let dest_dir = self
            .config
            .work_dir
            .join(Uuid::new_v4().simple().to_string());

        let shared = Arc::new(SharedProgress::new());
        let reporter = ProgressReporter::new(
            Arc::clone(&shared),
            status,
            metadata.title.clone(),
            Duration::from_secs(self.config.report_interval_secs),
        );
        let reporter_handle = tokio::spawn(reporter.run());

        let fetched = {
            let _permit = self
                .semaphore
                .acquire()
                .await
                .map_err(|e| DownloadError::Unexpected(format!("Semaphore closed: {}", e)))?;
            self.fetcher
                .fetch(
                    &request.url,
                    &plan,
                    &dest_dir,
                    Arc::clone(&shared) as Arc<dyn ProgressSink>,
                )
                .await
        };

        // Stop the reporter whether the fetch succeeded or not
        shared.finish();
        if let Err(e) = reporter_handle.await {
            warn!("Progress reporter task panicked: {}", e);
        }

        if let Err(e) = fetched {
            error!("Fetch of '{}' failed: {}", request.url, e);
            cleanup_dir(&dest_dir).await;
            return Err(map_fetch_error(e));
        }

        let path = match find_output_file(&dest_dir).await {
            Ok(Some(path)) => path,
            Ok(None) => {
                cleanup_dir(&dest_dir).await;
                return Err(DownloadError::NoOutputProduced);
            }
            Err(e) => {
                cleanup_dir(&dest_dir).await;
                return Err(map_fetch_error(e));
            }
        };

        let size_bytes = tokio::fs::metadata(&path)
            .await
            .map_err(|e| DownloadError::Unexpected(format!("Failed to stat output: {}", e)))?
            .len();

        info!(
            "Finished download of '{}' ({} bytes)",
            metadata.title, size_bytes
        );

        Ok(Artifact {
            path,
            size_bytes,
            title: metadata.title.clone(),
            metadata,
        })
    }
}

fn map_fetch_error(e: FetchError) -> DownloadError {
    match e {
        FetchError::Unavailable { reason } => DownloadError::ResourceUnavailable(reason),
        FetchError::Timeout { timeout_secs } => DownloadError::Timeout(timeout_secs),
        other => DownloadError::Unexpected(other.to_string()),
    }
}

async fn cleanup_dir(dir: &std::path::Path) {
    if let Err(e) = tokio::fs::remove_dir_all(dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to clean up work dir {:?}: {}", dir, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelError;
    use crate::fetcher::{DownloadPlan, MediaMetadata, ProgressSample, QualityTier};
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct NullStatus;

    #[async_trait]
    impl StatusUpdater for NullStatus {
        async fn update(&self, _text: &str) -> Result<(), ChannelError> {
            Ok(())
        }
    }

    enum Behavior {
        ProduceFile(usize),
        ProduceNothing,
        Unavailable,
    }

    struct MockFetcher {
        behavior: Behavior,
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    impl MockFetcher {
        fn new(behavior: Behavior) -> Self {
            Self {
                behavior,
                active: AtomicUsize::new(0),
                max_active: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MediaFetcher for MockFetcher {
        fn name(&self) -> &str {
            "mock"
        }

        fn can_merge_streams(&self) -> bool {
            false
        }

        async fn probe(&self, _url: &str) -> Result<MediaMetadata, FetchError> {
            if matches!(self.behavior, Behavior::Unavailable) {
                return Err(FetchError::unavailable("Video unavailable"));
            }
            Ok(MediaMetadata {
                title: "Mock Video".to_string(),
                ..Default::default()
            })
        }

        async fn fetch(
            &self,
            _url: &str,
            _plan: &DownloadPlan,
            dest_dir: &Path,
            progress: Arc<dyn ProgressSink>,
        ) -> Result<(), FetchError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);

            match self.behavior {
                Behavior::ProduceFile(size) => {
                    tokio::fs::create_dir_all(dest_dir).await?;
                    tokio::fs::write(dest_dir.join("Mock Video.mp4"), vec![0u8; size]).await?;
                    progress.accept(ProgressSample::Bytes {
                        downloaded: size as u64,
                        total: Some(size as u64),
                        total_estimate: None,
                    });
                    Ok(())
                }
                Behavior::ProduceNothing => {
                    tokio::fs::create_dir_all(dest_dir).await?;
                    Ok(())
                }
                Behavior::Unavailable => Err(FetchError::unavailable("Video unavailable")),
            }
        }

        async fn validate(&self) -> Result<(), FetchError> {
            Ok(())
        }
    }

    fn config_in(temp: &TempDir, max_concurrent: usize) -> DownloaderConfig {
        DownloaderConfig {
            max_concurrent,
            report_interval_secs: 1,
            work_dir: temp.path().to_path_buf(),
            ..Default::default()
        }
    }

    fn request(tier: QualityTier) -> DownloadRequest {
        DownloadRequest::new("https://youtu.be/abc123", tier)
    }

    #[tokio::test]
    async fn test_successful_run_produces_artifact() {
        let temp = TempDir::new().unwrap();
        let fetcher = Arc::new(MockFetcher::new(Behavior::ProduceFile(64)));
        let orchestrator = DownloadOrchestrator::new(config_in(&temp, 3), fetcher);

        let artifact = orchestrator
            .run(&request(QualityTier::Hd), Arc::new(NullStatus))
            .await
            .unwrap();

        assert_eq!(artifact.title, "Mock Video");
        assert_eq!(artifact.size_bytes, 64);
        assert!(artifact.path.exists());
    }

    #[tokio::test]
    async fn test_unavailable_resource_maps_to_user_error() {
        let temp = TempDir::new().unwrap();
        let fetcher = Arc::new(MockFetcher::new(Behavior::Unavailable));
        let orchestrator = DownloadOrchestrator::new(config_in(&temp, 3), fetcher);

        let result = orchestrator
            .run(&request(QualityTier::Sd), Arc::new(NullStatus))
            .await;

        assert!(matches!(
            result,
            Err(DownloadError::ResourceUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_output_dir_is_an_error() {
        let temp = TempDir::new().unwrap();
        let fetcher = Arc::new(MockFetcher::new(Behavior::ProduceNothing));
        let orchestrator = DownloadOrchestrator::new(config_in(&temp, 3), fetcher);

        let result = orchestrator
            .run(&request(QualityTier::Audio), Arc::new(NullStatus))
            .await;

        assert!(matches!(result, Err(DownloadError::NoOutputProduced)));
    }

    #[tokio::test]
    async fn test_concurrency_cap_is_enforced() {
        let temp = TempDir::new().unwrap();
        let fetcher = Arc::new(MockFetcher::new(Behavior::ProduceFile(8)));
        let orchestrator = Arc::new(DownloadOrchestrator::new(
            config_in(&temp, 2),
            Arc::clone(&fetcher) as Arc<dyn MediaFetcher>,
        ));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let orch = Arc::clone(&orchestrator);
            handles.push(tokio::spawn(async move {
                orch.run(&request(QualityTier::Hd), Arc::new(NullStatus))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert!(fetcher.max_active.load(Ordering::SeqCst) <= 2);
    }
}
