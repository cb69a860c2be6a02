pub mod channel;
pub mod config;
pub mod delivery;
pub mod fetcher;
pub mod filestore;
pub mod orchestrator;
pub mod progress;

pub use channel::{ChannelError, ChannelTransport, ChatId, MessageRef, TelegramChannel};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use delivery::{DeliveryError, DeliveryResult, DeliveryRouter};
pub use fetcher::{
    DownloadRequest, FetchError, MediaFetcher, MediaMetadata, QualityTier, YtDlpFetcher,
};
pub use filestore::{ExpiringFileStore, FileStoreError, RetrievedFile};
pub use orchestrator::{Artifact, DownloadError, DownloadOrchestrator};
pub use progress::{ProgressReporter, StatusMessage, StatusUpdater};
