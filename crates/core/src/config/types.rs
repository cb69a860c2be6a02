use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub bot: BotConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub downloader: DownloaderConfig,
}

/// Bot credential configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotConfig {
    /// Telegram bot token. Required, no default.
    pub token: String,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Base URL used when building retrieval links. Derived from
    /// host/port when not set.
    #[serde(default)]
    pub public_base_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_base_url: None,
        }
    }
}

impl ServerConfig {
    /// The base URL retrieval links are built from.
    pub fn public_base_url(&self) -> String {
        match &self.public_base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}:{}", self.host, self.port),
        }
    }
}

fn default_host() -> IpAddr {
    "127.0.0.1".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Expiring file store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_dir")]
    pub dir: PathBuf,
    /// How long an unretrieved file is kept before the sweep reclaims it.
    #[serde(default = "default_retention_hours")]
    pub retention_hours: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: default_store_dir(),
            retention_hours: default_retention_hours(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_store_dir() -> PathBuf {
    PathBuf::from("store")
}

fn default_retention_hours() -> u64 {
    24
}

fn default_sweep_interval_secs() -> u64 {
    3600
}

/// Downloader configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloaderConfig {
    /// Simultaneous fetches; requests beyond this queue.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Seconds between progress message updates.
    #[serde(default = "default_report_interval_secs")]
    pub report_interval_secs: u64,
    /// Scratch directory for in-flight downloads.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: PathBuf,
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,
    /// Hard cap on a single fetch (default: 30 minutes).
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            report_interval_secs: default_report_interval_secs(),
            work_dir: default_work_dir(),
            ytdlp_path: default_ytdlp_path(),
            ffmpeg_path: default_ffmpeg_path(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

fn default_max_concurrent() -> usize {
    3
}

fn default_report_interval_secs() -> u64 {
    5
}

fn default_work_dir() -> PathBuf {
    PathBuf::from("work")
}

fn default_ytdlp_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_fetch_timeout_secs() -> u64 {
    1800
}

/// Sanitized config for API responses (token redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub bot: SanitizedBotConfig,
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub downloader: DownloaderConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedBotConfig {
    pub token_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            bot: SanitizedBotConfig {
                token_configured: !config.bot.token.is_empty(),
            },
            server: config.server.clone(),
            store: config.store.clone(),
            downloader: config.downloader.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_config() {
        let toml = r#"
[bot]
token = "123:abc"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.bot.token, "123:abc");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(config.store.retention_hours, 24);
        assert_eq!(config.downloader.max_concurrent, 3);
    }

    #[test]
    fn test_deserialize_missing_bot_fails() {
        let toml = r#"
[server]
port = 8080
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_public_base_url_derived() {
        let config = ServerConfig::default();
        assert_eq!(config.public_base_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_public_base_url_override_trims_slash() {
        let config = ServerConfig {
            public_base_url: Some("https://files.example.com/".to_string()),
            ..Default::default()
        };
        assert_eq!(config.public_base_url(), "https://files.example.com");
    }

    #[test]
    fn test_sanitized_config_hides_token() {
        let config = Config {
            bot: BotConfig {
                token: "123:secret".to_string(),
            },
            server: ServerConfig::default(),
            store: StoreConfig::default(),
            downloader: DownloaderConfig::default(),
        };
        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.bot.token_configured);
        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("secret"));
    }

    #[test]
    fn test_deserialize_custom_sections() {
        let toml = r#"
[bot]
token = "123:abc"

[server]
host = "0.0.0.0"
port = 9000
public_base_url = "https://dl.example.com"

[store]
dir = "/data/store"
retention_hours = 48

[downloader]
max_concurrent = 5
ytdlp_path = "/usr/local/bin/yt-dlp"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.public_base_url(), "https://dl.example.com");
        assert_eq!(config.store.dir.to_str().unwrap(), "/data/store");
        assert_eq!(config.store.retention_hours, 48);
        assert_eq!(config.downloader.max_concurrent, 5);
        assert_eq!(
            config.downloader.ytdlp_path.to_str().unwrap(),
            "/usr/local/bin/yt-dlp"
        );
    }
}
