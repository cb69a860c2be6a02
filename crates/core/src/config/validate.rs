use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Bot token is not empty
/// - Server port is not 0
/// - Retention window and fetch concurrency are non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.bot.token.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "bot.token cannot be empty".to_string(),
        ));
    }

    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.store.retention_hours == 0 {
        return Err(ConfigError::ValidationError(
            "store.retention_hours cannot be 0".to_string(),
        ));
    }

    if config.downloader.max_concurrent == 0 {
        return Err(ConfigError::ValidationError(
            "downloader.max_concurrent cannot be 0".to_string(),
        ));
    }

    Ok(())
}
