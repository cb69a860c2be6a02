use clipferry_core::{Config, ExpiringFileStore, SanitizedConfig};
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    config: Config,
    store: Arc<ExpiringFileStore>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<ExpiringFileStore>) -> Self {
        Self { config, store }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn store(&self) -> &ExpiringFileStore {
        &self.store
    }
}
