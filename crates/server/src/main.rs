use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clipferry_core::{
    load_config, validate_config, ChannelTransport, DeliveryRouter, DownloadOrchestrator,
    ExpiringFileStore, MediaFetcher, TelegramChannel, YtDlpFetcher,
};

use clipferry_server::api::create_router;
use clipferry_server::bot::BotGateway;
use clipferry_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("CLIPFERRY_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;
    info!("Configuration loaded successfully");
    info!("Store directory: {:?}", config.store.dir);
    info!("Retrieval base URL: {}", config.server.public_base_url());

    // Shutdown fan-out for the background loops
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    // Messaging channel
    let channel = Arc::new(
        TelegramChannel::new(&config.bot.token).context("Failed to create Telegram channel")?,
    );

    // Expiring file store and its sweep loop
    let store = Arc::new(ExpiringFileStore::new(config.store.clone()));
    let sweeper_handle = Arc::clone(&store).spawn_sweeper(shutdown_tx.subscribe());

    // Fetcher backend
    let fetcher = YtDlpFetcher::detect(config.downloader.clone()).await;
    fetcher
        .validate()
        .await
        .context("yt-dlp is not available")?;
    info!(
        "Fetcher ready: {} (stream merging: {})",
        fetcher.name(),
        fetcher.can_merge_streams()
    );

    let orchestrator = Arc::new(DownloadOrchestrator::new(
        config.downloader.clone(),
        Arc::new(fetcher),
    ));

    let router = Arc::new(DeliveryRouter::new(
        Arc::clone(&channel) as Arc<dyn ChannelTransport>,
        Arc::clone(&store),
        config.server.public_base_url(),
        config.store.retention_hours,
    ));

    // Chat gateway
    let gateway = Arc::new(BotGateway::new(channel, orchestrator, router));
    let gateway_handle = tokio::spawn(gateway.run(shutdown_tx.subscribe()));

    // HTTP server for retrieval links
    let app_state = Arc::new(AppState::new(config.clone(), Arc::clone(&store)));
    let app = create_router(app_state);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Stop the background loops
    info!("Server shutting down...");
    let _ = shutdown_tx.send(());
    if let Err(e) = gateway_handle.await {
        warn!("Gateway task ended abnormally: {}", e);
    }
    if let Err(e) = sweeper_handle.await {
        warn!("Sweeper task ended abnormally: {}", e);
    }
    info!("Shutdown complete");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
