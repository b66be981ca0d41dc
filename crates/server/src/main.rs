use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seedkeeper_core::{
    build_sources, load_config, validate_config, JellyfinNotifier, LibraryNotifier,
    QBittorrentClient, Stores, TorrentClient,
};
use seedkeeper_server::{api::create_router, state::AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
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
    let config_path = std::env::var("SEEDKEEPER_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        version = VERSION,
        config_hash = &config_hash[..16],
        "Configuration loaded successfully"
    );

    // The download client must be reachable at startup
    info!("Connecting to qBittorrent at {}", config.torrent_client.url);
    let client: Arc<dyn TorrentClient> = Arc::new(
        QBittorrentClient::connect(config.torrent_client.clone())
            .await
            .context("Failed to connect to qBittorrent")?,
    );

    let stores = Stores::open(&config.storage).context("Failed to open stores")?;
    info!(
        blacklisted = stores.blacklist.len(),
        history = stores.history.len(),
        "Stores loaded"
    );

    let sources = build_sources(&config.sources).context("Failed to build source adapters")?;
    info!(
        sources = ?sources.iter().map(|s| s.name()).collect::<Vec<_>>(),
        "Source adapters ready"
    );

    // Media library notifications are optional
    let notifier: Option<Arc<dyn LibraryNotifier>> = match &config.media_library {
        Some(library) if library.auto_scan => match JellyfinNotifier::connect(library).await {
            Ok(notifier) => {
                info!("Jellyfin rescans enabled at {}", library.url);
                Some(Arc::new(notifier))
            }
            Err(e) => {
                warn!(error = %e, "Jellyfin notifier unavailable, rescans disabled");
                None
            }
        },
        Some(_) => {
            info!("Jellyfin configured with auto_scan disabled");
            None
        }
        None => None,
    };

    let state = Arc::new(AppState::new(
        config.clone(),
        client,
        sources,
        stores,
        notifier,
    ));

    if config.monitor.auto_start {
        state.monitor().start().await;
    } else {
        info!("Monitor loop not started (auto_start = false)");
    }

    // Create router
    let app = create_router(Arc::clone(&state));

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    if state.monitor().is_running() {
        state.monitor().stop().await;
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
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
