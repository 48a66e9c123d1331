//! Workshop server binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use workshop_core::config::AppConfig;
use workshop_server::{AppState, create_router};

/// Workshop - an addon catalog server
#[derive(Parser, Debug)]
#[command(name = "workshopd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "WORKSHOP_CONFIG",
        default_value = "config/server.toml"
    )]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Workshop v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration: defaults, then optional file, then WORKSHOP_* env vars
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));
    let config_path = std::path::Path::new(&args.config);
    if config_path.exists() {
        tracing::info!(config_path = %args.config, "Loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::debug!("No config file found at {}", args.config);
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("WORKSHOP_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    // Initialize artifact storage
    let storage = workshop_storage::from_config(&config.storage, &config.upload)
        .await
        .context("failed to initialize artifact storage")?;

    // Verify storage before accepting requests; this catches configuration
    // errors early instead of reporting healthy with unreachable storage.
    storage
        .health_check()
        .await
        .context("storage health check failed")?;
    tracing::info!("Artifact storage initialized");

    // Initialize catalog store
    let catalog = workshop_catalog::from_config(&config.catalog)
        .await
        .context("failed to initialize catalog store")?;
    catalog
        .health_check()
        .await
        .context("catalog health check failed")?;
    tracing::info!("Catalog store initialized");

    // Create application state and router
    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;
    let state = AppState::new(config, storage, catalog);
    let app = create_router(state);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolve when SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
