//! folio-server - assignment persistence and sync service
//!
//! Serves the portfolio's assignment collection from a local SQLite cache and
//! mirrors changes to an optional remote table.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use folio_common::config::{CliOverrides, RootFolderInitializer, ServiceConfig};
use folio_common::db::init_database;
use folio_server::remote::{RemoteSync, SupabaseClient};
use folio_server::{build_router, AppState, AssignmentRepository, LocalCacheStore};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for folio-server
#[derive(Parser, Debug)]
#[command(name = "folio-server")]
#[command(about = "Assignment persistence and sync service for the Folio portfolio")]
#[command(version)]
struct Args {
    /// Config file (defaults to <config dir>/folio/config.toml)
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Data folder holding folio.db (env: FOLIO_ROOT_FOLDER)
    #[arg(short, long)]
    root_folder: Option<std::path::PathBuf>,

    /// Address to bind
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "FOLIO_PORT")]
    port: Option<u16>,

    /// Log level when RUST_LOG is not set
    #[arg(long)]
    log_level: Option<String>,

    /// Remote project URL (env: FOLIO_REMOTE_URL)
    #[arg(long)]
    remote_url: Option<String>,

    /// Remote anonymous API key (env: FOLIO_REMOTE_KEY)
    #[arg(long)]
    remote_key: Option<String>,
}

impl From<Args> for CliOverrides {
    fn from(args: Args) -> Self {
        Self {
            config_path: args.config,
            root_folder: args.root_folder,
            bind_host: args.bind,
            port: args.port,
            log_level: args.log_level,
            remote_url: args.remote_url,
            remote_key: args.remote_key,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = ServiceConfig::resolve(args.into());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("folio_server={0},folio_common={0},tower_http=debug", config.log_level)
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting Folio server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let initializer = RootFolderInitializer::new(config.root_folder.clone());
    initializer
        .ensure_directory_exists()
        .context("Failed to create root folder")?;
    info!("Database path: {}", config.db_path.display());

    let pool = init_database(&config.db_path)
        .await
        .context("Failed to open local cache database")?;

    let remote: Option<Arc<dyn RemoteSync>> = match &config.remote {
        Some(remote_config) => match SupabaseClient::new(remote_config) {
            Ok(client) => {
                info!("Remote sync enabled: {}", client.endpoint());
                Some(Arc::new(client) as Arc<dyn RemoteSync>)
            }
            Err(e) => {
                warn!("Remote sync disabled, client setup failed: {}", e);
                None
            }
        },
        None => {
            info!("Remote sync disabled (no remote URL/key configured)");
            None
        }
    };

    let cache = LocalCacheStore::new(pool, config.storage_key.clone());
    let repository = AssignmentRepository::open(cache, remote).await;

    // Runs alongside the server; the outcome is logged by the repository
    let _hydration = repository.spawn_hydration();

    let app = build_router(AppState::new(repository));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("folio-server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
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
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
