//! rememo-ai - Main entry point
//!
//! Photo diary and photo recommendation service:
//! - POST /score and /score_clip recommend photos from a batch
//! - POST /generate and /modify write and edit a diary entry

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use rememo_common::config::{resolve_openai_api_key, ConfigResolver, ConfigSource};
use rememo_common::logging::init_tracing;
use tokio::signal;
use tracing::{error, info, warn};

use rememo_ai::services::{HttpAestheticProvider, HttpPhotoFetcher, OpenAiClient};
use rememo_ai::{build_router, AppState, Capabilities};

/// Command-line arguments for rememo-ai
#[derive(Parser, Debug)]
#[command(name = "rememo-ai")]
#[command(about = "Photo diary and photo recommendation service")]
#[command(version)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on, overrides the config file
    #[arg(short, long, env = "REMEMO_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (mut config, source) = ConfigResolver::new("rememo-ai")
        .with_explicit_path(args.config.clone())
        .load()
        .context("Failed to load configuration")?;
    init_tracing(&config.logging).context("Failed to initialize tracing")?;

    match &source {
        ConfigSource::File { path, tier } => {
            info!("Loaded config from {} ({:?})", path.display(), tier);
        }
        ConfigSource::Defaults { looked_for: Some(path) } => {
            warn!("No config file at {}, using defaults", path.display());
        }
        ConfigSource::Defaults { looked_for: None } => {
            warn!("No config directory available, using defaults");
        }
    }

    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.selection.validate().context("Invalid selection settings")?;
    let api_key = resolve_openai_api_key(&config.openai).context("OpenAI API key is required")?;

    info!(
        "Starting rememo-ai v{} (strategy {:?}, model {})",
        env!("CARGO_PKG_VERSION"),
        config.selection.strategy,
        config.openai.model
    );

    let fetcher = HttpPhotoFetcher::new(Duration::from_secs(config.fetch.timeout_secs))
        .context("Failed to build photo fetcher")?;
    let provider = HttpAestheticProvider::new(
        config.aesthetic.endpoint.clone(),
        Duration::from_secs(config.aesthetic.timeout_secs),
    )
    .context("Failed to build aesthetic provider client")?;
    let model = OpenAiClient::new(
        &config.openai.base_url,
        api_key,
        Duration::from_secs(config.openai.timeout_secs),
    )
    .context("Failed to build OpenAI client")?;

    let capabilities = Capabilities {
        fetcher: Arc::new(fetcher),
        provider: Arc::new(provider),
        model: Arc::new(model),
    };
    let state = AppState::new(capabilities, &config);
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.server.host, config.server.port))?;
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

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
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
