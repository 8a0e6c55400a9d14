//! stridex-dr - gait data review service
//!
//! Loads every supported file in the data folder into a subject index on
//! startup and serves it over HTTP. Uploads and clears rebuild the index.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Mutex;
use stridex_common::config::{load_config_or_default, DataFolderInitializer, DataFolderResolver, LoggingConfig};
use stridex_common::DiscoveryLimits;
use stridex_dr::{build_router, AppState};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "stridex-dr", version, about = "Gait sensor data review service")]
struct Args {
    /// Folder holding the input files (overrides STRIDEX_DATA_FOLDER and the config file)
    #[arg(long)]
    data_folder: Option<PathBuf>,

    /// Config file (default: <config dir>/stridex/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// HTTP port (overrides the config file)
    #[arg(long)]
    port: Option<u16>,

    /// Bind address (overrides the config file)
    #[arg(long)]
    host: Option<String>,
}

/// RUST_LOG wins; otherwise the configured level
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config_or_default(args.config.as_deref());

    init_tracing(&config.logging)?;

    info!(
        "Starting StrideX data review (stridex-dr) v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Data folder: CLI → ENV → TOML → OS default
    let data_folder = DataFolderResolver::new(&config).resolve(args.data_folder.as_deref());
    let initializer = DataFolderInitializer::new(data_folder.clone());
    initializer
        .ensure_directory_exists()
        .map_err(|e| anyhow::anyhow!("Failed to initialize data folder: {}", e))?;
    info!("Data folder: {}", data_folder.display());

    let state = AppState::new(data_folder, DiscoveryLimits::from(config.discovery));
    match state.rebuild_index().await {
        Ok(report) => {
            info!("✓ {}", report.headline());
            for error in &report.errors {
                warn!("{}", error);
            }
        }
        Err(e) => warn!("Initial index build failed: {}", e),
    }

    let app = build_router(state);

    let host = args.host.unwrap_or(config.host);
    let port = args.port.unwrap_or(config.port);
    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;
    info!("stridex-dr listening on http://{}:{}", host, port);
    info!("Health check: http://{}:{}/health", host, port);

    axum::serve(listener, app).await?;

    Ok(())
}
