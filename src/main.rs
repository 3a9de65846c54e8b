//! Lexisub daemon
//!
//! Runs a subtitle learning session against a headless page and exposes
//! ingestion, the synchronized overlay and the vocabulary over HTTP.

mod config;
mod config_file;
mod error;
mod http;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ServerConfig;
use crate::config_file::{generate_default_config, ConfigFile};
use crate::error::{Result, ServerError};
use crate::http::create_router;
use crate::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
const APP_NAME: &str = "lexisub";

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let first = args.next();

    if first.as_deref() == Some("--generate-config") {
        let path = args.next().unwrap_or_else(|| "config.toml".to_string());
        generate_default_config(&path).map_err(|e| ServerError::Config(e.to_string()))?;
        println!("Wrote default configuration to {}", path);
        return Ok(());
    }

    // Load configuration
    let config_path = first.unwrap_or_else(|| "config.toml".to_string());
    let (config, load_error) = if std::path::Path::new(&config_path).exists() {
        match ConfigFile::from_file(&config_path) {
            Ok(cf) => (cf.into_server_config(), None),
            Err(e) => (ServerConfig::default(), Some(e.to_string())),
        }
    } else {
        (ServerConfig::default(), None)
    };

    init_logging(&config.log_level, &config.log_format);

    tracing::info!("{} v{} starting", APP_NAME, VERSION);
    if let Some(e) = load_error {
        tracing::warn!(
            "Failed to load config file {}: {}. Using defaults.",
            config_path,
            e
        );
    }
    tracing::info!("Configuration loaded: {:?}", config);

    let addr: SocketAddr = config
        .socket_addr()
        .parse()
        .map_err(|e| ServerError::Config(format!("{}: {}", config.socket_addr(), e)))?;

    // Create application state
    let state = Arc::new(AppState::start(config).await?);

    // Build router
    let app = create_router(state.clone());

    // Start server
    tracing::info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.shutdown();
    tracing::info!("{} stopped", APP_NAME);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

/// Initialize logging with tracing
fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "lexisub={level},lexisub_lib={level},tower_http={level}",
            level = level
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
