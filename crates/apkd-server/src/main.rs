//! # apkd server
//!
//! HTTP front end that downloads Android packages from a remote store into a
//! local directory.

mod api;
mod services;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use services::store::{AppStore, HttpStore};

/// Shared application state available to all handlers.
pub struct AppState {
    /// Absolute download root, fixed at startup.
    pub download_root: PathBuf,
    pub store: Arc<dyn AppStore>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    // Load configuration
    let config = apkd_common::AppConfig::load().context("Failed to load configuration")?;

    // Initialize tracing
    let (filter, filter_warning) = log_filter(
        std::env::var("LOG_LEVEL").ok().as_deref(),
        &config.server.log_level,
    );
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .init();
    if let Some(warning) = filter_warning {
        tracing::warn!("{}", warning);
    }

    tracing::info!("Starting apkd server...");

    // Create the download directory (if not already existing)
    let download_root = config
        .storage
        .absolute_download_dir()
        .context("Failed to resolve download directory")?;
    tokio::fs::create_dir_all(&download_root)
        .await
        .with_context(|| format!("Failed to create {}", download_root.display()))?;
    tracing::info!(path = %download_root.display(), "Download directory ready");

    let store = HttpStore::new(&config.store)?;
    tracing::info!(base_url = %config.store.base_url, "Store client configured");

    let state = Arc::new(AppState {
        download_root,
        store: Arc::new(store),
    });

    let app = Router::new()
        .merge(api::router(state))
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid listen address")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// `RUST_LOG` wins, then the legacy `LOG_LEVEL` variable, then config.
///
/// Returns a warning to log once the subscriber is up when `legacy` holds a
/// value that is not a known level.
fn log_filter(legacy: Option<&str>, configured: &str) -> (EnvFilter, Option<String>) {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return (filter, None);
    }

    let configured = legacy_log_level(configured).unwrap_or(configured);
    match legacy {
        Some(raw) => match legacy_log_level(raw) {
            Some(level) => (EnvFilter::new(level), None),
            None => (
                EnvFilter::new(configured),
                Some(format!(
                    "Ignoring unrecognised LOG_LEVEL {:?}, using {:?}",
                    raw, configured
                )),
            ),
        },
        None => (EnvFilter::new(configured), None),
    }
}

/// Translate a Python-style level name or number into a `tracing` level.
fn legacy_log_level(raw: &str) -> Option<&'static str> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "NOTSET" | "0" | "TRACE" => Some("trace"),
        "DEBUG" | "10" => Some("debug"),
        "INFO" | "20" => Some("info"),
        "WARN" | "WARNING" | "30" => Some("warn"),
        "ERROR" | "40" | "CRITICAL" | "FATAL" | "50" => Some("error"),
        "OFF" => Some("off"),
        _ => None,
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install CTRL+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
