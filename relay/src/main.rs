//! Autocard Relay - adds newly opened GitHub issues to project columns.
//!
//! Configuration is read once from the JSON file named by
//! `AUTOCARD_CONFIG_FILE` (default `autocard.json`).

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use autocard::{config, router, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = config::config_path_from_env();
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    // Initialize structured JSON logging
    let default_level = if config.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!(
        path = %config_path.display(),
        port = config.listen_port,
        api_host = %config.api_host,
        debug = config.debug,
        "config_loaded"
    );
    if config.debug {
        info!(config = ?config, "debug_mode_on");
    }

    let port = config.listen_port;
    let state = AppState::new(config).context("Failed to create GitHub client")?;
    let app = router(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(address = %addr, "relay_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("relay_shutdown_complete");

    Ok(())
}

/// Resolve once SIGINT or SIGTERM arrives, so in-flight webhooks can finish.
async fn shutdown_signal() {
    let interrupt = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let received = tokio::select! {
        _ = interrupt => "SIGINT",
        _ = terminate => "SIGTERM",
    };

    info!(signal = received, "relay_shutting_down");
}
