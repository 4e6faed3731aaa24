mod bootstrap;
mod catalog;
mod health;
mod packs;

use std::time::Duration;

use anyhow::Result;
use packdeal_core::config::{AppConfig, LoadOptions};
use tracing::{error, info, warn};

fn init_logging(config: &AppConfig) {
    use packdeal_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    let router = health::router(app.db_pool.clone()).merge(packs::router(app.packs.clone()));

    info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        pack_id = "unknown",
        bind_address = %address,
        "packdeal-server listening"
    );

    axum::serve(listener, router).with_graceful_shutdown(wait_for_shutdown()).await?;

    info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        pack_id = "unknown",
        "packdeal-server stopping"
    );

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    if tokio::time::timeout(grace, app.db_pool.close()).await.is_err() {
        warn!(
            event_name = "system.server.pool_close_timeout",
            correlation_id = "shutdown",
            pack_id = "unknown",
            grace_secs = app.config.server.graceful_shutdown_secs,
            "database pool did not close within the grace period"
        );
    }

    Ok(())
}

async fn wait_for_shutdown() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        error!(
            event_name = "system.server.signal_error",
            correlation_id = "shutdown",
            pack_id = "unknown",
            error = %error,
            "failed to listen for shutdown signal"
        );
    }
}
