mod bootstrap;
mod health;
pub mod webhook;

use std::time::Duration;

use anyhow::Result;
use zafra_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use tracing::Level;
    use zafra_core::config::LogFormat::*;

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
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap(config).await?;

    let state = webhook::WebhookState::new(
        app.sessions.clone(),
        app.engine.clone(),
        &app.config.whatsapp,
    );
    let router = webhook::router(state).merge(health::router(app.db_pool.clone()));

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!(
        event_name = "system.server.started",
        bind_address = %address,
        signature_validation = app.config.whatsapp.validate_signature,
        "zafra-server listening"
    );

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    axum::serve(listener, router).with_graceful_shutdown(shutdown_signal(grace)).await?;

    tracing::info!(event_name = "system.server.stopped", "zafra-server stopped");
    Ok(())
}

async fn shutdown_signal(grace: Duration) {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!(
        event_name = "system.server.stopping",
        grace_secs = grace.as_secs(),
        "shutdown signal received, draining in-flight requests"
    );

    // Hard exit if the drain window elapses with requests still open.
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        tracing::warn!(
            event_name = "system.server.drain_timeout",
            "graceful shutdown window elapsed, exiting"
        );
        std::process::exit(0);
    });
}
