pub mod bootstrap;
pub mod processor;
pub mod webhook;

use anyhow::Result;
use balcao_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use balcao_core::config::LogFormat::*;
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

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config)?;
    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!(
        event_name = "system.server.started",
        bind_address = %address,
        escalations = if app.config.whatsapp.operator_phone.is_some() { "enabled" } else { "disabled" },
        "webhook relay listening"
    );
    tracing::info!(
        event_name = "system.server.webhook_ready",
        url = %format!("http://{address}/webhook"),
        "ready to receive messages"
    );

    axum::serve(listener, webhook::router(app.state))
        .with_graceful_shutdown(wait_for_shutdown())
        .await?;

    tracing::info!(event_name = "system.server.stopping", "webhook relay stopping");
    Ok(())
}

async fn wait_for_shutdown() {
    let _ = tokio::signal::ctrl_c().await;
}
