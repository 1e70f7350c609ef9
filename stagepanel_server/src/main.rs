//! Stagepanel Server - Request tab service for the monitoring dashboard
//!
//! This server handles:
//! - Rendering the request tab for posted request traces
//! - Storing the widget threshold settings
//! - Serving the request tab templates

mod config;
mod routes;

use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,stagepanel_server=debug,stagepanel_common=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::from_env()?;
    tracing::info!("Starting stagepanel server on {}:{}", config.host, config.port);
    tracing::info!("Templates served under {}/tabs", config.static_prefix);
    for (key, value) in &config.default_settings {
        tracing::info!("Default setting {} = {}", key, value);
    }

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let app = routes::app(routes::AppState::new(config));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
