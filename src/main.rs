//! Hospital Prediction API server

use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hospital_predict::{config::Config, constants::APP_NAME, create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();

    let config = Config::from_env();

    // Initialize logging: JSON lines in production, human-readable otherwise
    let (json_layer, text_layer) = if config.is_production() {
        (Some(tracing_subscriber::fmt::layer().json()), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer()))
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "hospital_predict=debug,tower_http=debug".into()))
        .with(json_layer)
        .with(text_layer)
        .init();

    tracing::info!("{} starting ({})...", APP_NAME, config.environment);
    tracing::info!("Risk model: {}", config.risk_model_path().display());
    tracing::info!("Claim model: {}", config.claim_model_path().display());
    tracing::info!("Prediction logging: {}", if config.log_predictions { "on" } else { "off" });

    let port = config.port;
    let app = create_router(AppState::from_config(&config));

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
