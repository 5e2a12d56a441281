use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use trip_fulfillment_webhook::config::AppConfig;
use trip_fulfillment_webhook::environment::AppState;
use trip_fulfillment_webhook::handlers::webhook::create_router;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("trip_fulfillment_webhook=info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    info!(backend = %config.backend_base_url, "starting fulfillment webhook");

    let app_state = AppState::new(config.clone())?;

    // Pre-load the location cache so the first webhook request doesn't pay
    // for the catalog fetch. Failure falls back to the static table.
    let locations = app_state.locations.clone();
    tokio::spawn(async move {
        locations.warm().await;
    });

    let app = create_router(app_state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    info!(port = config.port, "listening");
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
