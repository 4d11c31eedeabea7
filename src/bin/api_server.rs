// API Server Binary Entry Point
//
// Purpose: Serve plant health predictions over HTTP
// Usage: cargo run --features api --bin api_server

use hydro_health_engine::{create_router, AppState, PredictorHandle, ServiceConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (structured logging)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    // Default log level: info for our crate, warn for others
                    "hydro_health_engine=info,tower_http=debug,axum=debug,warn".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting API server...");

    // Configuration from environment variables
    let config = ServiceConfig::from_env();

    tracing::info!("Configuration:");
    tracing::info!("  MODEL_PATH: {}", config.model_path.display());
    tracing::info!("  HOST: {}", config.host);
    tracing::info!("  PORT: {}", config.port);
    tracing::info!("  RANGE_POLICY: {:?}", config.range_policy);

    // A missing or invalid artifact is not fatal for the process: serve
    // /health in degraded mode and answer 503 on /predict
    let handle = PredictorHandle::empty();
    if let Err(e) = handle.reload_from(&config.model_path, config.range_policy) {
        tracing::warn!("Model not loaded, starting in degraded mode: {}", e);
    }

    let app = create_router(AppState::new(handle));

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
