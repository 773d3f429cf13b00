//! Chat story builder preview host entry point.

use std::error::Error;
use std::sync::Arc;

use axum::Router;
use chatstory_api::config::AppConfig;
use chatstory_api::routes;
use chatstory_api::state::AppState;
use chatstory_core::clock::SystemClock;
use chatstory_core::timer::TokioTimer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting chat story preview host");

    let config = AppConfig::from_env()?;
    let app_state = AppState::new(
        Arc::new(SystemClock),
        Arc::new(TokioTimer),
        config.playback(),
    );

    // The editor runs on its own origin.
    let app = Router::new()
        .merge(routes::health::router())
        .nest(
            "/api/v1/stories",
            routes::stories::router().merge(routes::playback::router()),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let addr = config.addr()?;
    tracing::info!(%addr, pacing_ms = config.pacing.as_millis(), "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
