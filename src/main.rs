use std::sync::Arc;

mod classify;
mod config;
mod http;
mod json_extract;
mod models;
mod ocr;
mod routes;
mod text;
mod validate;

use config::Config;
use routes::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is normal in production.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;
    tracing::debug!(?config, "configuration loaded");
    if config.vision_api_key.is_none() {
        tracing::warn!("GOOGLE_VISION_API_KEY is not set, image detection will fail");
    }
    if config.gemini_api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set, classification will fail");
    }

    let bind_addr = config.bind_addr;
    let state = Arc::new(AppState::new(&config)?);
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
