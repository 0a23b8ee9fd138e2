//! Regional Pulse server: `/api/translate` plus the static site.

mod config;
mod handlers;
mod routes;
mod state;
mod translator;

use anyhow::{Context, Result};
use regional_pulse_runtime::{init_logging, LoggingOptions};

use crate::config::{ServerConfig, TranslatorConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let _logging = init_logging(&LoggingOptions::from_env("regional-pulse-backend"))?;

    let server_config = ServerConfig::from_env();
    let translator_config = TranslatorConfig::from_env();

    tracing::info!("Starting Regional Pulse backend server");
    tracing::info!("Site directory: {}", server_config.site_dir.display());
    tracing::info!(
        "Translation model: {} via {}",
        translator_config.model,
        translator_config.completions_url()
    );

    let app_state = state::AppState::new(translator_config)?;
    let app = routes::create_router(app_state, &server_config.site_dir);

    let addr = server_config.listen_addr();
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
