use anyhow::Context;
use tracing_subscriber::EnvFilter;

use cinerec::api::{create_router, AppState};
use cinerec::config::Config;
use cinerec::data::Dataset;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    // The three tables are loaded once; the store stays read-only for the
    // process lifetime.
    let dataset = Dataset::load(
        &config.users_path,
        &config.movies_path,
        &config.ratings_path,
    )
    .context("Failed to load dataset")?;

    let state = AppState::new(dataset, config.recommender());
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
