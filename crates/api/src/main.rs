use std::env;

use anyhow::{Context, Result};
use guide_api::{build_app, ApiConfig};
use guide_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("guide_api");

    let config = ApiConfig::from_env();
    let bind = env::var("GUIDE_BIND").unwrap_or_else(|_| "0.0.0.0:3001".to_string());
    let dataset_path = config.dataset_path.display().to_string();

    let app = build_app(config);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    tracing::info!(bind = %bind, dataset = %dataset_path, "knight guide api started");

    axum::serve(listener, app).await?;
    Ok(())
}
