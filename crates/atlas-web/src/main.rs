//! Phage Atlas dashboard server
//!
//! Run with: cargo run -p atlas-web
//! Configuration is read from `ATLAS_CONFIG` (default `atlas.toml`).

use std::net::SocketAddr;
use std::sync::Arc;

use atlas_client::HttpAtlasSource;
use atlas_common::DashboardConfig;
use atlas_views::Dashboard;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = DashboardConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .init();

    config.validate()?;
    info!(base_url = %config.source.base_url, comparison = config.server.comparison, "Starting Phage Atlas dashboard");

    let source = Arc::new(HttpAtlasSource::new(&config.source)?);
    let dashboard = Dashboard::load(source, &config, None).await;
    let state = Arc::new(atlas_web::state::AppState::new(dashboard));

    let app = atlas_web::router::build_router(state, &config.server.static_dir);

    let addr: SocketAddr = config.server.bind.parse()?;
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
