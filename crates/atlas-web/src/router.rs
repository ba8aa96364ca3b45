//! Route table for the dashboard API.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::handlers::{
    catalog::{api_catalog, dismiss_banner},
    panels::{all_genes, charts, get_panel, no_genes, open_panel, range, reset, select, set_genes},
};
use crate::sse::sse_handler;
use crate::state::SharedState;

/// Build and return the full Axum router.
pub fn build_router(shared: SharedState, static_dir: &str) -> Router {
    Router::new()
        // SSE streaming
        .route("/api/events", get(sse_handler))

        // Page level
        .route("/api/catalog",        get(api_catalog))
        .route("/api/banner/dismiss", post(dismiss_banner))

        // Panels
        .route("/api/panels/{panel}",                      get(get_panel))
        .route("/api/panels/{panel}/open",                 post(open_panel))
        .route("/api/panels/{panel}/select",               post(select))
        .route("/api/panels/{panel}/reset",                post(reset))
        .route("/api/panels/{panel}/range/{subject}",      post(range))
        .route("/api/panels/{panel}/genes/{subject}",      post(set_genes))
        .route("/api/panels/{panel}/genes/{subject}/all",  post(all_genes))
        .route("/api/panels/{panel}/genes/{subject}/none", post(no_genes))
        .route("/api/panels/{panel}/charts",               get(charts))

        // Static files
        .nest_service("/static", ServeDir::new(static_dir))

        // Middleware
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}
