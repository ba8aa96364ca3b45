//! Page-level endpoints: catalog availability and the banner.

use atlas_catalog::OptionSet;
use atlas_views::{Banner, Layout};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct CatalogOverview {
    pub available: bool,
    pub layout: Layout,
    pub banner: Option<Banner>,
    pub options_a: OptionSet,
    pub panels: Vec<String>,
}

/// GET /api/catalog
pub async fn api_catalog(State(state): State<SharedState>) -> Json<CatalogOverview> {
    Json(CatalogOverview {
        available: state.catalog_available,
        layout: state.layout,
        banner: state.banner(),
        options_a: state.options_a.clone(),
        panels: state.panel_ids().into_iter().map(String::from).collect(),
    })
}

/// POST /api/banner/dismiss
pub async fn dismiss_banner(State(state): State<SharedState>) -> StatusCode {
    state.dismiss_banner();
    StatusCode::NO_CONTENT
}
