//! Per-panel endpoints. Every mutation answers with the panel snapshot
//! right after the cascade settled; view data follows over SSE.

use atlas_cascade::{DeepLink, Handle, RangeEvent};
use atlas_catalog::Field;
use atlas_common::Subject;
use atlas_views::{render_snapshot, FigureRenderer, PanelSnapshot, RenderReport};
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::ApiError;
use crate::host::PanelCommand;
use crate::state::SharedState;

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct SelectBody {
    pub field: Field,
    /// `null` clears the field.
    pub value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RangeBody {
    Drag { handle: Handle, value: u32 },
    Input { handle: Handle, value: String },
    Commit,
}

impl From<RangeBody> for RangeEvent {
    fn from(body: RangeBody) -> Self {
        match body {
            RangeBody::Drag { handle, value } => RangeEvent::Drag { handle, value },
            RangeBody::Input { handle, value } => RangeEvent::Input { handle, text: value },
            RangeBody::Commit => RangeEvent::Commit,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GenesBody {
    pub genes: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ChartsResponse {
    pub report: RenderReport,
    pub figures: BTreeMap<String, Value>,
}

async fn call(state: &SharedState, panel: &str, command: PanelCommand) -> ApiResult<PanelSnapshot> {
    let snapshot = state.panel(panel)?.call(command).await?;
    Ok(Json(snapshot))
}

/// GET /api/panels/{panel}
pub async fn get_panel(State(state): State<SharedState>, Path(panel): Path<String>) -> ApiResult<PanelSnapshot> {
    call(&state, &panel, PanelCommand::Snapshot).await
}

/// POST /api/panels/{panel}/open
pub async fn open_panel(
    State(state): State<SharedState>,
    Path(panel): Path<String>,
    Json(link): Json<DeepLink>,
) -> ApiResult<PanelSnapshot> {
    call(&state, &panel, PanelCommand::Open(Some(link))).await
}

/// POST /api/panels/{panel}/select
pub async fn select(
    State(state): State<SharedState>,
    Path(panel): Path<String>,
    Json(body): Json<SelectBody>,
) -> ApiResult<PanelSnapshot> {
    call(&state, &panel, PanelCommand::Select { field: body.field, value: body.value }).await
}

/// POST /api/panels/{panel}/reset
pub async fn reset(State(state): State<SharedState>, Path(panel): Path<String>) -> ApiResult<PanelSnapshot> {
    call(&state, &panel, PanelCommand::Reset).await
}

/// POST /api/panels/{panel}/range/{subject}
pub async fn range(
    State(state): State<SharedState>,
    Path((panel, subject)): Path<(String, Subject)>,
    Json(body): Json<RangeBody>,
) -> ApiResult<PanelSnapshot> {
    call(&state, &panel, PanelCommand::Range { subject, event: body.into() }).await
}

/// POST /api/panels/{panel}/genes/{subject}
pub async fn set_genes(
    State(state): State<SharedState>,
    Path((panel, subject)): Path<(String, Subject)>,
    Json(body): Json<GenesBody>,
) -> ApiResult<PanelSnapshot> {
    call(&state, &panel, PanelCommand::SetGenes { subject, genes: body.genes }).await
}

/// POST /api/panels/{panel}/genes/{subject}/all
pub async fn all_genes(
    State(state): State<SharedState>,
    Path((panel, subject)): Path<(String, Subject)>,
) -> ApiResult<PanelSnapshot> {
    call(&state, &panel, PanelCommand::AllGenes(subject)).await
}

/// POST /api/panels/{panel}/genes/{subject}/none
pub async fn no_genes(
    State(state): State<SharedState>,
    Path((panel, subject)): Path<(String, Subject)>,
) -> ApiResult<PanelSnapshot> {
    call(&state, &panel, PanelCommand::NoGenes(subject)).await
}

/// GET /api/panels/{panel}/charts - the panel's charts as plotly figures
pub async fn charts(State(state): State<SharedState>, Path(panel): Path<String>) -> ApiResult<ChartsResponse> {
    let Json(snapshot) = call(&state, &panel, PanelCommand::Snapshot).await?;
    let mut renderer = FigureRenderer::new();
    let report = render_snapshot(&mut renderer, &snapshot);
    Ok(Json(ChartsResponse { report, figures: renderer.into_figures() }))
}
