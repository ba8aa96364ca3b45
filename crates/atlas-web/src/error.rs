use atlas_common::AtlasError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Atlas(#[from] AtlasError),

    #[error("Panel {0} is not running")]
    PanelStopped(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Atlas(AtlasError::InvalidOption { field, .. }) if field == "panel" => {
                StatusCode::NOT_FOUND
            }
            ApiError::Atlas(AtlasError::InvalidOption { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Atlas(AtlasError::CatalogUnavailable(_)) | ApiError::PanelStopped(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Atlas(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn hint(&self) -> &'static str {
        match self {
            ApiError::Atlas(err) => err.hint(),
            ApiError::PanelStopped(_) => "Reload the page.",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = json!({ "error": self.to_string(), "hint": self.hint() });
        (status, Json(body)).into_response()
    }
}
