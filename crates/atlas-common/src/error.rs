use thiserror::Error;

use crate::entities::Subject;

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Dataset catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("Could not fetch dataset detail for {study}: {reason}")]
    DetailFetchFailed { study: String, reason: String },

    #[error("Could not determine gene counts for {study}: {reason}")]
    SizeLookupFailed { study: String, reason: String },

    #[error("Could not fetch {subject} heatmap for {study}: {reason}")]
    HeatmapFetchFailed {
        study: String,
        subject: Subject,
        reason: String,
    },

    #[error("Could not fetch time series for {study}: {reason}")]
    TimeSeriesFetchFailed { study: String, reason: String },

    #[error("Chart rendering failed: {0}")]
    RenderFailure(String),

    #[error("'{value}' is not a valid option for {field}")]
    InvalidOption { field: String, value: String },

    #[error("Invalid range domain [{min}, {max}] for a minimum gap of {min_gap}")]
    InvalidDomain { min: u32, max: u32, min_gap: u32 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AtlasError {
    /// What the user can do next. Every user-visible failure offers one.
    pub fn hint(&self) -> &'static str {
        match self {
            AtlasError::CatalogUnavailable(_) => {
                "Selectors are disabled. Reload the page once the data service is reachable."
            }
            AtlasError::DetailFetchFailed { .. } => {
                "Select the study again to retry. The raw dataset remains downloadable."
            }
            AtlasError::SizeLookupFailed { .. } => {
                "The variance filter is hidden for this study. Heatmaps show all genes."
            }
            AtlasError::HeatmapFetchFailed { .. } | AtlasError::TimeSeriesFetchFailed { .. } => {
                "Change the selection to retry. The raw dataset remains downloadable."
            }
            AtlasError::RenderFailure(_) => "This chart could not be drawn. Other charts are unaffected.",
            AtlasError::InvalidOption { .. } => "Pick one of the listed options.",
            _ => "Change the selection to retry.",
        }
    }
}

pub type Result<T> = std::result::Result<T, AtlasError>;
