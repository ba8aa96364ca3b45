use async_trait::async_trait;
use atlas_common::{DatasetRecord, EntitySize, HeatmapData, Result, Subject, TimeSeriesData};
use serde::{Deserialize, Serialize};

/// Which rows a heatmap request covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatmapSelector {
    /// Every gene; used when the slider domain is unknown.
    All,
    /// Variance rank window `[low, high]` from the range slider.
    Range { low: u32, high: u32 },
    /// Explicit gene symbols from a gene picker.
    Genes(Vec<String>),
}

/// Async request/response access to the data service.
///
/// Implementations report transport failures as-is; callers translate them
/// into the dashboard's error taxonomy at the fetch boundary.
#[async_trait]
pub trait AtlasSource: Send + Sync {
    /// All dataset records without matrix payloads.
    async fn dataset_catalog(&self) -> Result<Vec<DatasetRecord>>;

    /// One study's record including its matrix payload.
    async fn dataset_detail(&self, study: &str, normalization: &str) -> Result<DatasetRecord>;

    /// Gene counts per subject, the slider domains.
    async fn entity_size(&self, study: &str) -> Result<EntitySize>;

    async fn heatmap_data(
        &self,
        study: &str,
        selector: &HeatmapSelector,
        subject: Subject,
    ) -> Result<HeatmapData>;

    async fn time_series(&self, study: &str) -> Result<TimeSeriesData>;
}
