//! HTTP client for the atlas data service.
//!
//! Endpoints (relative to `source.base_url`):
//!   /fetch_datasets_overview
//!   /fetch_specific_unpickled_dataset?study=..&normalization=..
//!   /get_host_phage_size?study=..
//!   /fetch_phage_heatmap_data, /fetch_host_heatmap_data?study=..&vals[]=..|gene_list[]=..
//!   /fetch_time_series_data?study=..

use std::time::Duration;

use async_trait::async_trait;
use atlas_common::config::SourceConfig;
use atlas_common::{
    AtlasError, DatasetRecord, EntitySize, HeatmapData, Result, Subject, TimeSeriesData,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::source::{AtlasSource, HeatmapSelector};

pub struct HttpAtlasSource {
    client: Client,
    base_url: String,
}

impl HttpAtlasSource {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.get(&url).query(query).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AtlasError::Status { status: status.as_u16(), url });
        }

        let body = resp.text().await?;
        debug!(url = %url, bytes = body.len(), "Atlas service responded");
        Ok(serde_json::from_str(&body)?)
    }
}

/// Query pairs for a heatmap request. Repeated `[]` keys encode arrays.
fn heatmap_query(study: &str, selector: &HeatmapSelector) -> Vec<(&'static str, String)> {
    let mut query = vec![("study", study.to_string())];
    match selector {
        HeatmapSelector::All => {}
        HeatmapSelector::Range { low, high } => {
            query.push(("vals[]", low.to_string()));
            query.push(("vals[]", high.to_string()));
        }
        HeatmapSelector::Genes(genes) => {
            query.extend(genes.iter().map(|g| ("gene_list[]", g.clone())));
        }
    }
    query
}

fn heatmap_path(subject: Subject) -> &'static str {
    match subject {
        Subject::A => "/fetch_phage_heatmap_data",
        Subject::B => "/fetch_host_heatmap_data",
    }
}

#[async_trait]
impl AtlasSource for HttpAtlasSource {
    #[instrument(skip(self))]
    async fn dataset_catalog(&self) -> Result<Vec<DatasetRecord>> {
        let records: Vec<DatasetRecord> = self.get_json("/fetch_datasets_overview", &[]).await?;
        debug!(count = records.len(), "Fetched dataset overview");
        Ok(records)
    }

    #[instrument(skip(self))]
    async fn dataset_detail(&self, study: &str, normalization: &str) -> Result<DatasetRecord> {
        self.get_json(
            "/fetch_specific_unpickled_dataset",
            &[("study", study.to_string()), ("normalization", normalization.to_string())],
        )
        .await
    }

    #[instrument(skip(self))]
    async fn entity_size(&self, study: &str) -> Result<EntitySize> {
        self.get_json("/get_host_phage_size", &[("study", study.to_string())]).await
    }

    #[instrument(skip(self))]
    async fn heatmap_data(
        &self,
        study: &str,
        selector: &HeatmapSelector,
        subject: Subject,
    ) -> Result<HeatmapData> {
        let data: HeatmapData = self
            .get_json(heatmap_path(subject), &heatmap_query(study, selector))
            .await?;
        debug!(rows = data.y.len(), columns = data.x.len(), "Fetched heatmap");
        Ok(data)
    }

    #[instrument(skip(self))]
    async fn time_series(&self, study: &str) -> Result<TimeSeriesData> {
        self.get_json("/fetch_time_series_data", &[("study", study.to_string())]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_range_query_sends_both_bounds() {
        let query = heatmap_query("Study1", &HeatmapSelector::Range { low: 45, high: 50 });
        assert_eq!(
            query,
            vec![
                ("study", "Study1".to_string()),
                ("vals[]", "45".to_string()),
                ("vals[]", "50".to_string()),
            ]
        );
    }

    #[test]
    fn test_gene_query_repeats_key() {
        let query = heatmap_query("S", &HeatmapSelector::Genes(vec!["gp23".into(), "gp24".into()]));
        assert_eq!(query.len(), 3);
        assert!(query[1..].iter().all(|(k, _)| *k == "gene_list[]"));
    }

    #[test]
    fn test_heatmap_endpoint_per_subject() {
        assert_eq!(heatmap_path(Subject::A), "/fetch_phage_heatmap_data");
        assert_eq!(heatmap_path(Subject::B), "/fetch_host_heatmap_data");
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let config = SourceConfig { base_url: "http://atlas.local/".into(), ..SourceConfig::default() };
        let source = HttpAtlasSource::new(&config).unwrap();
        assert_eq!(source.base_url, "http://atlas.local");
    }
}
