//! Scripted [`AtlasSource`] for tests.
//!
//! Responses are registered per study with the `with_*` builders. Any
//! endpoint can be made to fail, and a study can be gated so that all of
//! its responses wait until [`MockAtlasSource::release`] is called. Gates
//! reproduce out-of-order arrival of concurrent fetches.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use atlas_common::{
    AtlasError, DatasetRecord, EntitySize, HeatmapData, Result, Subject, TimeSeriesData,
};
use tokio::sync::watch;
use tracing::debug;

use crate::source::{AtlasSource, HeatmapSelector};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointKind {
    Catalog,
    Detail,
    Size,
    Heatmap(Subject),
    TimeSeries,
}

/// One recorded heatmap request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeatmapRequest {
    pub study: String,
    pub subject: Subject,
    pub selector: HeatmapSelector,
}

#[derive(Default)]
pub struct MockAtlasSource {
    catalog: Vec<DatasetRecord>,
    details: HashMap<String, DatasetRecord>,
    sizes: HashMap<String, EntitySize>,
    heatmaps: HashMap<(String, Subject), HeatmapData>,
    series: HashMap<String, TimeSeriesData>,
    /// `None` study means every study.
    failures: Mutex<HashSet<(EndpointKind, Option<String>)>>,
    calls: Mutex<HashMap<EndpointKind, usize>>,
    heatmap_requests: Mutex<Vec<HeatmapRequest>>,
    gates: Mutex<HashMap<String, watch::Sender<bool>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockAtlasSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(mut self, records: Vec<DatasetRecord>) -> Self {
        self.catalog = records;
        self
    }

    /// Register the detail record returned for `record.source`.
    pub fn with_detail(mut self, record: DatasetRecord) -> Self {
        self.details.insert(record.source.clone(), record);
        self
    }

    pub fn with_size(mut self, study: &str, size: EntitySize) -> Self {
        self.sizes.insert(study.to_string(), size);
        self
    }

    pub fn with_heatmap(mut self, study: &str, subject: Subject, data: HeatmapData) -> Self {
        self.heatmaps.insert((study.to_string(), subject), data);
        self
    }

    pub fn with_time_series(mut self, study: &str, data: TimeSeriesData) -> Self {
        self.series.insert(study.to_string(), data);
        self
    }

    /// Fail `kind` for every study.
    pub fn failing(self, kind: EndpointKind) -> Self {
        self.set_failing(kind, None, true);
        self
    }

    /// Fail `kind` for one study only.
    pub fn failing_for(self, kind: EndpointKind, study: &str) -> Self {
        self.set_failing(kind, Some(study), true);
        self
    }

    /// Hold every response for `study` until released.
    pub fn gated(self, study: &str) -> Self {
        let (tx, _rx) = watch::channel(false);
        lock(&self.gates).insert(study.to_string(), tx);
        self
    }

    pub fn set_failing(&self, kind: EndpointKind, study: Option<&str>, failing: bool) {
        let key = (kind, study.map(str::to_string));
        let mut failures = lock(&self.failures);
        if failing {
            failures.insert(key);
        } else {
            failures.remove(&key);
        }
    }

    /// Let held responses for `study` through.
    pub fn release(&self, study: &str) {
        if let Some(tx) = lock(&self.gates).get(study) {
            tx.send_replace(true);
        }
    }

    pub fn calls(&self, kind: EndpointKind) -> usize {
        lock(&self.calls).get(&kind).copied().unwrap_or(0)
    }

    pub fn heatmap_requests(&self) -> Vec<HeatmapRequest> {
        lock(&self.heatmap_requests).clone()
    }

    async fn enter(&self, kind: EndpointKind, study: Option<&str>) -> Result<()> {
        *lock(&self.calls).entry(kind).or_insert(0) += 1;

        if let Some(study) = study {
            let gate = lock(&self.gates).get(study).map(|tx| tx.subscribe());
            if let Some(mut rx) = gate {
                debug!(study, ?kind, "Mock response held");
                // A dropped sender means the mock is gone; let the call through.
                let _ = rx.wait_for(|open| *open).await;
            }
        }

        let failures = lock(&self.failures);
        let failing = failures.contains(&(kind, None))
            || study.is_some_and(|s| failures.contains(&(kind, Some(s.to_string()))));
        if failing {
            return Err(AtlasError::Status {
                status: 500,
                url: format!("mock://{kind:?}/{}", study.unwrap_or("*")),
            });
        }
        Ok(())
    }
}

fn not_found(what: &str, study: &str) -> AtlasError {
    AtlasError::Status { status: 404, url: format!("mock://{what}/{study}") }
}

#[async_trait]
impl AtlasSource for MockAtlasSource {
    async fn dataset_catalog(&self) -> Result<Vec<DatasetRecord>> {
        self.enter(EndpointKind::Catalog, None).await?;
        Ok(self.catalog.clone())
    }

    async fn dataset_detail(&self, study: &str, _normalization: &str) -> Result<DatasetRecord> {
        self.enter(EndpointKind::Detail, Some(study)).await?;
        self.details.get(study).cloned().ok_or_else(|| not_found("detail", study))
    }

    async fn entity_size(&self, study: &str) -> Result<EntitySize> {
        self.enter(EndpointKind::Size, Some(study)).await?;
        self.sizes.get(study).copied().ok_or_else(|| not_found("size", study))
    }

    async fn heatmap_data(
        &self,
        study: &str,
        selector: &HeatmapSelector,
        subject: Subject,
    ) -> Result<HeatmapData> {
        lock(&self.heatmap_requests).push(HeatmapRequest {
            study: study.to_string(),
            subject,
            selector: selector.clone(),
        });
        self.enter(EndpointKind::Heatmap(subject), Some(study)).await?;
        self.heatmaps
            .get(&(study.to_string(), subject))
            .cloned()
            .ok_or_else(|| not_found("heatmap", study))
    }

    async fn time_series(&self, study: &str) -> Result<TimeSeriesData> {
        self.enter(EndpointKind::TimeSeries, Some(study)).await?;
        self.series.get(study).cloned().ok_or_else(|| not_found("time_series", study))
    }
}
