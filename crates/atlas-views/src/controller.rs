//! Fetch sequencing for one panel.
//!
//! Fan-out on a resolved selection:
//!
//! ```text
//! LoadView ─┬─ detail ───── gene pickers ── gene heatmaps (per subject)
//!           ├─ time series ─ gene time series (local restriction)
//!           └─ size ─────── slider domains ─ heatmaps (per subject)
//! ```
//!
//! Every arrow is an independent fetch with its own region state. A failed
//! fetch turns into a [`RegionView::Failed`] for its regions only.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use atlas_cascade::{CascadeEffect, RangeEvent, RangeSlider, ResolvedTriple};
use atlas_client::{AtlasSource, HeatmapSelector};
use atlas_common::{
    AtlasError, DashboardConfig, DatasetRecord, EntitySize, HeatmapData, Result, Subject,
    TimeSeriesData, TimeSeriesPoint,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::flight::{FlightTracker, Ticket};
use crate::gene::GenePicker;
use crate::region::{PerSubject, RegionId, RegionView};

pub const NOTHING_SELECTED: &str = "No genes selected";

// ── Fetch messages ────────────────────────────────────────────────────────────

/// The unit of single-flight: one fetch kind per panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchRegion {
    Detail,
    TimeSeries,
    Size,
    Heatmap(Subject),
    GeneHeatmap(Subject),
}

impl FetchRegion {
    pub fn region(&self) -> RegionId {
        match self {
            FetchRegion::Detail => RegionId::GeneOptions,
            FetchRegion::TimeSeries => RegionId::TimeSeries,
            FetchRegion::Size => RegionId::RangeDomain,
            FetchRegion::Heatmap(s) => RegionId::Heatmap(*s),
            FetchRegion::GeneHeatmap(s) => RegionId::GeneHeatmap(*s),
        }
    }
}

impl fmt::Display for FetchRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.region().fmt(f)
    }
}

#[derive(Debug)]
pub enum FetchResult {
    Detail(Result<DatasetRecord>),
    TimeSeries(Result<TimeSeriesData>),
    Size(Result<EntitySize>),
    Heatmap(Subject, Result<HeatmapData>),
    GeneHeatmap(Subject, Result<HeatmapData>),
}

impl FetchResult {
    pub fn region(&self) -> FetchRegion {
        match self {
            FetchResult::Detail(_) => FetchRegion::Detail,
            FetchResult::TimeSeries(_) => FetchRegion::TimeSeries,
            FetchResult::Size(_) => FetchRegion::Size,
            FetchResult::Heatmap(s, _) => FetchRegion::Heatmap(*s),
            FetchResult::GeneHeatmap(s, _) => FetchRegion::GeneHeatmap(*s),
        }
    }
}

/// A finished fetch, sent back to the owning panel.
#[derive(Debug)]
pub struct FetchOutcome {
    pub ticket: Ticket,
    pub study: String,
    pub result: FetchResult,
}

impl FetchOutcome {
    pub fn region(&self) -> FetchRegion {
        self.result.region()
    }
}

// ── View state ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct PanelViews {
    pub genes: RegionView<PerSubject<GenePicker>>,
    pub time_series: RegionView<TimeSeriesData>,
    pub range_domain: RegionView<EntitySize>,
    pub sliders: PerSubject<RangeSlider>,
    pub heatmaps: PerSubject<RegionView<HeatmapData>>,
    pub gene_heatmaps: PerSubject<RegionView<HeatmapData>>,
    pub gene_time_series: PerSubject<RegionView<Vec<TimeSeriesPoint>>>,
}

impl PanelViews {
    pub(crate) fn blank(config: &DashboardConfig) -> Self {
        Self {
            genes: RegionView::Idle,
            time_series: RegionView::Idle,
            range_domain: RegionView::Idle,
            sliders: PerSubject::from_fn(|s| RangeSlider::from_config(s, &config.range)),
            heatmaps: PerSubject::default(),
            gene_heatmaps: PerSubject::default(),
            gene_time_series: PerSubject::default(),
        }
    }

    fn reset(&mut self) {
        self.genes = RegionView::Idle;
        self.time_series = RegionView::Idle;
        self.range_domain = RegionView::Idle;
        for subject in Subject::ALL {
            self.sliders[subject].hide();
            self.heatmaps[subject] = RegionView::Idle;
            self.gene_heatmaps[subject] = RegionView::Idle;
            self.gene_time_series[subject] = RegionView::Idle;
        }
    }

    fn loading(&mut self) {
        self.genes = RegionView::Loading;
        self.time_series = RegionView::Loading;
        self.range_domain = RegionView::Loading;
        for subject in Subject::ALL {
            self.heatmaps[subject] = RegionView::Loading;
            self.gene_heatmaps[subject] = RegionView::Loading;
            self.gene_time_series[subject] = RegionView::Loading;
        }
    }

    /// Keep what is drawn; regions with nothing to show start loading.
    fn refreshing(&mut self) {
        mark_loading(&mut self.genes);
        mark_loading(&mut self.time_series);
        mark_loading(&mut self.range_domain);
        for subject in Subject::ALL {
            mark_loading(&mut self.heatmaps[subject]);
            mark_loading(&mut self.gene_heatmaps[subject]);
            mark_loading(&mut self.gene_time_series[subject]);
        }
    }

    /// Regions currently showing a loading indicator.
    pub fn loading_regions(&self) -> Vec<RegionId> {
        let mut regions = Vec::new();
        if self.genes.is_loading() {
            regions.push(RegionId::GeneOptions);
        }
        if self.time_series.is_loading() {
            regions.push(RegionId::TimeSeries);
        }
        if self.range_domain.is_loading() {
            regions.push(RegionId::RangeDomain);
        }
        for subject in Subject::ALL {
            if self.heatmaps[subject].is_loading() {
                regions.push(RegionId::Heatmap(subject));
            }
            if self.gene_heatmaps[subject].is_loading() {
                regions.push(RegionId::GeneHeatmap(subject));
            }
            if self.gene_time_series[subject].is_loading() {
                regions.push(RegionId::GeneTimeSeries(subject));
            }
        }
        regions
    }
}

fn mark_loading<T>(view: &mut RegionView<T>) {
    if view.ready().is_none() {
        *view = RegionView::Loading;
    }
}

// ── Controller ────────────────────────────────────────────────────────────────

pub struct ViewController {
    panel: String,
    source: Arc<dyn AtlasSource>,
    normalization: String,
    gene_count: usize,
    outcomes: mpsc::UnboundedSender<FetchOutcome>,
    flights: FlightTracker,
    study: Option<ResolvedTriple>,
    views: PanelViews,
}

impl ViewController {
    pub fn new(
        panel: &str,
        source: Arc<dyn AtlasSource>,
        config: &DashboardConfig,
    ) -> (Self, mpsc::UnboundedReceiver<FetchOutcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let controller = Self {
            panel: panel.to_string(),
            source,
            normalization: config.source.detail_normalization.clone(),
            gene_count: config.genes.default_count,
            outcomes: tx,
            flights: FlightTracker::new(),
            study: None,
            views: PanelViews::blank(config),
        };
        (controller, rx)
    }

    pub fn views(&self) -> &PanelViews {
        &self.views
    }

    pub fn study(&self) -> Option<&ResolvedTriple> {
        self.study.as_ref()
    }

    pub fn in_flight(&self) -> usize {
        self.flights.in_flight()
    }

    pub fn apply_effect(&mut self, effect: CascadeEffect) {
        match effect {
            CascadeEffect::ResetView => self.reset_views(),
            CascadeEffect::LoadView(triple) => self.load(triple),
        }
    }

    /// Blank every view and supersede all in-flight fetches.
    pub fn reset_views(&mut self) {
        self.flights.cancel_all();
        self.study = None;
        self.views.reset();
        debug!(panel = %self.panel, "Views reset");
    }

    /// Fan out the fetches for a resolved selection.
    ///
    /// A new study for the same pair of subjects keeps the drawn charts until
    /// the new data replaces them; any other change blanks them first.
    pub fn load(&mut self, triple: ResolvedTriple) {
        self.flights.cancel_all();
        let study_only = self.study.as_ref().is_some_and(|prev| {
            prev.subject_a == triple.subject_a
                && prev.subject_b == triple.subject_b
                && prev.source != triple.source
        });
        info!(panel = %self.panel, study = %triple.source, subject_a = %triple.subject_a,
              subject_b = %triple.subject_b, study_only, "Loading views");

        let study = triple.source.clone();
        self.study = Some(triple);
        if study_only {
            self.views.refreshing();
        } else {
            self.views.reset();
            self.views.loading();
        }

        let source = self.source.clone();
        let (s, normalization) = (study.clone(), self.normalization.clone());
        self.spawn(FetchRegion::Detail, &study, async move {
            FetchResult::Detail(source.dataset_detail(&s, &normalization).await)
        });

        let source = self.source.clone();
        let s = study.clone();
        self.spawn(FetchRegion::TimeSeries, &study, async move {
            FetchResult::TimeSeries(source.time_series(&s).await)
        });

        let source = self.source.clone();
        let s = study.clone();
        self.spawn(FetchRegion::Size, &study, async move {
            FetchResult::Size(source.entity_size(&s).await)
        });
    }

    /// Feed a range slider event. A commit refetches that subject's heatmap.
    pub fn range_event(&mut self, subject: Subject, event: RangeEvent) {
        if let Some(selection) = self.views.sliders[subject].handle(event) {
            debug!(panel = %self.panel, %subject, low = selection.low, high = selection.high, "Range committed");
            self.fetch_heatmap(
                subject,
                HeatmapSelector::Range { low: selection.low, high: selection.high },
            );
        }
    }

    pub fn set_genes(&mut self, subject: Subject, genes: &[String]) -> Result<()> {
        self.picker_mut(subject)?.select(genes)?;
        self.refresh_gene_views(subject);
        Ok(())
    }

    pub fn select_all_genes(&mut self, subject: Subject) -> Result<()> {
        self.picker_mut(subject)?.select_all();
        self.refresh_gene_views(subject);
        Ok(())
    }

    pub fn deselect_all_genes(&mut self, subject: Subject) -> Result<()> {
        self.picker_mut(subject)?.select_none();
        self.refresh_gene_views(subject);
        Ok(())
    }

    /// Apply a finished fetch. Returns false for superseded outcomes.
    pub fn apply(&mut self, outcome: FetchOutcome) -> bool {
        let region = outcome.region();
        if !self.flights.complete(region, outcome.ticket) {
            debug!(panel = %self.panel, %region, study = %outcome.study, ticket = %outcome.ticket,
                   "Discarded stale outcome");
            return false;
        }

        let study = outcome.study;
        match outcome.result {
            FetchResult::Detail(Ok(record)) => match record.matrix {
                Some(matrix) => {
                    let count = self.gene_count;
                    self.views.genes = RegionView::Ready(PerSubject::from_fn(|s| {
                        GenePicker::from_matrix(&matrix, s, count)
                    }));
                    for subject in Subject::ALL {
                        self.refresh_gene_views(subject);
                    }
                }
                None => self.detail_failed(AtlasError::DetailFetchFailed {
                    study,
                    reason: "dataset carries no expression matrix".to_string(),
                }),
            },
            FetchResult::Detail(Err(e)) => self.detail_failed(AtlasError::DetailFetchFailed {
                study,
                reason: e.to_string(),
            }),

            FetchResult::TimeSeries(result) => {
                self.views.time_series = match result {
                    Ok(data) => RegionView::Ready(data),
                    Err(e) => self.failed(AtlasError::TimeSeriesFetchFailed { study, reason: e.to_string() }),
                };
                for subject in Subject::ALL {
                    self.refresh_gene_time_series(subject);
                }
            }

            FetchResult::Size(Ok(size)) => {
                self.views.range_domain = RegionView::Ready(size);
                for subject in Subject::ALL {
                    let count = size.count(subject);
                    match self.views.sliders[subject].set_domain(count) {
                        Ok(selection) => self.fetch_heatmap(
                            subject,
                            HeatmapSelector::Range { low: selection.low, high: selection.high },
                        ),
                        Err(_) if count == 0 => {
                            self.views.heatmaps[subject] =
                                RegionView::Placeholder(format!("No {subject} genes in this study"));
                        }
                        Err(_) => self.fetch_heatmap(subject, HeatmapSelector::All),
                    }
                }
            }
            FetchResult::Size(Err(e)) => {
                self.views.range_domain =
                    self.failed(AtlasError::SizeLookupFailed { study, reason: e.to_string() });
                for subject in Subject::ALL {
                    self.views.sliders[subject].hide();
                    self.fetch_heatmap(subject, HeatmapSelector::All);
                }
            }

            FetchResult::Heatmap(subject, result) => {
                self.views.heatmaps[subject] = match result {
                    Ok(data) => RegionView::Ready(data),
                    Err(e) => self.failed(AtlasError::HeatmapFetchFailed {
                        study,
                        subject,
                        reason: e.to_string(),
                    }),
                };
            }
            FetchResult::GeneHeatmap(subject, result) => {
                self.views.gene_heatmaps[subject] = match result {
                    Ok(data) => {
                        let genes = self.selected_genes(subject).unwrap_or_default();
                        RegionView::Ready(data.restricted_to(&genes))
                    }
                    Err(e) => self.failed(AtlasError::HeatmapFetchFailed {
                        study,
                        subject,
                        reason: e.to_string(),
                    }),
                };
            }
        }
        true
    }

    // ── internals ─────────────────────────────────────────────────────────────

    /// Issue a ticket for `region` and run `fetch` in the background.
    fn spawn<F>(&mut self, region: FetchRegion, study: &str, fetch: F)
    where
        F: Future<Output = FetchResult> + Send + 'static,
    {
        let ticket = self.flights.begin(region);
        let study = study.to_string();
        debug!(panel = %self.panel, %region, study = %study, %ticket, "Fetch started");

        let tx = self.outcomes.clone();
        tokio::spawn(async move {
            let result = fetch.await;
            // Receiver gone means the panel was dropped.
            let _ = tx.send(FetchOutcome { ticket, study, result });
        });
    }

    fn fetch_heatmap(&mut self, subject: Subject, selector: HeatmapSelector) {
        let Some(study) = self.study.as_ref().map(|t| t.source.clone()) else {
            return;
        };
        self.views.heatmaps[subject] = RegionView::Loading;
        let source = self.source.clone();
        let s = study.clone();
        self.spawn(FetchRegion::Heatmap(subject), &study, async move {
            FetchResult::Heatmap(subject, source.heatmap_data(&s, &selector, subject).await)
        });
    }

    fn picker_mut(&mut self, subject: Subject) -> Result<&mut GenePicker> {
        match self.views.genes.ready_mut() {
            Some(pickers) => Ok(&mut pickers[subject]),
            None => Err(AtlasError::InvalidOption {
                field: format!("{subject}_genes"),
                value: "gene list not loaded".to_string(),
            }),
        }
    }

    fn selected_genes(&self, subject: Subject) -> Option<Vec<String>> {
        self.views.genes.ready().map(|p| p[subject].selected().to_vec())
    }

    fn refresh_gene_views(&mut self, subject: Subject) {
        let Some(genes) = self.selected_genes(subject) else {
            return;
        };
        let Some(study) = self.study.as_ref().map(|t| t.source.clone()) else {
            return;
        };

        if genes.is_empty() {
            self.flights.cancel(FetchRegion::GeneHeatmap(subject));
            self.views.gene_heatmaps[subject] = RegionView::Placeholder(NOTHING_SELECTED.to_string());
        } else {
            self.views.gene_heatmaps[subject] = RegionView::Loading;
            let source = self.source.clone();
            let s = study.clone();
            let selector = HeatmapSelector::Genes(genes);
            self.spawn(FetchRegion::GeneHeatmap(subject), &study, async move {
                FetchResult::GeneHeatmap(subject, source.heatmap_data(&s, &selector, subject).await)
            });
        }
        self.refresh_gene_time_series(subject);
    }

    fn refresh_gene_time_series(&mut self, subject: Subject) {
        let Some(genes) = self.selected_genes(subject) else {
            return;
        };
        self.views.gene_time_series[subject] = if genes.is_empty() {
            RegionView::Placeholder(NOTHING_SELECTED.to_string())
        } else {
            match &self.views.time_series {
                RegionView::Ready(data) => RegionView::Ready(data.restricted_to(subject, &genes)),
                RegionView::Failed(failure) => RegionView::Failed(failure.clone()),
                RegionView::Placeholder(message) => RegionView::Placeholder(message.clone()),
                RegionView::Loading | RegionView::Idle => RegionView::Loading,
            }
        };
    }

    fn detail_failed(&mut self, err: AtlasError) {
        let view = RegionView::failed(&err);
        warn!(panel = %self.panel, error = %err, "Detail fetch failed");
        for subject in Subject::ALL {
            self.flights.cancel(FetchRegion::GeneHeatmap(subject));
            self.views.gene_heatmaps[subject] = RegionView::failed(&err);
            self.views.gene_time_series[subject] = RegionView::failed(&err);
        }
        self.views.genes = view;
    }

    fn failed<T>(&self, err: AtlasError) -> RegionView<T> {
        warn!(panel = %self.panel, error = %err, "Fetch failed");
        RegionView::failed(&err)
    }
}
