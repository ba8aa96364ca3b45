//! Plain, serialisable picture of a panel for rendering collaborators.

use atlas_cascade::{RangeDomain, RangeSelection, RangeSlider, SelectionState, SelectionStatus};
use atlas_common::{DatasetRecord, EntitySize, HeatmapData, StudyMetadata, TimeSeriesData, TimeSeriesPoint};
use serde::Serialize;

use crate::controller::PanelViews;
use crate::gene::GenePicker;
use crate::region::{PerSubject, RegionId, RegionView};

/// Metadata of the resolved study.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudyInfo {
    pub source: String,
    pub subject_a: String,
    pub subject_b: String,
    pub group: Option<String>,
    pub normalization: String,
    #[serde(flatten)]
    pub metadata: StudyMetadata,
}

impl From<&DatasetRecord> for StudyInfo {
    fn from(record: &DatasetRecord) -> Self {
        Self {
            source: record.source.clone(),
            subject_a: record.subject_a.clone(),
            subject_b: record.subject_b.clone(),
            group: record.group.clone(),
            normalization: record.normalization.clone(),
            metadata: record.study.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliderView {
    pub visible: bool,
    pub domain: Option<RangeDomain>,
    pub selection: Option<RangeSelection>,
    /// Track fill as percentages of the domain.
    pub fill: Option<(f64, f64)>,
}

impl SliderView {
    fn of(slider: &RangeSlider, fully_selected: bool) -> Self {
        Self {
            visible: fully_selected && slider.is_visible(),
            domain: slider.domain(),
            selection: slider.selection(),
            fill: slider.fill(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelSnapshot {
    pub panel: String,
    pub cascade_enabled: bool,
    pub status: SelectionStatus,
    pub selection: SelectionState,
    /// `None` renders as "No Information available".
    pub study: Option<StudyInfo>,
    pub download_enabled: bool,
    pub loading: Vec<RegionId>,
    pub sliders: PerSubject<SliderView>,
    pub gene_pickers: RegionView<PerSubject<GenePicker>>,
    pub time_series: RegionView<TimeSeriesData>,
    pub range_domain: RegionView<EntitySize>,
    pub heatmaps: PerSubject<RegionView<HeatmapData>>,
    pub gene_heatmaps: PerSubject<RegionView<HeatmapData>>,
    pub gene_time_series: PerSubject<RegionView<Vec<TimeSeriesPoint>>>,
}

impl PanelSnapshot {
    pub fn capture(
        panel: &str,
        cascade_enabled: bool,
        selection: &SelectionState,
        study: Option<&DatasetRecord>,
        views: &PanelViews,
    ) -> Self {
        let status = selection.status();
        let fully_selected = status == SelectionStatus::FullySelected;
        Self {
            panel: panel.to_string(),
            cascade_enabled,
            status,
            selection: selection.clone(),
            study: study.map(StudyInfo::from),
            download_enabled: fully_selected,
            loading: views.loading_regions(),
            sliders: views.sliders.map(|_, slider| SliderView::of(slider, fully_selected)),
            gene_pickers: views.genes.clone(),
            time_series: views.time_series.clone(),
            range_domain: views.range_domain.clone(),
            heatmaps: views.heatmaps.clone(),
            gene_heatmaps: views.gene_heatmaps.clone(),
            gene_time_series: views.gene_time_series.clone(),
        }
    }

    /// Regions currently showing an inline error.
    pub fn failed_regions(&self) -> Vec<RegionId> {
        use atlas_common::Subject;

        let mut regions = Vec::new();
        if self.gene_pickers.failure().is_some() {
            regions.push(RegionId::GeneOptions);
        }
        if self.time_series.failure().is_some() {
            regions.push(RegionId::TimeSeries);
        }
        if self.range_domain.failure().is_some() {
            regions.push(RegionId::RangeDomain);
        }
        for subject in Subject::ALL {
            if self.heatmaps[subject].failure().is_some() {
                regions.push(RegionId::Heatmap(subject));
            }
            if self.gene_heatmaps[subject].failure().is_some() {
                regions.push(RegionId::GeneHeatmap(subject));
            }
            if self.gene_time_series[subject].failure().is_some() {
                regions.push(RegionId::GeneTimeSeries(subject));
            }
        }
        regions
    }
}
