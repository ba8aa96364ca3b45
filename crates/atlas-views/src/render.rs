//! Render boundary.
//!
//! Chart drawing is delegated to a [`ChartRenderer`]. [`render_snapshot`]
//! draws every chart region of a panel and catches renderer errors per
//! region: a failed chart is replaced with an inline error and the other
//! regions still render.

use std::collections::BTreeMap;

use atlas_common::{AtlasError, HeatmapData, Subject, TimeSeriesPoint};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::warn;

use crate::region::{RegionId, RegionView, ViewFailure};
use crate::snapshot::PanelSnapshot;

pub const NO_GENES: &str = "No genes to show";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("heatmap has {rows} value rows for {labels} gene labels")]
    ShapeMismatch { rows: usize, labels: usize },

    #[error("heatmap row {row} has {len} values for {columns} time points")]
    RaggedRow { row: usize, len: usize, columns: usize },

    #[error("{0}")]
    Backend(String),
}

impl From<RenderError> for AtlasError {
    fn from(err: RenderError) -> Self {
        AtlasError::RenderFailure(err.to_string())
    }
}

pub trait ChartRenderer {
    fn heatmap(&mut self, region: RegionId, data: &HeatmapData) -> Result<(), RenderError>;

    fn time_series(&mut self, region: RegionId, points: &[TimeSeriesPoint]) -> Result<(), RenderError>;

    fn placeholder(&mut self, region: RegionId, message: &str);

    fn failure(&mut self, region: RegionId, failure: &ViewFailure);

    fn loading(&mut self, region: RegionId);
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderReport {
    pub rendered: Vec<RegionId>,
    /// Regions whose renderer call failed and now show an inline error.
    pub failed: Vec<RegionId>,
}

/// Draw the chart regions of `snapshot`.
pub fn render_snapshot(renderer: &mut dyn ChartRenderer, snapshot: &PanelSnapshot) -> RenderReport {
    let mut report = RenderReport::default();
    for subject in Subject::ALL {
        render_region(renderer, &mut report, RegionId::Heatmap(subject), &snapshot.heatmaps[subject], draw_heatmap);
        render_region(
            renderer,
            &mut report,
            RegionId::GeneHeatmap(subject),
            &snapshot.gene_heatmaps[subject],
            draw_heatmap,
        );
        render_region(
            renderer,
            &mut report,
            RegionId::GeneTimeSeries(subject),
            &snapshot.gene_time_series[subject],
            |r, region, points: &Vec<TimeSeriesPoint>| {
                if points.is_empty() {
                    r.placeholder(region, NO_GENES);
                    return Ok(());
                }
                r.time_series(region, points)
            },
        );
    }
    report
}

fn draw_heatmap(renderer: &mut dyn ChartRenderer, region: RegionId, data: &HeatmapData) -> Result<(), RenderError> {
    if data.is_empty() {
        renderer.placeholder(region, NO_GENES);
        return Ok(());
    }
    renderer.heatmap(region, data)
}

fn render_region<T>(
    renderer: &mut dyn ChartRenderer,
    report: &mut RenderReport,
    region: RegionId,
    view: &RegionView<T>,
    draw: impl FnOnce(&mut dyn ChartRenderer, RegionId, &T) -> Result<(), RenderError>,
) {
    match view {
        RegionView::Idle => {}
        RegionView::Loading => renderer.loading(region),
        RegionView::Placeholder(message) => renderer.placeholder(region, message),
        RegionView::Failed(failure) => renderer.failure(region, failure),
        RegionView::Ready(data) => match draw(&mut *renderer, region, data) {
            Ok(()) => report.rendered.push(region),
            Err(e) => {
                warn!(%region, error = %e, "Chart rendering failed");
                let err = AtlasError::from(e);
                renderer.failure(region, &ViewFailure::from(&err));
                report.failed.push(region);
            }
        },
    }
}

// ── Figure renderer ───────────────────────────────────────────────────────────

/// Renders regions into plotly-style JSON figures keyed by region name.
#[derive(Debug, Default)]
pub struct FigureRenderer {
    figures: BTreeMap<String, Value>,
}

impl FigureRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn figures(&self) -> &BTreeMap<String, Value> {
        &self.figures
    }

    pub fn into_figures(self) -> BTreeMap<String, Value> {
        self.figures
    }
}

impl ChartRenderer for FigureRenderer {
    fn heatmap(&mut self, region: RegionId, data: &HeatmapData) -> Result<(), RenderError> {
        if data.z.len() != data.y.len() {
            return Err(RenderError::ShapeMismatch { rows: data.z.len(), labels: data.y.len() });
        }
        if let Some((row, values)) = data.z.iter().enumerate().find(|(_, v)| v.len() != data.x.len()) {
            return Err(RenderError::RaggedRow { row, len: values.len(), columns: data.x.len() });
        }

        let figure = json!({
            "data": [{
                "type": "heatmap",
                "x": data.x,
                "y": data.y,
                "z": data.z,
                "colorscale": "RdBu",
                "reversescale": true,
            }],
            "layout": {
                "title": region.to_string(),
                "xaxis": { "title": "Time" },
                "yaxis": { "automargin": true },
            },
        });
        self.figures.insert(region.to_string(), figure);
        Ok(())
    }

    fn time_series(&mut self, region: RegionId, points: &[TimeSeriesPoint]) -> Result<(), RenderError> {
        // One trace per symbol, in order of first appearance.
        let mut traces: Vec<(&str, Vec<&str>, Vec<Option<f64>>)> = Vec::new();
        for point in points {
            let i = match traces.iter().position(|(symbol, _, _)| *symbol == point.symbol) {
                Some(i) => i,
                None => {
                    traces.push((point.symbol.as_str(), Vec::new(), Vec::new()));
                    traces.len() - 1
                }
            };
            traces[i].1.push(point.time.as_str());
            traces[i].2.push(point.value);
        }

        let data: Vec<Value> = traces
            .into_iter()
            .map(|(symbol, x, y)| {
                json!({ "type": "scatter", "mode": "lines+markers", "name": symbol, "x": x, "y": y })
            })
            .collect();
        let figure = json!({
            "data": data,
            "layout": { "title": region.to_string(), "xaxis": { "title": "Time" } },
        });
        self.figures.insert(region.to_string(), figure);
        Ok(())
    }

    fn placeholder(&mut self, region: RegionId, message: &str) {
        self.figures.insert(region.to_string(), json!({ "placeholder": message }));
    }

    fn failure(&mut self, region: RegionId, failure: &ViewFailure) {
        self.figures.insert(region.to_string(), json!({ "error": failure }));
    }

    fn loading(&mut self, region: RegionId) {
        self.figures.insert(region.to_string(), json!({ "loading": true }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_cascade::SelectionState;
    use atlas_common::DashboardConfig;
    use atlas_test_utils::fixtures::{heatmap, host_symbols, phage_symbols, time_series};
    use pretty_assertions::assert_eq;

    use crate::controller::PanelViews;

    fn snapshot_with(views: impl FnOnce(&mut PanelViews)) -> PanelSnapshot {
        let mut panel_views = PanelViews::blank(&DashboardConfig::default());
        views(&mut panel_views);
        PanelSnapshot::capture("d1", true, &SelectionState::default(), None, &panel_views)
    }

    /// Fails every heatmap call.
    struct BrokenHeatmaps(FigureRenderer);

    impl ChartRenderer for BrokenHeatmaps {
        fn heatmap(&mut self, _region: RegionId, _data: &HeatmapData) -> Result<(), RenderError> {
            Err(RenderError::Backend("canvas lost".into()))
        }
        fn time_series(&mut self, region: RegionId, points: &[TimeSeriesPoint]) -> Result<(), RenderError> {
            self.0.time_series(region, points)
        }
        fn placeholder(&mut self, region: RegionId, message: &str) {
            self.0.placeholder(region, message)
        }
        fn failure(&mut self, region: RegionId, failure: &ViewFailure) {
            self.0.failure(region, failure)
        }
        fn loading(&mut self, region: RegionId) {
            self.0.loading(region)
        }
    }

    #[test]
    fn test_ready_heatmap_becomes_figure() {
        let snapshot = snapshot_with(|v| v.heatmaps.a = RegionView::Ready(heatmap(&phage_symbols(), 1.0)));
        let mut renderer = FigureRenderer::new();
        let report = render_snapshot(&mut renderer, &snapshot);

        assert_eq!(report.rendered, vec![RegionId::Heatmap(Subject::A)]);
        let figure = &renderer.figures()["phage_heatmap"];
        assert_eq!(figure["data"][0]["type"], "heatmap");
        assert_eq!(figure["data"][0]["y"].as_array().map(Vec::len), Some(5));
    }

    #[test]
    fn test_mismatched_heatmap_is_replaced_by_inline_error() {
        let mut broken = heatmap(&host_symbols(), -1.0);
        broken.z.pop();
        let snapshot = snapshot_with(|v| {
            v.heatmaps.b = RegionView::Ready(broken);
            v.heatmaps.a = RegionView::Ready(heatmap(&phage_symbols(), 1.0));
        });
        let mut renderer = FigureRenderer::new();
        let report = render_snapshot(&mut renderer, &snapshot);

        assert_eq!(report.failed, vec![RegionId::Heatmap(Subject::B)]);
        assert_eq!(report.rendered, vec![RegionId::Heatmap(Subject::A)]);
        let error = &renderer.figures()["host_heatmap"]["error"];
        assert_eq!(error["kind"], "render_failure");
    }

    #[test]
    fn test_renderer_error_does_not_block_time_series() {
        let series = time_series(&phage_symbols(), &host_symbols());
        let snapshot = snapshot_with(|v| {
            v.heatmaps.a = RegionView::Ready(heatmap(&phage_symbols(), 1.0));
            v.gene_time_series.a = RegionView::Ready(series.restricted_to(Subject::A, &phage_symbols()[..2]));
        });
        let mut renderer = BrokenHeatmaps(FigureRenderer::new());
        let report = render_snapshot(&mut renderer, &snapshot);

        assert_eq!(report.failed, vec![RegionId::Heatmap(Subject::A)]);
        assert_eq!(report.rendered, vec![RegionId::GeneTimeSeries(Subject::A)]);
        let figure = &renderer.0.figures()["phage_gene_time_series"];
        assert_eq!(figure["data"].as_array().map(Vec::len), Some(2));
        assert_eq!(figure["data"][0]["name"], "gp23");
    }

    #[test]
    fn test_non_ready_regions_are_passed_through() {
        let err = AtlasError::HeatmapFetchFailed { study: "S1".into(), subject: Subject::B, reason: "HTTP 500".into() };
        let snapshot = snapshot_with(|v| {
            v.heatmaps.a = RegionView::Loading;
            v.heatmaps.b = RegionView::failed(&err);
            v.gene_heatmaps.a = RegionView::Ready(heatmap(&[], 0.0));
        });
        let mut renderer = FigureRenderer::new();
        let report = render_snapshot(&mut renderer, &snapshot);

        assert!(report.failed.is_empty());
        let figures = renderer.into_figures();
        assert_eq!(figures["phage_heatmap"], json!({ "loading": true }));
        assert_eq!(figures["host_heatmap"]["error"]["kind"], "heatmap_fetch_failed");
        assert_eq!(figures["phage_gene_heatmap"], json!({ "placeholder": NO_GENES }));
        assert!(!figures.contains_key("host_gene_heatmap"));
    }
}
