use std::fmt;
use std::ops::{Index, IndexMut};

use atlas_common::{AtlasError, Subject};
use serde::{Serialize, Serializer};

// ── Region identity ───────────────────────────────────────────────────────────

/// One independently loaded area of a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionId {
    GeneOptions,
    TimeSeries,
    RangeDomain,
    Heatmap(Subject),
    GeneHeatmap(Subject),
    GeneTimeSeries(Subject),
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionId::GeneOptions => f.write_str("gene_options"),
            RegionId::TimeSeries => f.write_str("time_series"),
            RegionId::RangeDomain => f.write_str("range_domain"),
            RegionId::Heatmap(s) => write!(f, "{s}_heatmap"),
            RegionId::GeneHeatmap(s) => write!(f, "{s}_gene_heatmap"),
            RegionId::GeneTimeSeries(s) => write!(f, "{s}_gene_time_series"),
        }
    }
}

impl Serialize for RegionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ── Failures ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    CatalogUnavailable,
    DetailFetchFailed,
    SizeLookupFailed,
    HeatmapFetchFailed,
    TimeSeriesFetchFailed,
    RenderFailure,
    Other,
}

/// Inline error shown in place of a region, with the way forward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewFailure {
    pub kind: FailureKind,
    pub message: String,
    pub hint: String,
}

impl From<&AtlasError> for ViewFailure {
    fn from(err: &AtlasError) -> Self {
        let kind = match err {
            AtlasError::CatalogUnavailable(_) => FailureKind::CatalogUnavailable,
            AtlasError::DetailFetchFailed { .. } => FailureKind::DetailFetchFailed,
            AtlasError::SizeLookupFailed { .. } => FailureKind::SizeLookupFailed,
            AtlasError::HeatmapFetchFailed { .. } => FailureKind::HeatmapFetchFailed,
            AtlasError::TimeSeriesFetchFailed { .. } => FailureKind::TimeSeriesFetchFailed,
            AtlasError::RenderFailure(_) => FailureKind::RenderFailure,
            _ => FailureKind::Other,
        };
        Self {
            kind,
            message: err.to_string(),
            hint: err.hint().to_string(),
        }
    }
}

// ── Region state ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum RegionView<T> {
    Idle,
    Loading,
    Ready(T),
    /// Nothing to show, not an error.
    Placeholder(String),
    Failed(ViewFailure),
}

impl<T> Default for RegionView<T> {
    fn default() -> Self {
        RegionView::Idle
    }
}

impl<T> RegionView<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            RegionView::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn ready_mut(&mut self) -> Option<&mut T> {
        match self {
            RegionView::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, RegionView::Loading)
    }

    pub fn failure(&self) -> Option<&ViewFailure> {
        match self {
            RegionView::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn failed(err: &AtlasError) -> Self {
        RegionView::Failed(ViewFailure::from(err))
    }
}

// ── Per-subject pairs ─────────────────────────────────────────────────────────

/// One value per subject, serialized as `{"phage": .., "host": ..}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerSubject<T> {
    #[serde(rename = "phage")]
    pub a: T,
    #[serde(rename = "host")]
    pub b: T,
}

impl<T> PerSubject<T> {
    pub fn from_fn(mut f: impl FnMut(Subject) -> T) -> Self {
        Self { a: f(Subject::A), b: f(Subject::B) }
    }

    pub fn map<U>(&self, mut f: impl FnMut(Subject, &T) -> U) -> PerSubject<U> {
        PerSubject { a: f(Subject::A, &self.a), b: f(Subject::B, &self.b) }
    }
}

impl<T> Index<Subject> for PerSubject<T> {
    type Output = T;

    fn index(&self, subject: Subject) -> &T {
        match subject {
            Subject::A => &self.a,
            Subject::B => &self.b,
        }
    }
}

impl<T> IndexMut<Subject> for PerSubject<T> {
    fn index_mut(&mut self, subject: Subject) -> &mut T {
        match subject {
            Subject::A => &mut self.a,
            Subject::B => &mut self.b,
        }
    }
}
