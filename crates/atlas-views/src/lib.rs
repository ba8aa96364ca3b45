//! atlas-views — Keeping a panel's charts in step with its selection.
//!
//! A [`Panel`] owns one selection cascade and one [`ViewController`]. The
//! controller turns cascade effects, range commits and gene picks into
//! fetches against the [`atlas_client::AtlasSource`], one spawned task per
//! fetch. Results come back as [`FetchOutcome`]s on the panel's channel and
//! are applied only when they carry the latest ticket of their region.
//!
//! A [`Dashboard`] holds one panel, or two ("d1", "d2") in comparison mode,
//! plus the catalog banner.

pub mod controller;
pub mod dashboard;
pub mod flight;
pub mod gene;
pub mod panel;
pub mod region;
pub mod render;
pub mod snapshot;

pub use controller::{FetchOutcome, FetchRegion, FetchResult, PanelViews, ViewController};
pub use dashboard::{Banner, Dashboard, DashboardSnapshot, Layout, PanelSlot};
pub use flight::{FlightTracker, Ticket};
pub use gene::GenePicker;
pub use panel::{Outcomes, Panel};
pub use region::{FailureKind, PerSubject, RegionId, RegionView, ViewFailure};
pub use render::{render_snapshot, ChartRenderer, FigureRenderer, RenderError, RenderReport};
pub use snapshot::{PanelSnapshot, SliderView, StudyInfo};
