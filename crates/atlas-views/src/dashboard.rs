//! Page-level composition: one or two panels over one catalog.

use std::sync::Arc;

use atlas_cascade::DeepLink;
use atlas_catalog::{CatalogState, Field, OptionSet};
use atlas_client::AtlasSource;
use atlas_common::{AtlasError, DashboardConfig, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::panel::{Outcomes, Panel};
use crate::snapshot::PanelSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    Single,
    Comparison,
}

impl Layout {
    pub fn from_config(config: &DashboardConfig) -> Self {
        if config.server.comparison {
            Layout::Comparison
        } else {
            Layout::Single
        }
    }

    pub fn panel_ids(&self) -> &'static [&'static str] {
        match self {
            Layout::Single => &["d1"],
            Layout::Comparison => &["d1", "d2"],
        }
    }
}

/// Page-wide notice for a catalog that failed to load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Banner {
    pub message: String,
    pub hint: String,
    pub dismissed: bool,
}

impl From<&AtlasError> for Banner {
    fn from(err: &AtlasError) -> Self {
        Self { message: err.to_string(), hint: err.hint().to_string(), dismissed: false }
    }
}

/// A panel with the receiving end of its fetch channel.
pub struct PanelSlot {
    pub panel: Panel,
    pub outcomes: Outcomes,
}

impl PanelSlot {
    pub async fn settle(&mut self) {
        self.panel.settle(&mut self.outcomes).await;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub layout: Layout,
    pub catalog_available: bool,
    /// Present while the banner is shown.
    pub banner: Option<Banner>,
    pub options_a: OptionSet,
    pub panels: Vec<PanelSnapshot>,
}

pub struct Dashboard {
    layout: Layout,
    catalog: CatalogState,
    banner: Option<Banner>,
    panels: Vec<PanelSlot>,
}

impl Dashboard {
    /// Load the catalog once and open every panel of the configured layout.
    pub async fn load(
        source: Arc<dyn AtlasSource>,
        config: &DashboardConfig,
        deep_link: Option<&DeepLink>,
    ) -> Self {
        let catalog = CatalogState::from_result(source.dataset_catalog().await);
        Self::with_catalog(catalog, source, config, deep_link).await
    }

    /// The deep link, if any, drives the first panel; the others open with
    /// defaults.
    pub async fn with_catalog(
        catalog: CatalogState,
        source: Arc<dyn AtlasSource>,
        config: &DashboardConfig,
        deep_link: Option<&DeepLink>,
    ) -> Self {
        let layout = Layout::from_config(config);
        let banner = match &catalog {
            CatalogState::Available(_) => None,
            CatalogState::Unavailable { reason } => {
                Some(Banner::from(&AtlasError::CatalogUnavailable(reason.clone())))
            }
        };

        let mut panels = Vec::with_capacity(layout.panel_ids().len());
        for (i, id) in layout.panel_ids().iter().enumerate() {
            let (mut panel, outcomes) =
                Panel::from_state(id, catalog.clone(), source.clone(), config);
            if catalog.is_available() {
                let link = if i == 0 { deep_link } else { None };
                if let Err(e) = panel.open(link).await {
                    warn!(panel = %id, error = %e, "Panel failed to open");
                }
            }
            panels.push(PanelSlot { panel, outcomes });
        }

        info!(?layout, panels = panels.len(), catalog_available = catalog.is_available(), "Dashboard loaded");
        Self { layout, catalog, banner, panels }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn catalog(&self) -> &CatalogState {
        &self.catalog
    }

    /// The banner while it is still shown.
    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref().filter(|b| !b.dismissed)
    }

    pub fn dismiss_banner(&mut self) {
        if let Some(banner) = self.banner.as_mut() {
            banner.dismissed = true;
        }
    }

    pub fn panel(&self, id: &str) -> Result<&Panel> {
        self.panels
            .iter()
            .find(|slot| slot.panel.id() == id)
            .map(|slot| &slot.panel)
            .ok_or_else(|| unknown_panel(id))
    }

    pub fn panel_mut(&mut self, id: &str) -> Result<&mut PanelSlot> {
        self.panels
            .iter_mut()
            .find(|slot| slot.panel.id() == id)
            .ok_or_else(|| unknown_panel(id))
    }

    /// Apply outcomes in every panel until none has a current fetch.
    pub async fn settle(&mut self) {
        for slot in &mut self.panels {
            slot.settle().await;
        }
    }

    /// Hand the panels over to hosts that drive each one in its own task.
    pub fn take_panels(&mut self) -> Vec<PanelSlot> {
        std::mem::take(&mut self.panels)
    }

    pub fn options_a(&self) -> OptionSet {
        match &self.catalog {
            CatalogState::Available(catalog) => catalog.options(Field::SubjectA),
            CatalogState::Unavailable { .. } => OptionSet::empty(),
        }
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            layout: self.layout,
            catalog_available: self.catalog.is_available(),
            banner: self.banner().cloned(),
            options_a: self.options_a(),
            panels: self.panels.iter().map(|slot| slot.panel.snapshot()).collect(),
        }
    }
}

fn unknown_panel(id: &str) -> AtlasError {
    AtlasError::InvalidOption { field: "panel".to_string(), value: id.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_cascade::SelectionStatus;
    use atlas_client::{EndpointKind, MockAtlasSource};
    use atlas_common::Subject;
    use atlas_test_utils::fixtures::{mock_source, multi_study_records, within};
    use pretty_assertions::assert_eq;

    fn comparison_config() -> DashboardConfig {
        let mut config = DashboardConfig::default();
        config.server.comparison = true;
        config
    }

    #[tokio::test]
    async fn test_single_layout_has_one_panel() {
        let source: Arc<dyn AtlasSource> = Arc::new(mock_source(multi_study_records()));
        let dashboard = Dashboard::load(source, &DashboardConfig::default(), None).await;
        assert_eq!(dashboard.layout(), Layout::Single);
        assert!(dashboard.panel("d1").is_ok());
        let err = dashboard.panel("d2").err().unwrap();
        assert!(matches!(err, AtlasError::InvalidOption { ref field, .. } if field == "panel"));
    }

    #[tokio::test]
    async fn test_comparison_panels_are_independent() {
        let source: Arc<dyn AtlasSource> = Arc::new(mock_source(multi_study_records()));
        let mut dashboard = Dashboard::load(source, &comparison_config(), None).await;
        within(dashboard.settle()).await;
        let before = dashboard.panel("d1").unwrap().snapshot();

        let slot = dashboard.panel_mut("d2").unwrap();
        slot.panel.select(Field::SubjectA, Some("phi KZ".into())).await.unwrap();
        slot.panel.select(Field::SubjectB, Some("P. aeruginosa PAO1".into())).await.unwrap();
        within(dashboard.settle()).await;

        let d1 = dashboard.panel("d1").unwrap().snapshot();
        let d2 = dashboard.panel("d2").unwrap().snapshot();
        assert_eq!(d1, before);
        assert_eq!(d2.status, SelectionStatus::FullySelected);
        assert_eq!(d2.study.map(|s| s.source), Some("Study3".to_string()));
        assert_ne!(d1.heatmaps[Subject::A], d2.heatmaps[Subject::A]);
    }

    #[tokio::test]
    async fn test_deep_link_drives_first_panel_only() {
        let source: Arc<dyn AtlasSource> = Arc::new(mock_source(multi_study_records()));
        let link = DeepLink {
            subject_a: Some("T7".into()),
            subject_b: Some("E.coli-B".into()),
            source: Some("Study2".into()),
        };
        let dashboard = Dashboard::load(source, &comparison_config(), Some(&link)).await;

        let d1 = dashboard.panel("d1").unwrap().selection().resolved().unwrap();
        let d2 = dashboard.panel("d2").unwrap().selection().resolved().unwrap();
        assert_eq!(d1.subject_a, "T7");
        assert_eq!(d2.subject_a, "T4");
    }

    #[tokio::test]
    async fn test_unavailable_catalog_shows_dismissible_banner() {
        let source: Arc<dyn AtlasSource> =
            Arc::new(MockAtlasSource::new().failing(EndpointKind::Catalog));
        let mut dashboard = Dashboard::load(source, &comparison_config(), None).await;

        let snapshot = dashboard.snapshot();
        assert!(!snapshot.catalog_available);
        assert!(snapshot.options_a.is_empty());
        assert!(snapshot.panels.iter().all(|p| !p.cascade_enabled));
        let banner = snapshot.banner.unwrap();
        assert!(banner.message.contains("catalog"));
        assert!(!banner.hint.is_empty());

        dashboard.dismiss_banner();
        assert!(dashboard.banner().is_none());
        assert!(dashboard.snapshot().banner.is_none());
    }

    #[tokio::test]
    async fn test_take_panels_empties_dashboard() {
        let source: Arc<dyn AtlasSource> = Arc::new(mock_source(multi_study_records()));
        let mut dashboard = Dashboard::load(source, &comparison_config(), None).await;
        let panels = dashboard.take_panels();
        assert_eq!(panels.len(), 2);
        assert!(dashboard.snapshot().panels.is_empty());
    }
}
