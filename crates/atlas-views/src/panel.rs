//! One independent panel: a selection cascade plus the views it drives.

use std::sync::Arc;

use atlas_cascade::{
    initialize, reduce, CascadeEffect, CascadeEvent, DeepLink, RangeEvent, SelectionState,
    SelectorBindings,
};
use atlas_catalog::{Catalog, CatalogState, Field};
use atlas_client::AtlasSource;
use atlas_common::{DashboardConfig, Result, Subject};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::controller::{FetchOutcome, ViewController};
use crate::snapshot::PanelSnapshot;

/// Fetch outcomes addressed to one panel.
pub type Outcomes = mpsc::UnboundedReceiver<FetchOutcome>;

pub struct Panel {
    id: String,
    catalog: CatalogState,
    state: SelectionState,
    controller: ViewController,
    selectors: Option<SelectorBindings>,
}

impl Panel {
    pub fn new(
        id: &str,
        catalog: Arc<Catalog>,
        source: Arc<dyn AtlasSource>,
        config: &DashboardConfig,
    ) -> (Self, Outcomes) {
        Self::from_state(id, CatalogState::Available(catalog), source, config)
    }

    /// A panel whose cascade is disabled because the catalog never loaded.
    pub fn unavailable(
        id: &str,
        reason: &str,
        source: Arc<dyn AtlasSource>,
        config: &DashboardConfig,
    ) -> (Self, Outcomes) {
        let state = CatalogState::Unavailable { reason: reason.to_string() };
        Self::from_state(id, state, source, config)
    }

    pub fn from_state(
        id: &str,
        catalog: CatalogState,
        source: Arc<dyn AtlasSource>,
        config: &DashboardConfig,
    ) -> (Self, Outcomes) {
        let state = match &catalog {
            CatalogState::Available(c) => SelectionState::new(c),
            CatalogState::Unavailable { .. } => SelectionState::default(),
        };
        let (controller, outcomes) = ViewController::new(id, source, config);
        let panel = Self { id: id.to_string(), catalog, state, controller, selectors: None };
        (panel, outcomes)
    }

    /// Mirror every settled state into `bindings`.
    pub fn with_selectors(mut self, bindings: SelectorBindings) -> Self {
        bindings.set_enabled(self.is_enabled());
        self.selectors = Some(bindings);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_enabled(&self) -> bool {
        self.catalog.is_available()
    }

    pub fn selection(&self) -> &SelectionState {
        &self.state
    }

    pub fn controller(&self) -> &ViewController {
        &self.controller
    }

    pub fn in_flight(&self) -> usize {
        self.controller.in_flight()
    }

    // ── Cascade ───────────────────────────────────────────────────────────────

    /// Apply the default or deep-linked selection.
    pub async fn open(&mut self, deep_link: Option<&DeepLink>) -> Result<()> {
        let catalog = self.catalog.catalog()?.clone();
        let (state, effects) = initialize(&catalog, deep_link)?;
        info!(panel = %self.id, status = ?state.status(), "Panel opened");
        self.commit(state, effects).await;
        Ok(())
    }

    /// Set or clear one field.
    pub async fn select(&mut self, field: Field, value: Option<String>) -> Result<()> {
        let event = match value {
            Some(value) => CascadeEvent::set(field, value),
            None => CascadeEvent::clear(field),
        };
        self.dispatch(event).await
    }

    /// Deselect all three fields.
    pub async fn reset(&mut self) -> Result<()> {
        self.dispatch(CascadeEvent::Reset).await
    }

    pub async fn dispatch(&mut self, event: CascadeEvent) -> Result<()> {
        let catalog = self.catalog.catalog()?.clone();
        let (state, effects) = reduce(&catalog, &self.state, &event)?;
        debug!(panel = %self.id, ?event, status = ?state.status(), "Cascade settled");
        self.commit(state, effects).await;
        Ok(())
    }

    /// Options are published before any effect runs, so views never run
    /// ahead of the controls.
    async fn commit(&mut self, state: SelectionState, effects: Vec<CascadeEffect>) {
        self.state = state;
        if let Some(selectors) = &self.selectors {
            selectors.publish(&self.state).await;
        }
        for effect in effects {
            self.controller.apply_effect(effect);
        }
    }

    // ── Views ─────────────────────────────────────────────────────────────────

    pub fn range(&mut self, subject: Subject, event: RangeEvent) -> Result<()> {
        self.catalog.catalog()?;
        self.controller.range_event(subject, event);
        Ok(())
    }

    pub fn set_genes(&mut self, subject: Subject, genes: &[String]) -> Result<()> {
        self.catalog.catalog()?;
        self.controller.set_genes(subject, genes)
    }

    pub fn select_all_genes(&mut self, subject: Subject) -> Result<()> {
        self.catalog.catalog()?;
        self.controller.select_all_genes(subject)
    }

    pub fn select_no_genes(&mut self, subject: Subject) -> Result<()> {
        self.catalog.catalog()?;
        self.controller.deselect_all_genes(subject)
    }

    pub fn apply(&mut self, outcome: FetchOutcome) -> bool {
        self.controller.apply(outcome)
    }

    /// Wait for the next outcome and apply it. False when it was stale or
    /// the channel is closed.
    pub async fn pump(&mut self, outcomes: &mut Outcomes) -> bool {
        match outcomes.recv().await {
            Some(outcome) => self.apply(outcome),
            None => false,
        }
    }

    /// Apply outcomes until no current fetch is left.
    pub async fn settle(&mut self, outcomes: &mut Outcomes) {
        while self.in_flight() > 0 {
            match outcomes.recv().await {
                Some(outcome) => {
                    self.apply(outcome);
                }
                None => break,
            }
        }
    }

    pub fn snapshot(&self) -> PanelSnapshot {
        let study = match (&self.catalog, self.controller.study()) {
            (CatalogState::Available(catalog), Some(triple)) => {
                catalog.find(&triple.subject_a, &triple.subject_b, &triple.source)
            }
            _ => None,
        };
        PanelSnapshot::capture(
            &self.id,
            self.is_enabled(),
            &self.state,
            study,
            self.controller.views(),
        )
    }
}
