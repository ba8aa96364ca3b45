//! Shared application state for the web server.

use std::sync::{Arc, Mutex, PoisonError};

use atlas_catalog::OptionSet;
use atlas_views::{Banner, Dashboard, Layout, PanelSnapshot};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::host::{spawn_panel, PanelHandle};

/// Events pushed to connected clients via SSE.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    /// A panel's selection or one of its views changed
    PanelUpdated { snapshot: Box<PanelSnapshot> },
    /// The catalog banner was dismissed
    BannerDismissed,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    pub id: Uuid,
    pub emitted_at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: AppEvent,
}

impl EventEnvelope {
    pub fn new(event: AppEvent) -> Self {
        Self { id: Uuid::new_v4(), emitted_at: Utc::now(), event }
    }
}

/// Shared state injected into every Axum handler.
pub struct AppState {
    pub layout: Layout,
    pub catalog_available: bool,
    pub options_a: OptionSet,
    banner: Mutex<Option<Banner>>,
    panels: Vec<PanelHandle>,
    /// Broadcast channel for SSE push events
    pub event_tx: broadcast::Sender<EventEnvelope>,
}

impl AppState {
    /// Move every panel of `dashboard` into its own task.
    pub fn new(mut dashboard: Dashboard) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        let panels: Vec<PanelHandle> = dashboard
            .take_panels()
            .into_iter()
            .map(|slot| spawn_panel(slot, event_tx.clone()))
            .collect();
        info!(panels = panels.len(), layout = ?dashboard.layout(), "Panel tasks started");

        Self {
            layout: dashboard.layout(),
            catalog_available: dashboard.catalog().is_available(),
            options_a: dashboard.options_a(),
            banner: Mutex::new(dashboard.banner().cloned()),
            panels,
            event_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.event_tx.subscribe()
    }

    pub fn panel(&self, id: &str) -> Result<&PanelHandle, ApiError> {
        self.panels.iter().find(|p| p.id() == id).ok_or_else(|| {
            ApiError::Atlas(atlas_common::AtlasError::InvalidOption {
                field: "panel".to_string(),
                value: id.to_string(),
            })
        })
    }

    pub fn panel_ids(&self) -> Vec<&str> {
        self.panels.iter().map(|p| p.id()).collect()
    }

    /// The banner while it is still shown.
    pub fn banner(&self) -> Option<Banner> {
        self.banner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .filter(|b| !b.dismissed)
    }

    pub fn dismiss_banner(&self) {
        let mut banner = self.banner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(banner) = banner.as_mut() {
            banner.dismissed = true;
            // No subscribers is fine.
            let _ = self.event_tx.send(EventEnvelope::new(AppEvent::BannerDismissed));
        }
    }
}

pub type SharedState = Arc<AppState>;
