//! One task per panel.
//!
//! The task is the only owner of its [`Panel`]. API commands arrive on an
//! mpsc channel with a oneshot for the reply; fetch outcomes arrive on the
//! panel's own channel. Both are handled one at a time, so a cascade
//! recomputation never interleaves with another event for the same panel.

use atlas_cascade::{DeepLink, RangeEvent};
use atlas_catalog::Field;
use atlas_common::{Result, Subject};
use atlas_views::{Panel, PanelSlot, PanelSnapshot};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::{AppEvent, EventEnvelope};

#[derive(Debug, Clone)]
pub enum PanelCommand {
    Open(Option<DeepLink>),
    Select { field: Field, value: Option<String> },
    Reset,
    Range { subject: Subject, event: RangeEvent },
    SetGenes { subject: Subject, genes: Vec<String> },
    AllGenes(Subject),
    NoGenes(Subject),
    Snapshot,
}

impl PanelCommand {
    fn mutates(&self) -> bool {
        !matches!(self, PanelCommand::Snapshot)
    }
}

struct PanelRequest {
    command: PanelCommand,
    reply: oneshot::Sender<Result<PanelSnapshot>>,
}

#[derive(Clone)]
pub struct PanelHandle {
    id: String,
    tx: mpsc::Sender<PanelRequest>,
}

impl PanelHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Run `command` on the panel task and return the resulting snapshot.
    pub async fn call(&self, command: PanelCommand) -> std::result::Result<PanelSnapshot, ApiError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(PanelRequest { command, reply })
            .await
            .map_err(|_| ApiError::PanelStopped(self.id.clone()))?;
        let snapshot = rx.await.map_err(|_| ApiError::PanelStopped(self.id.clone()))??;
        Ok(snapshot)
    }
}

pub fn spawn_panel(slot: PanelSlot, events: broadcast::Sender<EventEnvelope>) -> PanelHandle {
    let id = slot.panel.id().to_string();
    let (tx, mut rx) = mpsc::channel::<PanelRequest>(32);
    let PanelSlot { mut panel, mut outcomes } = slot;

    // The panel was opened before the hand-over.
    publish(&events, &panel);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                request = rx.recv() => {
                    let Some(PanelRequest { command, reply }) = request else { break };
                    let mutates = command.mutates();
                    let result = run(&mut panel, command).await.map(|()| panel.snapshot());
                    if mutates && result.is_ok() {
                        publish(&events, &panel);
                    }
                    // The caller may have gone away.
                    let _ = reply.send(result);
                }
                Some(outcome) = outcomes.recv() => {
                    if panel.apply(outcome) {
                        publish(&events, &panel);
                    }
                }
            }
        }
        info!(panel = %panel.id(), "Panel task stopped");
    });

    PanelHandle { id, tx }
}

async fn run(panel: &mut Panel, command: PanelCommand) -> Result<()> {
    debug!(panel = %panel.id(), ?command, "Panel command");
    match command {
        PanelCommand::Open(link) => panel.open(link.as_ref()).await,
        PanelCommand::Select { field, value } => panel.select(field, value).await,
        PanelCommand::Reset => panel.reset().await,
        PanelCommand::Range { subject, event } => panel.range(subject, event),
        PanelCommand::SetGenes { subject, genes } => panel.set_genes(subject, &genes),
        PanelCommand::AllGenes(subject) => panel.select_all_genes(subject),
        PanelCommand::NoGenes(subject) => panel.select_no_genes(subject),
        PanelCommand::Snapshot => Ok(()),
    }
}

fn publish(events: &broadcast::Sender<EventEnvelope>, panel: &Panel) {
    let event = AppEvent::PanelUpdated { snapshot: Box::new(panel.snapshot()) };
    // No subscribers is fine.
    let _ = events.send(EventEnvelope::new(event));
}
