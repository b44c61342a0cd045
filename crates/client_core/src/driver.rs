use std::sync::Arc;

use shared::{
    domain::{CatalogTicket, IngestTicket, SubmissionId},
    error::WorkflowError,
};
use tokio::{sync::mpsc, task::JoinError};
use tracing::{debug, error};

use crate::{
    ingest,
    workflow::{Effect, WorkflowContext, WorkflowEvent, WorkflowState},
    SwapBackend,
};

pub struct WorkflowDriver {
    backend: Arc<dyn SwapBackend>,
    ctx: WorkflowContext,
    state: WorkflowState,
    settled_tx: mpsc::UnboundedSender<WorkflowEvent>,
    settled_rx: mpsc::UnboundedReceiver<WorkflowEvent>,
    outstanding: usize,
}

impl WorkflowDriver {
    pub fn new(backend: Arc<dyn SwapBackend>, ctx: WorkflowContext) -> Self {
        let (settled_tx, settled_rx) = mpsc::unbounded_channel();
        Self {
            backend,
            ctx,
            state: WorkflowState::default(),
            settled_tx,
            settled_rx,
            outstanding: 0,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn context(&self) -> &WorkflowContext {
        &self.ctx
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Applies one event and starts whatever effects it produced. Never waits on I/O.
    pub fn dispatch(&mut self, event: WorkflowEvent) {
        let state = std::mem::take(&mut self.state);
        let (next, effects) = state.apply(event, &self.ctx);
        self.state = next;
        for effect in effects {
            self.spawn_effect(effect);
        }
    }

    pub async fn next_settled(&mut self) -> bool {
        if self.outstanding == 0 {
            return false;
        }
        match self.settled_rx.recv().await {
            Some(event) => {
                self.outstanding -= 1;
                self.dispatch(event);
                true
            }
            None => false,
        }
    }

    pub async fn settle(&mut self) {
        while self.next_settled().await {}
    }

    fn spawn_effect(&mut self, effect: Effect) {
        self.outstanding += 1;
        let origin = EffectOrigin::of(&effect);
        let backend = Arc::clone(&self.backend);
        let settled_tx = self.settled_tx.clone();
        tokio::spawn(async move {
            let event = match tokio::spawn(run_effect(backend, effect)).await {
                Ok(event) => event,
                Err(err) => {
                    error!(error = %err, "workflow effect task failed");
                    origin.aborted(err)
                }
            };
            if settled_tx.send(event).is_err() {
                debug!("workflow driver dropped before effect settled");
            }
        });
    }
}

#[derive(Debug, Clone, Copy)]
enum EffectOrigin {
    Catalog(CatalogTicket),
    Decode(IngestTicket),
    Swap(SubmissionId),
}

impl EffectOrigin {
    fn of(effect: &Effect) -> Self {
        match effect {
            Effect::FetchCatalog(ticket) => Self::Catalog(*ticket),
            Effect::DecodeImage { ticket, .. } => Self::Decode(*ticket),
            Effect::SubmitSwap(request) => Self::Swap(request.submission_id()),
        }
    }

    // A task that panicked or was cancelled still has to settle its ticket.
    fn aborted(self, err: JoinError) -> WorkflowEvent {
        match self {
            Self::Catalog(ticket) => WorkflowEvent::CatalogSettled {
                ticket,
                result: Err(WorkflowError::network(format!(
                    "catalog request aborted: {err}"
                ))),
            },
            Self::Decode(ticket) => WorkflowEvent::ImageDecoded {
                ticket,
                result: Err(WorkflowError::validation(format!("decode aborted: {err}"))),
            },
            Self::Swap(submission_id) => WorkflowEvent::SwapSettled {
                submission_id,
                result: Err(WorkflowError::network(format!("swap request aborted: {err}"))),
            },
        }
    }
}

async fn run_effect(backend: Arc<dyn SwapBackend>, effect: Effect) -> WorkflowEvent {
    match effect {
        Effect::FetchCatalog(ticket) => WorkflowEvent::CatalogSettled {
            ticket,
            result: backend.fetch_catalog().await,
        },
        Effect::DecodeImage { ticket, file } => WorkflowEvent::ImageDecoded {
            ticket,
            result: ingest::decode_preview(file).await,
        },
        Effect::SubmitSwap(request) => {
            let submission_id = request.submission_id();
            WorkflowEvent::SwapSettled {
                submission_id,
                result: backend.submit_swap(request).await,
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/driver_tests.rs"]
mod tests;
