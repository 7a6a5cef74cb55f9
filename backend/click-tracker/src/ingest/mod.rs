use actix_web::web;
use click_event::{ClickAttributes, CodecError, EventRecord};
use durable_queue::{DurableQueue, QueueError};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

mod context;
pub mod handlers;
pub mod pixel;

pub use context::RequestContext;

/// Why a click did not reach the queue.
#[derive(Debug, Error)]
pub enum DropReason {
    #[error(transparent)]
    Encode(#[from] CodecError),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Result of recording one click. Never shown to the client.
#[derive(Debug)]
pub enum IngestOutcome {
    Enqueued { id: Uuid },
    Dropped { id: Uuid, reason: DropReason },
}

impl IngestOutcome {
    pub fn id(&self) -> Uuid {
        match self {
            IngestOutcome::Enqueued { id } | IngestOutcome::Dropped { id, .. } => *id,
        }
    }

    pub fn is_enqueued(&self) -> bool {
        matches!(self, IngestOutcome::Enqueued { .. })
    }

    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            IngestOutcome::Enqueued { .. } => "enqueued",
            IngestOutcome::Dropped {
                reason: DropReason::Queue(_),
                ..
            } => "queue_error",
            IngestOutcome::Dropped {
                reason: DropReason::Encode(_),
                ..
            } => "encode_error",
        }
    }
}

/// Turns clicks into queued records.
///
/// Holds nothing but its queue handle, so any number of copies can serve
/// requests concurrently.
#[derive(Clone)]
pub struct Ingestor {
    queue: Arc<dyn DurableQueue>,
}

impl Ingestor {
    pub fn new(queue: Arc<dyn DurableQueue>) -> Self {
        Self { queue }
    }

    pub async fn record_event(
        &self,
        attributes: ClickAttributes,
        context: RequestContext,
    ) -> IngestOutcome {
        let record = EventRecord::new(attributes, context.client_ip, context.user_agent);
        let id = record.id();

        let payload = match record.encode() {
            Ok(payload) => payload,
            Err(e) => {
                return IngestOutcome::Dropped {
                    id,
                    reason: e.into(),
                }
            }
        };

        match self.queue.enqueue(&payload).await {
            Ok(()) => IngestOutcome::Enqueued { id },
            Err(e) => IngestOutcome::Dropped {
                id,
                reason: e.into(),
            },
        }
    }
}

/// Shared state for the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub ingestor: Ingestor,
    pub queue: Arc<dyn DurableQueue>,
}

impl AppState {
    pub fn new(queue: Arc<dyn DurableQueue>) -> Self {
        Self {
            ingestor: Ingestor::new(Arc::clone(&queue)),
            queue,
        }
    }
}

/// Register the tracker routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/track", web::get().to(handlers::track))
        .route("/health", web::get().to(handlers::health))
        .route("/ready", web::get().to(handlers::ready))
        .route("/metrics", web::get().to(crate::metrics::serve_metrics));
}
