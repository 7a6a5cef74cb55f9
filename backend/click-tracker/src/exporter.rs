/// Batch Exporter - drains the click queue into the analytics sink
///
/// ## Cycle
///
/// ```text
///        ┌────────────────────────────────────────────┐
///        ▼                                            │ full batch
///   [Drain] ──empty──▶ Idle                           │
///        │                                            │
///        ▼                                            │
///   [Decode] ── malformed entries dropped + counted   │
///        │    nothing decoded ──▶ Idle                │
///        ▼                                            │
///   [Load] ──ok──▶ [Continue?] ───────────────────────┘
///        │               │ short batch
///        │               ▼
///        │             Idle
///        ▼
///   re-enqueue batch at tail, stop run with error
/// ```
///
/// ## Guarantees
///
/// - **At-least-once**: a batch is either loaded or handed back to the queue
///   before the run reports failure. Duplicates in the sink are possible.
/// - **Bounded blast radius**: at most `batch_size` records are re-enqueued
///   per failure.
/// - **No poison loop on bad data**: entries that fail to decode are dropped.
///
/// A crash between dequeue and load/re-enqueue loses that batch; the queue
/// has no lease or visibility timeout.
use click_event::EventRecord;
use durable_queue::{DurableQueue, QueueEntry, QueueError};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::metrics;
use crate::sink::{AnalyticsSink, SinkError};

pub const DEFAULT_BATCH_SIZE: usize = 500;
const DEFAULT_REQUEUE_ATTEMPTS: u32 = 3;
const DEFAULT_REQUEUE_BACKOFF: Duration = Duration::from_millis(100);
const MALFORMED_PREVIEW_BYTES: usize = 256;

/// Totals for one export cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportReport {
    /// Records loaded into the sink
    pub exported: usize,
    /// Successful batch loads
    pub batches: usize,
    /// Entries dropped because they could not be decoded
    pub malformed: usize,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("queue error after exporting {exported} records: {source}")]
    Queue {
        exported: usize,
        #[source]
        source: QueueError,
    },

    #[error("sink load failed after exporting {exported} records, {requeued} records returned to the queue: {source}")]
    SinkLoad {
        exported: usize,
        requeued: usize,
        #[source]
        source: SinkError,
    },

    #[error("sink load failed ({load_error}) and {lost} records could not be returned to the queue: {requeue_error}")]
    RequeueFailed {
        exported: usize,
        lost: usize,
        load_error: SinkError,
        #[source]
        requeue_error: QueueError,
    },

    #[error("an export cycle is already running")]
    AlreadyRunning,
}

impl ExportError {
    /// Records successfully loaded before the run stopped.
    pub fn exported(&self) -> usize {
        match self {
            ExportError::Queue { exported, .. }
            | ExportError::SinkLoad { exported, .. }
            | ExportError::RequeueFailed { exported, .. } => *exported,
            ExportError::AlreadyRunning => 0,
        }
    }
}

/// Decoded records plus the raw entries they came from. On failure the raw
/// entries go back to the queue unchanged.
struct Batch {
    records: Vec<EventRecord>,
    raw: Vec<QueueEntry>,
    malformed: usize,
}

impl Batch {
    fn decode(entries: Vec<QueueEntry>) -> Self {
        let mut batch = Batch {
            records: Vec::with_capacity(entries.len()),
            raw: Vec::with_capacity(entries.len()),
            malformed: 0,
        };

        for entry in entries {
            match click_event::decode(&entry) {
                Ok(record) => {
                    batch.records.push(record);
                    batch.raw.push(entry);
                }
                Err(e) => {
                    let preview_len = entry.len().min(MALFORMED_PREVIEW_BYTES);
                    warn!(
                        error = %e,
                        entry = %String::from_utf8_lossy(&entry[..preview_len]),
                        "Skipping malformed record"
                    );
                    batch.malformed += 1;
                }
            }
        }

        batch
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Single logical consumer of the click queue.
///
/// Cycles on one exporter never overlap; run at most one exporter per queue.
pub struct BatchExporter {
    queue: Arc<dyn DurableQueue>,
    sink: Arc<dyn AnalyticsSink>,
    batch_size: usize,
    requeue_attempts: u32,
    requeue_backoff: Duration,
    running: Mutex<()>,
}

impl BatchExporter {
    pub fn new(queue: Arc<dyn DurableQueue>, sink: Arc<dyn AnalyticsSink>) -> Self {
        Self {
            queue,
            sink,
            batch_size: DEFAULT_BATCH_SIZE,
            requeue_attempts: DEFAULT_REQUEUE_ATTEMPTS,
            requeue_backoff: DEFAULT_REQUEUE_BACKOFF,
            running: Mutex::new(()),
        }
    }

    /// Zero is raised to one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Retry policy for handing a failed batch back to the queue.
    pub fn with_requeue_retry(mut self, attempts: u32, initial_backoff: Duration) -> Self {
        self.requeue_attempts = attempts.max(1);
        self.requeue_backoff = initial_backoff;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Drain the queue into the sink until a short batch or a failure.
    pub async fn run_export_cycle(&self) -> Result<ExportReport, ExportError> {
        let _guard = self
            .running
            .try_lock()
            .map_err(|_| ExportError::AlreadyRunning)?;

        let result = self.drain().await;
        match &result {
            Ok(report) => {
                metrics::record_export_run("success");
                info!(
                    exported = report.exported,
                    batches = report.batches,
                    malformed = report.malformed,
                    "Export complete. Total rows: {}",
                    report.exported
                );
            }
            Err(e) => {
                metrics::record_export_run("error");
                error!(exported = e.exported(), "Export run failed: {}", e);
            }
        }
        result
    }

    /// Run a cycle every `interval` until `shutdown` resolves. Failed cycles
    /// are logged and retried on the next tick. Returns the total exported.
    pub async fn run_every<F>(&self, interval: Duration, shutdown: F) -> usize
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut total = 0;
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Exporter shutting down after {} rows", total);
                    break;
                }
                _ = ticker.tick() => {
                    match self.run_export_cycle().await {
                        Ok(report) => total += report.exported,
                        Err(e) => {
                            total += e.exported();
                            warn!("Export cycle failed, retrying in {:?}", interval);
                        }
                    }
                }
            }
        }
        total
    }

    async fn drain(&self) -> Result<ExportReport, ExportError> {
        let mut report = ExportReport::default();

        loop {
            let entries = self
                .queue
                .dequeue_batch(self.batch_size)
                .await
                .map_err(|source| ExportError::Queue {
                    exported: report.exported,
                    source,
                })?;

            if entries.is_empty() {
                debug!("Queue empty");
                break;
            }

            let batch = Batch::decode(entries);
            if batch.malformed > 0 {
                metrics::record_export_rows("malformed", batch.malformed);
                report.malformed += batch.malformed;
            }

            if batch.is_empty() {
                debug!("No decodable records in batch");
                break;
            }

            // Malformed entries shrink the batch, so a short batch ends the run
            // even when the dequeue itself was full.
            let drained = batch.len() < self.batch_size;
            self.load(batch, &mut report).await?;

            if drained {
                break;
            }
        }

        Ok(report)
    }

    async fn load(&self, batch: Batch, report: &mut ExportReport) -> Result<(), ExportError> {
        let count = batch.len();
        let started = Instant::now();

        match self.sink.load_batch(&batch.records).await {
            Ok(()) => {
                metrics::observe_batch_duration(started.elapsed());
                metrics::record_export_rows("exported", count);
                report.exported += count;
                report.batches += 1;
                info!("Inserted {} rows", count);
                Ok(())
            }
            Err(load_error) => {
                error!("Sink load error: {}", load_error);
                match self.requeue(&batch.raw).await {
                    Ok(()) => {
                        metrics::record_export_rows("requeued", count);
                        warn!("Returned {} rows to the queue for retry", count);
                        Err(ExportError::SinkLoad {
                            exported: report.exported,
                            requeued: count,
                            source: load_error,
                        })
                    }
                    Err(requeue_error) => {
                        metrics::record_export_rows("lost", count);
                        error!(
                            lost = count,
                            "Failed to return rows to the queue: {}", requeue_error
                        );
                        Err(ExportError::RequeueFailed {
                            exported: report.exported,
                            lost: count,
                            load_error,
                            requeue_error,
                        })
                    }
                }
            }
        }
    }

    async fn requeue(&self, entries: &[QueueEntry]) -> Result<(), QueueError> {
        let mut attempt = 1;
        let mut backoff = self.requeue_backoff;

        loop {
            match self.queue.enqueue_many(entries).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.requeue_attempts => {
                    warn!(
                        "Re-enqueue attempt {}/{} failed, waiting {:?}: {}",
                        attempt, self.requeue_attempts, backoff, e
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
