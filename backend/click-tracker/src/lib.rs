//! Click tracking pipeline.
//!
//! `GET /track` turns each click into an [`click_event::EventRecord`] and pushes
//! it onto a durable queue without waiting on anything downstream. The
//! `click-exporter` binary drains that queue in bounded batches into
//! ClickHouse with at-least-once delivery.

pub mod config;
pub mod error;
pub mod exporter;
pub mod ingest;
pub mod logging;
pub mod metrics;
pub mod sink;

pub use config::Config;
pub use error::{Result, TrackerError};
pub use exporter::{BatchExporter, ExportError, ExportReport};
pub use ingest::{AppState, IngestOutcome, Ingestor, RequestContext};
pub use sink::{AnalyticsSink, ClickHouseSink, SinkError};
