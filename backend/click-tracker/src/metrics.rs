//! Prometheus metrics for ingestion and export
//!
//! Queue write failures on the ingest path never reach the client, so
//! `click_tracker_ingest_total{outcome!="enqueued"}` is the signal to alert on.

use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_int_counter_vec, Encoder, Histogram, IntCounterVec, TextEncoder,
};
use std::time::Duration;

use crate::error::{Result, TrackerError};

/// Clicks handled by the ingest endpoint, by outcome
static INGEST_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "click_tracker_ingest_total",
        "Total clicks received by outcome (enqueued/queue_error/encode_error)",
        &["outcome"]
    )
    .expect("failed to register click_tracker_ingest_total")
});

/// Rows moved by the exporter, by result
static EXPORT_ROWS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "click_tracker_export_rows_total",
        "Total rows handled by the exporter (exported/requeued/malformed/lost)",
        &["result"]
    )
    .expect("failed to register click_tracker_export_rows_total")
});

static EXPORT_RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "click_tracker_export_runs_total",
        "Total export cycles (success/error)",
        &["status"]
    )
    .expect("failed to register click_tracker_export_runs_total")
});

static EXPORT_BATCH_DURATION_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "click_tracker_export_batch_duration_seconds",
        "Duration of a single batch load into the analytics sink",
        vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]
    )
    .expect("failed to register click_tracker_export_batch_duration_seconds")
});

pub fn record_ingest(outcome: &str) {
    INGEST_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_export_rows(result: &str, count: usize) {
    EXPORT_ROWS_TOTAL
        .with_label_values(&[result])
        .inc_by(count as u64);
}

pub fn record_export_run(status: &str) {
    EXPORT_RUNS_TOTAL.with_label_values(&[status]).inc();
}

pub fn observe_batch_duration(duration: Duration) {
    EXPORT_BATCH_DURATION_SECONDS.observe(duration.as_secs_f64());
}

/// `GET /metrics`
pub async fn serve_metrics() -> Result<HttpResponse> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TrackerError::Internal(format!("metrics encoding failed: {}", e)))?;

    Ok(HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer))
}
