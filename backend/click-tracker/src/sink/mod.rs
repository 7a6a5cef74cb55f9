use async_trait::async_trait;
use click_event::EventRecord;
use std::time::Duration;
use thiserror::Error;

mod clickhouse;

pub use self::clickhouse::{ClickHouseSink, ClickRow};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("ClickHouse error: {0}")]
    ClickHouse(#[from] ::clickhouse::error::Error),

    #[error("batch load timed out after {0:?}")]
    Timeout(Duration),

    #[error("batch rejected: {0}")]
    Rejected(String),
}

/// Columnar store receiving exported batches.
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    /// Load every record as one unit. On `Err` none of the batch should be
    /// considered delivered; it will be queued again.
    async fn load_batch(&self, records: &[EventRecord]) -> Result<(), SinkError>;
}
