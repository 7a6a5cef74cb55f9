use async_trait::async_trait;
use clickhouse::{Client, Row};
use click_event::EventRecord;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info};

use super::{AnalyticsSink, SinkError};
use crate::config::SinkConfig;

/// One row of the clicks table. Column names match the queue wire format.
#[derive(Debug, Clone, PartialEq, Eq, Row, Serialize)]
pub struct ClickRow {
    pub id: String,
    /// Microseconds since the Unix epoch, stored as `DateTime64(6, 'UTC')`
    pub timestamp: i64,
    #[serde(rename = "uniqueId")]
    pub unique_id: String,
    pub sub1: String,
    pub sub2: String,
    pub sub3: String,
    pub sub4: String,
    pub sub5: String,
    pub sub6: String,
    pub sub7: String,
    pub sub8: String,
    pub sub9: String,
    pub sub10: String,
    pub ip: String,
    pub user_agent: String,
}

impl From<&EventRecord> for ClickRow {
    fn from(record: &EventRecord) -> Self {
        let attrs = record.attributes();
        Self {
            id: record.id().to_string(),
            timestamp: record.timestamp().timestamp_micros(),
            unique_id: attrs.unique_id().to_owned(),
            sub1: attrs.sub(1).to_owned(),
            sub2: attrs.sub(2).to_owned(),
            sub3: attrs.sub(3).to_owned(),
            sub4: attrs.sub(4).to_owned(),
            sub5: attrs.sub(5).to_owned(),
            sub6: attrs.sub(6).to_owned(),
            sub7: attrs.sub(7).to_owned(),
            sub8: attrs.sub(8).to_owned(),
            sub9: attrs.sub(9).to_owned(),
            sub10: attrs.sub(10).to_owned(),
            ip: record.client_ip().to_owned(),
            user_agent: record.user_agent().to_owned(),
        }
    }
}

/// ClickHouse-backed analytics sink.
///
/// Each batch goes out as a single `INSERT ... FORMAT RowBinary` request.
/// Batches are far below ClickHouse's insert block size, so a batch is
/// applied as one block or not at all. Dropping an unfinished insert aborts
/// the request.
#[derive(Clone)]
pub struct ClickHouseSink {
    client: Client,
    database: String,
    table: String,
    load_timeout: Duration,
}

impl ClickHouseSink {
    pub fn new(config: &SinkConfig) -> Self {
        // No default database: provisioning must work before it exists.
        let client = Client::default()
            .with_url(&config.url)
            .with_user(&config.user)
            .with_password(&config.password);

        Self {
            client,
            database: config.database.clone(),
            table: config.table.clone(),
            load_timeout: config.load_timeout(),
        }
    }

    fn qualified_table(&self) -> String {
        format!("{}.{}", self.database, self.table)
    }

    /// Create the database and clicks table if they are missing.
    pub async fn ensure_schema(&self) -> Result<(), SinkError> {
        self.client
            .query(&format!("CREATE DATABASE IF NOT EXISTS {}", self.database))
            .execute()
            .await?;
        info!("Database {} ready", self.database);

        self.client
            .query(&create_table_sql(&self.qualified_table()))
            .execute()
            .await?;
        info!("Table {} ready", self.qualified_table());

        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), SinkError> {
        #[derive(Row, serde::Deserialize)]
        struct HealthCheck {
            _result: u32,
        }

        self.client
            .query("SELECT toUInt32(1) AS result")
            .fetch_one::<HealthCheck>()
            .await
            .map(|_| ())
            .map_err(|e| {
                error!("ClickHouse health check failed: {}", e);
                SinkError::from(e)
            })
    }

    async fn insert_rows(&self, records: &[EventRecord]) -> Result<(), SinkError> {
        let mut insert = self.client.insert::<ClickRow>(&self.qualified_table())?;
        for record in records {
            insert.write(&ClickRow::from(record)).await?;
        }
        insert.end().await?;
        Ok(())
    }
}

#[async_trait]
impl AnalyticsSink for ClickHouseSink {
    async fn load_batch(&self, records: &[EventRecord]) -> Result<(), SinkError> {
        if records.is_empty() {
            return Ok(());
        }

        debug!(
            "Loading {} rows into {}",
            records.len(),
            self.qualified_table()
        );

        match tokio::time::timeout(self.load_timeout, self.insert_rows(records)).await {
            Ok(result) => result,
            Err(_) => Err(SinkError::Timeout(self.load_timeout)),
        }
    }
}

fn create_table_sql(qualified_table: &str) -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            id String,
            timestamp DateTime64(6, 'UTC'),
            uniqueId String DEFAULT '',
            sub1 String DEFAULT '',
            sub2 String DEFAULT '',
            sub3 String DEFAULT '',
            sub4 String DEFAULT '',
            sub5 String DEFAULT '',
            sub6 String DEFAULT '',
            sub7 String DEFAULT '',
            sub8 String DEFAULT '',
            sub9 String DEFAULT '',
            sub10 String DEFAULT '',
            ip String DEFAULT '',
            user_agent String DEFAULT ''
        ) ENGINE = MergeTree()
        PARTITION BY toYYYYMM(timestamp)
        ORDER BY (timestamp, id)
        SETTINGS index_granularity = 8192
        "#,
        qualified_table
    )
}
