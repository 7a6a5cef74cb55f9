use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::Client;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::QueueError;
use crate::timeout::{clamp_command_timeout, run_with_timeout, DEFAULT_COMMAND_TIMEOUT};
use crate::{DurableQueue, QueueEntry};

/// Open a reconnecting Redis connection for a queue handle.
pub async fn connect(redis_url: &str) -> Result<ConnectionManager, QueueError> {
    let client = Client::open(redis_url)?;
    let manager = ConnectionManager::new(client).await?;
    info!("Connected to Redis queue backend");
    Ok(manager)
}

/// Queue stored in a single Redis list.
///
/// `RPUSH` appends at the tail and `LPOP key count` removes from the head,
/// so every dequeue is a single atomic server command (Redis 6.2+). Concurrent
/// producers are serialized by the Redis server.
#[derive(Clone)]
pub struct RedisListQueue {
    conn: ConnectionManager,
    key: String,
    command_timeout: Duration,
}

impl RedisListQueue {
    pub fn new(conn: ConnectionManager, key: impl Into<String>) -> Self {
        Self {
            conn,
            key: key.into(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    /// Values below [`crate::MIN_COMMAND_TIMEOUT`] are raised to it.
    pub fn with_command_timeout(mut self, command_timeout: Duration) -> Self {
        self.command_timeout = clamp_command_timeout(command_timeout);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

#[async_trait]
impl DurableQueue for RedisListQueue {
    async fn enqueue(&self, entry: &[u8]) -> Result<(), QueueError> {
        let mut conn = self.conn.clone();
        let len: i64 = run_with_timeout(
            self.command_timeout,
            redis::cmd("RPUSH")
                .arg(&self.key)
                .arg(entry)
                .query_async(&mut conn),
        )
        .await?;
        debug!(key = %self.key, len, "Enqueued entry");
        Ok(())
    }

    async fn enqueue_many(&self, entries: &[QueueEntry]) -> Result<(), QueueError> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut cmd = redis::cmd("RPUSH");
        cmd.arg(&self.key);
        for entry in entries {
            cmd.arg(entry.as_slice());
        }

        let mut conn = self.conn.clone();
        let len: i64 = run_with_timeout(self.command_timeout, cmd.query_async(&mut conn)).await?;
        debug!(key = %self.key, count = entries.len(), len, "Enqueued entries");
        Ok(())
    }

    async fn dequeue_batch(&self, max_count: usize) -> Result<Vec<QueueEntry>, QueueError> {
        if max_count == 0 {
            return Ok(Vec::new());
        }

        // A timed-out LPOP may still have removed entries on the server.
        let mut conn = self.conn.clone();
        let popped: Option<Vec<QueueEntry>> = run_with_timeout(
            self.command_timeout,
            redis::cmd("LPOP")
                .arg(&self.key)
                .arg(max_count)
                .query_async(&mut conn),
        )
        .await?;

        Ok(popped.unwrap_or_default())
    }

    async fn depth(&self) -> Result<usize, QueueError> {
        let mut conn = self.conn.clone();
        run_with_timeout(
            self.command_timeout,
            redis::cmd("LLEN").arg(&self.key).query_async(&mut conn),
        )
        .await
    }
}
