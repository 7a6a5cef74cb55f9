//! Durable FIFO queue decoupling click ingestion from export.
//!
//! Producers append serialized records at the tail; a single logical
//! consumer removes them from the head in batches. A dequeued entry is gone
//! from the queue whether or not the consumer succeeds with it, so consumers
//! that fail must hand entries back with [`DurableQueue::enqueue_many`].
//!
//! Two implementations are provided:
//! - [`RedisListQueue`] backed by a Redis list (`RPUSH` / `LPOP count`)
//! - [`MemoryQueue`] for tests and local development

use async_trait::async_trait;

mod error;
mod memory;
mod redis_list;
mod timeout;

pub use error::QueueError;
pub use memory::MemoryQueue;
pub use redis_list::{connect, RedisListQueue};
pub use timeout::{DEFAULT_COMMAND_TIMEOUT, MIN_COMMAND_TIMEOUT};

/// One serialized record as stored on the queue.
pub type QueueEntry = Vec<u8>;

#[async_trait]
pub trait DurableQueue: Send + Sync {
    /// Append one entry at the tail. Once this returns `Ok` the entry is
    /// durable.
    async fn enqueue(&self, entry: &[u8]) -> Result<(), QueueError>;

    /// Append several entries at the tail, in order, as a single command.
    async fn enqueue_many(&self, entries: &[QueueEntry]) -> Result<(), QueueError>;

    /// Atomically remove up to `max_count` entries from the head, oldest
    /// first. Returns an empty vector when the queue is empty. No entry is
    /// ever handed to two callers.
    async fn dequeue_batch(&self, max_count: usize) -> Result<Vec<QueueEntry>, QueueError>;

    /// Number of entries currently waiting.
    async fn depth(&self) -> Result<usize, QueueError>;
}
