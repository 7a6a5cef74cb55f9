use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use crate::error::QueueError;
use crate::{DurableQueue, QueueEntry};

/// In-process queue with the same contract as [`crate::RedisListQueue`].
///
/// Nothing survives a restart. [`MemoryQueue::set_unavailable`] makes every
/// operation fail, which is how tests simulate a backend outage.
#[derive(Debug, Default)]
pub struct MemoryQueue {
    entries: Mutex<VecDeque<QueueEntry>>,
    unavailable: AtomicBool,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = QueueEntry>,
    {
        Self {
            entries: Mutex::new(entries.into_iter().collect()),
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Copy of the current contents, head first.
    pub async fn snapshot(&self) -> Vec<QueueEntry> {
        self.entries.lock().await.iter().cloned().collect()
    }

    fn check_available(&self) -> Result<(), QueueError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(QueueError::Unavailable(
                "memory queue marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl DurableQueue for MemoryQueue {
    async fn enqueue(&self, entry: &[u8]) -> Result<(), QueueError> {
        self.check_available()?;
        self.entries.lock().await.push_back(entry.to_vec());
        Ok(())
    }

    async fn enqueue_many(&self, entries: &[QueueEntry]) -> Result<(), QueueError> {
        self.check_available()?;
        self.entries.lock().await.extend(entries.iter().cloned());
        Ok(())
    }

    async fn dequeue_batch(&self, max_count: usize) -> Result<Vec<QueueEntry>, QueueError> {
        self.check_available()?;
        let mut entries = self.entries.lock().await;
        let take = max_count.min(entries.len());
        Ok(entries.drain(..take).collect())
    }

    async fn depth(&self) -> Result<usize, QueueError> {
        self.check_available()?;
        Ok(self.entries.lock().await.len())
    }
}
