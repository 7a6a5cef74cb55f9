#![allow(dead_code)]

use async_trait::async_trait;
use click_event::{ClickAttributes, EventRecord};
use click_tracker::sink::{AnalyticsSink, SinkError};
use durable_queue::{DurableQueue, MemoryQueue, QueueEntry, QueueError};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// Sink double that records every batch and can fail chosen calls.
#[derive(Default)]
pub struct RecordingSink {
    loaded: Mutex<Vec<Vec<EventRecord>>>,
    calls: Mutex<usize>,
    fail_on_calls: HashSet<usize>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the given 1-based call numbers.
    pub fn failing_on(calls: &[usize]) -> Self {
        Self {
            fail_on_calls: calls.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub async fn calls(&self) -> usize {
        *self.calls.lock().await
    }

    pub async fn batch_sizes(&self) -> Vec<usize> {
        self.loaded.lock().await.iter().map(Vec::len).collect()
    }

    pub async fn loaded_records(&self) -> Vec<EventRecord> {
        self.loaded.lock().await.iter().flatten().cloned().collect()
    }
}

#[async_trait]
impl AnalyticsSink for RecordingSink {
    async fn load_batch(&self, records: &[EventRecord]) -> Result<(), SinkError> {
        let call = {
            let mut calls = self.calls.lock().await;
            *calls += 1;
            *calls
        };

        if self.fail_on_calls.contains(&call) {
            return Err(SinkError::Rejected(format!("injected failure on call {}", call)));
        }

        self.loaded.lock().await.push(records.to_vec());
        Ok(())
    }
}

/// Queue double whose `enqueue_many` fails a set number of times before
/// delegating to an inner [`MemoryQueue`].
pub struct FlakyRequeueQueue {
    inner: MemoryQueue,
    failures_left: AtomicUsize,
    requeue_attempts: AtomicUsize,
}

impl FlakyRequeueQueue {
    pub fn new(entries: Vec<QueueEntry>, failures: usize) -> Self {
        Self {
            inner: MemoryQueue::with_entries(entries),
            failures_left: AtomicUsize::new(failures),
            requeue_attempts: AtomicUsize::new(0),
        }
    }

    pub fn requeue_attempts(&self) -> usize {
        self.requeue_attempts.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> Vec<QueueEntry> {
        self.inner.snapshot().await
    }
}

#[async_trait]
impl DurableQueue for FlakyRequeueQueue {
    async fn enqueue(&self, entry: &[u8]) -> Result<(), QueueError> {
        self.inner.enqueue(entry).await
    }

    async fn enqueue_many(&self, entries: &[QueueEntry]) -> Result<(), QueueError> {
        self.requeue_attempts.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(QueueError::Unavailable("injected enqueue failure".to_string()));
        }
        self.inner.enqueue_many(entries).await
    }

    async fn dequeue_batch(&self, max_count: usize) -> Result<Vec<QueueEntry>, QueueError> {
        self.inner.dequeue_batch(max_count).await
    }

    async fn depth(&self) -> Result<usize, QueueError> {
        self.inner.depth().await
    }
}

pub fn synthetic_record(i: usize) -> EventRecord {
    EventRecord::new(
        ClickAttributes::new()
            .with("uniqueId", format!("user-{}", i))
            .with("sub1", format!("campaign-{}", i % 7)),
        format!("10.0.{}.{}", i / 256 % 256, i % 256),
        "synthetic-agent/1.0",
    )
}

pub fn synthetic_entries(count: usize) -> Vec<QueueEntry> {
    (0..count)
        .map(|i| synthetic_record(i).encode().expect("encode synthetic record"))
        .collect()
}

pub fn unique_ids(records: &[EventRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.attributes().unique_id().to_string())
        .collect()
}
