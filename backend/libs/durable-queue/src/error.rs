use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("queue command timed out after {0:?}")]
    Timeout(Duration),

    #[error("queue unavailable: {0}")]
    Unavailable(String),
}
