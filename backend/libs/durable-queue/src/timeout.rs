use redis::RedisError;
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use crate::error::QueueError;

pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_millis(3_000);
pub const MIN_COMMAND_TIMEOUT: Duration = Duration::from_millis(500);

pub(crate) fn clamp_command_timeout(requested: Duration) -> Duration {
    requested.max(MIN_COMMAND_TIMEOUT)
}

pub(crate) async fn run_with_timeout<F, T>(limit: Duration, future: F) -> Result<T, QueueError>
where
    F: Future<Output = Result<T, RedisError>>,
{
    match timeout(limit, future).await {
        Ok(res) => res.map_err(QueueError::from),
        Err(_) => Err(QueueError::Timeout(limit)),
    }
}
