//! Export pending clicks from the queue into ClickHouse.
//!
//! Runs a single cycle and exits non-zero if it fails, which suits cron or a
//! Kubernetes CronJob. With `EXPORT_INTERVAL_SECS` set it keeps running and
//! exports on that interval until SIGINT/SIGTERM.

use anyhow::{Context, Result};
use click_tracker::{logging, BatchExporter, ClickHouseSink, Config};
use durable_queue::{DurableQueue, RedisListQueue};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init("info,click_tracker=debug,durable_queue=debug");

    let config = Config::from_env().context("Failed to load configuration")?;

    let conn = durable_queue::connect(&config.queue.redis_url)
        .await
        .context("Failed to connect to Redis")?;
    let queue: Arc<dyn DurableQueue> = Arc::new(
        RedisListQueue::new(conn, config.queue.key.clone())
            .with_command_timeout(config.queue.command_timeout()),
    );

    let pending = queue.depth().await.context("Failed to read queue depth")?;
    tracing::info!(
        "Exporting from {} ({} pending) to {} in batches of {}",
        config.queue.key,
        pending,
        config.sink.qualified_table(),
        config.export.batch_size
    );

    let sink = Arc::new(ClickHouseSink::new(&config.sink));
    let exporter = BatchExporter::new(queue, sink).with_batch_size(config.export.batch_size);

    match config.export.interval() {
        None => {
            exporter
                .run_export_cycle()
                .await
                .context("Export run failed")?;
        }
        Some(interval) => {
            tracing::info!("Running every {:?}", interval);
            exporter.run_every(interval, shutdown_signal()).await;
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
