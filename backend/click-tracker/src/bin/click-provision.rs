//! Create the ClickHouse database and clicks table. Safe to run repeatedly.

use anyhow::{Context, Result};
use click_tracker::{logging, ClickHouseSink, Config};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init("info,click_tracker=debug");

    let config = Config::from_env().context("Failed to load configuration")?;
    let sink = ClickHouseSink::new(&config.sink);

    sink.health_check()
        .await
        .context("ClickHouse is not reachable")?;
    sink.ensure_schema()
        .await
        .context("Failed to provision ClickHouse schema")?;

    tracing::info!("Schema ready: {}", config.sink.qualified_table());
    Ok(())
}
