use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use click_tracker::{ingest, logging, AppState, Config};
use durable_queue::{DurableQueue, RedisListQueue};
use std::sync::Arc;

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init("info,actix_web=info,click_tracker=debug,durable_queue=debug");

    tracing::info!("Starting click-tracker");

    let config = Config::from_env().context("Failed to load configuration")?;

    let conn = durable_queue::connect(&config.queue.redis_url)
        .await
        .context("Failed to connect to Redis")?;
    let queue: Arc<dyn DurableQueue> = Arc::new(
        RedisListQueue::new(conn, config.queue.key.clone())
            .with_command_timeout(config.queue.command_timeout()),
    );
    tracing::info!("Queueing clicks on Redis list {}", config.queue.key);

    let state = web::Data::new(AppState::new(queue));

    tracing::info!(
        "Starting HTTP server on {}:{}",
        config.app.host,
        config.app.http_port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(tracing_actix_web::TracingLogger::default())
            .app_data(state.clone())
            .configure(ingest::configure)
    })
    .bind((config.app.host.as_str(), config.app.http_port))
    .context("Failed to bind HTTP server")?
    .run()
    .await
    .context("HTTP server error")
}
