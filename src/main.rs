use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal::unix::{signal, SignalKind};
use tokio::{select, time};

mod api;
mod config;
mod database;
mod global;
mod http;
mod logging;
mod pagination;
mod slug;

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::AppConfig::parse()?;
    logging::init(&config.logging.level, config.logging.mode).context("failed to init logging")?;

    let db = sqlx::PgPool::connect(&config.database.uri)
        .await
        .context("failed to connect to database")?;

    let global = Arc::new(global::GlobalState::new(config, db));

    tracing::info!(name = %global.config.name, "starting");

    let mut api_handle = tokio::spawn(api::run(global.clone()));

    // Listen on both sigint and sigterm and begin the shutdown when either
    // arrives
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    select! {
        r = &mut api_handle => {
            tracing::error!("api stopped unexpectedly: {:?}", r);
            return Ok(());
        },
        _ = sigint.recv() => tracing::info!("shutting down"),
        _ = sigterm.recv() => tracing::info!("shutting down"),
    }

    global.shutdown.cancel();

    select! {
        _ = time::sleep(Duration::from_secs(60)) => tracing::warn!("force shutting down"),
        r = &mut api_handle => {
            if let Err(err) = r {
                tracing::error!("api task failed during shutdown: {:?}", err);
            }
        },
    }

    tracing::info!("stopped");

    Ok(())
}
