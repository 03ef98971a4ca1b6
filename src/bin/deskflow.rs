//! Deskflow engine process.
//!
//! Loads configuration (`--config`, default `deskflow.toml`, overlaid with
//! `DESKFLOW__*` variables), connects to `PostgreSQL`, and runs the
//! recurrence scheduler and notification dispatcher until interrupted.
//! Apply the SQL files under `migrations/` with the Diesel CLI before the
//! first start.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use deskflow::config::EngineConfig;
use deskflow::lifecycle::{
    adapters::postgres::{EnginePgPool, PostgresWorkItemRepository},
    services::LifecycleService,
};
use deskflow::notification::{
    adapters::postgres::PostgresNotifier,
    services::{NotificationDispatcher, notification_channel},
};
use deskflow::recurrence::{
    adapters::postgres::PostgresRecurrenceRepository, services::RecurrenceScheduler,
};
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use mockable::DefaultClock;
use tokio_util::sync::CancellationToken;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Deskflow work item engine")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "deskflow.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();
    let engine = EngineConfig::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    let pool: EnginePgPool = Pool::builder()
        .max_size(engine.database.pool_size)
        .build(ConnectionManager::<PgConnection>::new(&engine.database.url))
        .context("failed to build database pool")?;

    let clock = Arc::new(DefaultClock);
    let (queue, receiver) = notification_channel(engine.dispatcher.queue_capacity);

    let work_items = Arc::new(
        PostgresWorkItemRepository::new(pool.clone())
            .with_lock_timeout(engine.lifecycle.lock_timeout()),
    );
    let recurrences = Arc::new(
        PostgresRecurrenceRepository::new(pool.clone())
            .with_lock_timeout(engine.lifecycle.lock_timeout()),
    );
    let lifecycle = LifecycleService::new(work_items, Arc::clone(&clock), queue)
        .with_retry_backoff(engine.lifecycle.retry_backoff());
    let scheduler = RecurrenceScheduler::new(
        recurrences,
        lifecycle,
        Arc::clone(&clock),
        engine.scheduler.settings(),
    );
    let dispatcher = NotificationDispatcher::new(
        Arc::new(PostgresNotifier::new(pool)),
        clock,
        engine.dispatcher.settings(),
    );

    let cancel = CancellationToken::new();
    let dispatcher_task = tokio::spawn(dispatcher.run(receiver, cancel.clone()));
    let scheduler_task = tokio::spawn(scheduler.run(cancel.clone()));
    info!("deskflow engine running");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutdown requested");
    cancel.cancel();

    scheduler_task.await.context("scheduler task panicked")?;
    dispatcher_task.await.context("dispatcher task panicked")?;
    info!("deskflow engine stopped");
    Ok(())
}
