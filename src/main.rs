use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio_util::sync::CancellationToken;

use studybell::appsettings;
use studybell::notify::{LogNotificationSender, NotificationSender};
use studybell::queue::{JobQueue, QueueConfig, SqliteJobQueue};
use studybell::recovery;
use studybell::storage::sqlite::{SqliteReminderStorage, SqliteUserStorage};
use studybell::worker::ReminderWorker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init_timed();

    let settings = appsettings::get();

    let options = SqliteConnectOptions::from_str(&settings.database.url)
        .context("Invalid database url")?
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .context("Failed to open the reminder database")?;
    sqlx::migrate!().run(&pool).await?;

    let reminders = Arc::new(SqliteReminderStorage::new(pool.clone()));
    let users = Arc::new(SqliteUserStorage::new(pool.clone()));
    let queue: Arc<dyn JobQueue> = Arc::new(SqliteJobQueue::new(
        pool.clone(),
        QueueConfig::from(&settings.queue),
    ));

    let restored = recovery::reschedule_pending(reminders.as_ref(), queue.as_ref()).await?;
    if restored > 0 {
        log::info!("Restored {} delivery jobs on startup.", restored);
    }

    let notifier: Arc<dyn NotificationSender> = match settings.notifier.mode.as_str() {
        "log" => Arc::new(LogNotificationSender),
        other => anyhow::bail!("unknown notifier mode: {other}"),
    };

    let worker = ReminderWorker::new(reminders, users, Arc::clone(&queue), notifier);
    let shutdown = CancellationToken::new();
    let worker_handle = tokio::spawn(worker.run(shutdown.child_token()));

    tokio::signal::ctrl_c().await?;
    log::info!("Shutting down.");
    shutdown.cancel();
    worker_handle.await?;

    Ok(())
}
