use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use sqlx::SqlitePool;
use tokio::sync::Notify;

use super::{JobQueue, QueueConfig, QueueError, RetryDecision, ScheduledJob};
use crate::models::reminder::ReminderId;

const MAX_RETRY_BACKOFF: Duration = Duration::from_secs(300);

#[derive(sqlx::FromRow)]
struct JobRow {
    id: i64,
    reminder_id: i64,
    fire_at: DateTime<Utc>,
    attempts: i64,
}

/// Durable delayed queue over the shared `jobs` table. Timing lives in the
/// process (sleep until the earliest fire time, recomputed whenever a new job
/// arrives); the table is the source of truth, so undelivered jobs survive a
/// restart. Rows written by another process are noticed within one poll
/// interval.
pub struct SqliteJobQueue {
    pool: SqlitePool,
    config: QueueConfig,
    enqueued: Notify,
}

impl SqliteJobQueue {
    pub fn new(pool: SqlitePool, config: QueueConfig) -> Self {
        Self {
            pool,
            config,
            enqueued: Notify::new(),
        }
    }

    async fn earliest(&self) -> Result<Option<JobRow>, sqlx::Error> {
        sqlx::query_as::<_, JobRow>(
            "SELECT id, reminder_id, fire_at, attempts FROM jobs ORDER BY fire_at ASC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
    }

    async fn deliver(&self, row: JobRow) -> Result<ScheduledJob, QueueError> {
        let attempts = row.attempts + 1;
        sqlx::query("UPDATE jobs SET attempts = ? WHERE id = ?")
            .bind(attempts)
            .bind(row.id)
            .execute(&self.pool)
            .await?;

        Ok(ScheduledJob {
            id: row.id,
            reminder_id: row.reminder_id,
            fire_at: row.fire_at,
            attempts: attempts as u32,
        })
    }

    async fn remove(&self, job: &ScheduledJob) -> Result<(), QueueError> {
        sqlx::query("DELETE FROM jobs WHERE id = ?")
            .bind(job.id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl JobQueue for SqliteJobQueue {
    async fn enqueue(
        &self,
        reminder_id: ReminderId,
        fire_at: DateTime<Utc>,
    ) -> Result<ScheduledJob, QueueError> {
        let result = sqlx::query_as::<_, JobRow>(
            "INSERT INTO jobs (reminder_id, fire_at, attempts)
             VALUES (?, ?, 0)
             RETURNING id, reminder_id, fire_at, attempts",
        )
        .bind(reminder_id)
        .bind(fire_at)
        .fetch_one(&self.pool)
        .await;

        let row = match result {
            Ok(row) => row,
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(QueueError::AlreadyScheduled(reminder_id));
            }
            Err(e) => return Err(e.into()),
        };

        log::debug!(
            "Scheduled delivery job. [reminder_id = {}, fire_at = {}]",
            reminder_id,
            fire_at
        );
        self.enqueued.notify_one();

        Ok(row.into_job())
    }

    async fn next_due(&self) -> Result<ScheduledJob, QueueError> {
        loop {
            // Register interest before reading the table so an enqueue racing
            // with the query is not missed.
            let wakeup = self.enqueued.notified();

            let Some(row) = self.earliest().await? else {
                wakeup.await;
                continue;
            };

            let delay = (row.fire_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
            if delay > Duration::ZERO {
                let wait = delay.min(self.config.poll_interval);
                tokio::select! {
                    _ = tokio::time::sleep(wait) => {
                        if wait < delay {
                            continue;
                        }
                    }
                    _ = wakeup => continue,
                }
            }

            return self.deliver(row).await;
        }
    }

    async fn complete(&self, job: &ScheduledJob) -> Result<(), QueueError> {
        self.remove(job).await?;
        log::debug!(
            "Delivery job completed. [job_id = {}, reminder_id = {}]",
            job.id,
            job.reminder_id
        );

        Ok(())
    }

    async fn retry(&self, job: &ScheduledJob) -> Result<RetryDecision, QueueError> {
        if job.attempts >= self.config.max_attempts {
            self.remove(job).await?;
            log::warn!(
                "Delivery job exhausted its attempts and was dropped. [job_id = {}, reminder_id = {}, attempts = {}]",
                job.id,
                job.reminder_id,
                job.attempts
            );
            return Ok(RetryDecision::Discarded);
        }

        let backoff = backoff_delay(job.attempts, self.config.retry_backoff);
        let next_fire_at = Utc::now()
            + TimeDelta::from_std(backoff).expect("Backoff is capped well below the chrono range.");
        sqlx::query("UPDATE jobs SET fire_at = ? WHERE id = ?")
            .bind(next_fire_at)
            .bind(job.id)
            .execute(&self.pool)
            .await?;
        self.enqueued.notify_one();

        Ok(RetryDecision::Retried { next_fire_at })
    }

    async fn discard(&self, job: &ScheduledJob) -> Result<(), QueueError> {
        self.remove(job).await?;
        log::warn!(
            "Delivery job discarded. [job_id = {}, reminder_id = {}]",
            job.id,
            job.reminder_id
        );

        Ok(())
    }

    async fn is_scheduled(&self, reminder_id: ReminderId) -> Result<bool, QueueError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM jobs WHERE reminder_id = ?")
            .bind(reminder_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }
}

impl JobRow {
    fn into_job(self) -> ScheduledJob {
        ScheduledJob {
            id: self.id,
            reminder_id: self.reminder_id,
            fire_at: self.fire_at,
            attempts: self.attempts as u32,
        }
    }
}

fn backoff_delay(attempt: u32, base: Duration) -> Duration {
    let shift = attempt.saturating_sub(1).min(16);
    base.checked_mul(1 << shift)
        .unwrap_or(MAX_RETRY_BACKOFF)
        .min(MAX_RETRY_BACKOFF)
}
