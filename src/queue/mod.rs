pub mod sqlite;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::reminder::ReminderId;

pub use sqlite::SqliteJobQueue;

pub type JobId = i64;

/// A delivery job waiting for its fire time. The queue keeps only the weak
/// back-reference to the reminder; the reminder record stays in the store.
#[derive(Debug, Clone)]
pub struct ScheduledJob {
    pub id: JobId,
    pub reminder_id: ReminderId,
    pub fire_at: DateTime<Utc>,
    pub attempts: u32,
}

#[derive(Debug, Error)]
pub enum QueueError {
    #[error(transparent)]
    Storage(#[from] sqlx::Error),

    #[error("queue backend unavailable: {0}")]
    Unavailable(String),

    #[error("reminder {0} already has a scheduled job")]
    AlreadyScheduled(ReminderId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retried { next_fire_at: DateTime<Utc> },
    Discarded,
}

#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub poll_interval: Duration,
    pub max_attempts: u32,
    pub retry_backoff: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            max_attempts: 3,
            retry_backoff: Duration::from_secs(30),
        }
    }
}

/// Delayed job queue with at-least-once delivery. Jobs become visible to
/// consumers in non-decreasing `fire_at` order once their fire time has
/// elapsed; a job taken with `next_due` stays in the backing store until it is
/// completed or discarded, so a consumer crash causes redelivery rather than
/// loss.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue errors propagate synchronously to the caller; nothing is
    /// retried internally.
    async fn enqueue(
        &self,
        reminder_id: ReminderId,
        fire_at: DateTime<Utc>,
    ) -> Result<ScheduledJob, QueueError>;

    /// Suspends until the earliest job is due, waking early when a job with an
    /// earlier fire time is enqueued. Each delivery bumps the attempt count.
    async fn next_due(&self) -> Result<ScheduledJob, QueueError>;

    async fn complete(&self, job: &ScheduledJob) -> Result<(), QueueError>;

    /// Queue-owned retry policy: back off and redeliver until the attempt
    /// budget is exhausted, then drop the job.
    async fn retry(&self, job: &ScheduledJob) -> Result<RetryDecision, QueueError>;

    /// Remove a job without retrying, for errors no retry can fix.
    async fn discard(&self, job: &ScheduledJob) -> Result<(), QueueError>;

    async fn is_scheduled(&self, reminder_id: ReminderId) -> Result<bool, QueueError>;
}
