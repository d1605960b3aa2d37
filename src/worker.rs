use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::models::{
    reminder::{ReminderId, ReminderStatus},
    user::UserId,
};
use crate::notify::NotificationSender;
use crate::queue::{JobQueue, RetryDecision, ScheduledJob};
use crate::storage::{ReminderStorage, UserStorage};

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("reminder {0} does not exist")]
    ReminderNotFound(ReminderId),

    #[error("user {user_id} owning reminder {reminder_id} does not exist")]
    UserNotFound {
        reminder_id: ReminderId,
        user_id: UserId,
    },

    #[error("notification delivery failed: {0}")]
    Delivery(String),

    #[error("reminder storage failed: {0}")]
    Storage(anyhow::Error),
}

impl WorkerError {
    // A job pointing at a missing record cannot be fixed by another attempt.
    fn is_fatal(&self) -> bool {
        matches!(
            self,
            WorkerError::ReminderNotFound(_) | WorkerError::UserNotFound { .. }
        )
    }
}

/// Background consumer: pulls due jobs, sends the notification and reconciles
/// reminder status. The email is attempted before the status is persisted, so
/// a crash in between causes a duplicate send on redelivery, never a `SENT`
/// status without a send attempt.
pub struct ReminderWorker<R, U> {
    reminders: Arc<R>,
    users: Arc<U>,
    queue: Arc<dyn JobQueue>,
    notifier: Arc<dyn NotificationSender>,
}

impl<R, U> ReminderWorker<R, U>
where
    R: ReminderStorage,
    U: UserStorage,
{
    pub fn new(
        reminders: Arc<R>,
        users: Arc<U>,
        queue: Arc<dyn JobQueue>,
        notifier: Arc<dyn NotificationSender>,
    ) -> Self {
        Self {
            reminders,
            users,
            queue,
            notifier,
        }
    }

    pub async fn run(self, cancellation_token: CancellationToken) {
        log::info!("Reminder worker is ready and waiting for due jobs.");
        loop {
            let job = tokio::select! {
                _ = cancellation_token.cancelled() => break,
                job = self.queue.next_due() => job,
            };

            match job {
                Ok(job) => self.process(job).await,
                Err(err) => {
                    log::error!("Failed to pull a due job: {err}");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
        log::info!("Reminder worker stopped.");
    }

    async fn process(&self, job: ScheduledJob) {
        match self.handle(&job).await {
            Ok(()) => {
                if let Err(err) = self.queue.complete(&job).await {
                    log::error!(
                        "Failed to remove a completed job. [job_id = {}] {err}",
                        job.id
                    );
                }
            }
            Err(err) if err.is_fatal() => {
                log::error!(
                    "Dropping job for a missing record. [job_id = {}, reminder_id = {}] {err}",
                    job.id,
                    job.reminder_id
                );
                if let Err(err) = self.queue.discard(&job).await {
                    log::error!("Failed to discard a dead job. [job_id = {}] {err}", job.id);
                }
            }
            Err(err) => {
                log::error!(
                    "Failed to deliver reminder. [job_id = {}, reminder_id = {}, attempt = {}] {err}",
                    job.id,
                    job.reminder_id,
                    job.attempts
                );
                self.mark_failed(job.reminder_id).await;
                match self.queue.retry(&job).await {
                    Ok(RetryDecision::Retried { next_fire_at }) => log::info!(
                        "Delivery will be retried. [reminder_id = {}, next_fire_at = {}]",
                        job.reminder_id,
                        next_fire_at
                    ),
                    Ok(RetryDecision::Discarded) => {}
                    Err(err) => log::error!(
                        "Failed to hand the job back for retry. [job_id = {}] {err}",
                        job.id
                    ),
                }
            }
        }
    }

    async fn handle(&self, job: &ScheduledJob) -> Result<(), WorkerError> {
        let reminder = self
            .reminders
            .get(job.reminder_id)
            .await
            .map_err(|e| WorkerError::Storage(e.into()))?
            .ok_or(WorkerError::ReminderNotFound(job.reminder_id))?;

        let user = self
            .users
            .get(reminder.user_id)
            .await
            .map_err(|e| WorkerError::Storage(e.into()))?
            .ok_or(WorkerError::UserNotFound {
                reminder_id: reminder.id,
                user_id: reminder.user_id,
            })?;

        let outcome = self.notifier.send(&user.email, &reminder.title).await;
        if !outcome.success {
            return Err(WorkerError::Delivery(outcome.message));
        }
        log::info!(
            "Reminder notification sent. [reminder_id = {}, recipient = {}]",
            reminder.id,
            user.email
        );

        self.reminders
            .update_status(reminder.id, ReminderStatus::Sent)
            .await
            .map_err(|e| WorkerError::Storage(e.into()))?;

        Ok(())
    }

    async fn mark_failed(&self, reminder_id: ReminderId) {
        if let Err(err) = self
            .reminders
            .update_status(reminder_id, ReminderStatus::Failed)
            .await
        {
            log::error!(
                "Failed to record a delivery failure. [reminder_id = {}] {err}",
                reminder_id
            );
        }
    }
}
