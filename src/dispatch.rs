use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;

use crate::models::{
    reminder::{Reminder, ReminderStatus},
    user::UserId,
};
use crate::queue::{JobQueue, QueueError};
use crate::storage::{NewReminder, ReminderStorage};

pub const LEAD_TIME_MINUTES: i64 = 10;

#[derive(Debug)]
pub struct ScheduleRequest {
    pub user_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub time: String,
}

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("{0}")]
    Validation(String),

    #[error("reminder time already passed")]
    TimeAlreadyPassed,

    #[error("failed to schedule reminder delivery: {0}")]
    Infrastructure(QueueError),

    #[error("reminder storage failed: {0}")]
    Storage(anyhow::Error),
}

pub fn compute_fire_at(time: DateTime<Utc>) -> DateTime<Utc> {
    time - TimeDelta::minutes(LEAD_TIME_MINUTES)
}

/// Request-path producer: validates the request, persists the reminder and
/// hands the delivery job to the queue. Runs inside the request handler; the
/// queue and the store are the only collaborators it shares with the worker.
pub struct ReminderDispatcher<S> {
    reminders: Arc<S>,
    queue: Arc<dyn JobQueue>,
}

impl<S: ReminderStorage> ReminderDispatcher<S> {
    pub fn new(reminders: Arc<S>, queue: Arc<dyn JobQueue>) -> Self {
        Self { reminders, queue }
    }

    // Validate-before-persist: a fire time that is not in the future is
    // rejected before anything is written, so no orphan row exists.
    pub async fn schedule(&self, request: ScheduleRequest) -> Result<Reminder, ScheduleError> {
        let title = request.title.trim();
        if title.is_empty() {
            return Err(ScheduleError::Validation(
                "Title and time are required".to_string(),
            ));
        }
        let time = parse_time(&request.time)?;

        let fire_at = compute_fire_at(time);
        if fire_at <= Utc::now() {
            log::warn!(
                "Rejecting reminder whose send window already passed. [user_id = {}, time = {}]",
                request.user_id,
                time
            );
            return Err(ScheduleError::TimeAlreadyPassed);
        }

        let reminder = self
            .reminders
            .create(NewReminder {
                user_id: request.user_id,
                title: title.to_string(),
                description: request.description,
                time,
            })
            .await
            .map_err(|e| ScheduleError::Storage(e.into()))?;

        if let Err(err) = self.queue.enqueue(reminder.id, fire_at).await {
            log::error!(
                "Failed to enqueue delivery job, marking the reminder failed. [reminder_id = {}] {err}",
                reminder.id
            );
            self.reminders
                .update_status(reminder.id, ReminderStatus::Failed)
                .await
                .map_err(|e| ScheduleError::Storage(e.into()))?;
            return Err(ScheduleError::Infrastructure(err));
        }

        log::info!(
            "Reminder scheduled. [reminder_id = {}, fire_at = {}]",
            reminder.id,
            fire_at
        );

        Ok(reminder)
    }

    pub async fn list_reminders(&self, user_id: UserId) -> Result<Vec<Reminder>, ScheduleError> {
        self.reminders
            .list_by_user(user_id)
            .await
            .map_err(|e| ScheduleError::Storage(e.into()))
    }
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, ScheduleError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ScheduleError::Validation(format!("time is not a valid timestamp: {e}")))
}
