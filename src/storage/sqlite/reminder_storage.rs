mod model;

use async_trait::async_trait;
use chrono::Utc;
use model::ReminderRow;
use thiserror::Error;

use crate::models::{
    reminder::{Reminder, ReminderId, ReminderStatus, StatusTransition},
    user::UserId,
};
use crate::storage::{NewReminder, ReminderStorage};

#[derive(Debug, Error)]
pub enum SqliteReminderError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("reminder {0} does not exist")]
    Missing(ReminderId),

    #[error("reminder {id} cannot move from {from} back to {to}")]
    BackwardTransition {
        id: ReminderId,
        from: ReminderStatus,
        to: ReminderStatus,
    },
}

pub struct SqliteReminderStorage {
    pool: sqlx::SqlitePool,
}

impl SqliteReminderStorage {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReminderStorage for SqliteReminderStorage {
    type Error = SqliteReminderError;

    async fn create(&self, reminder: NewReminder) -> Result<Reminder, Self::Error> {
        let NewReminder {
            user_id,
            title,
            description,
            time,
        } = reminder;
        let now = Utc::now();

        let row = sqlx::query_as::<_, ReminderRow>(
            "INSERT INTO reminders (user_id, title, description, time, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(user_id)
        .bind(title)
        .bind(description)
        .bind(time)
        .bind(ReminderStatus::Pending.as_str())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get(&self, id: ReminderId) -> Result<Option<Reminder>, Self::Error> {
        let row = sqlx::query_as::<_, ReminderRow>("SELECT * FROM reminders WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    async fn update_status(
        &self,
        id: ReminderId,
        status: ReminderStatus,
    ) -> Result<(), Self::Error> {
        let current = self
            .get(id)
            .await?
            .ok_or(SqliteReminderError::Missing(id))?;

        match current.status.transition_to(status) {
            StatusTransition::Noop => Ok(()),
            StatusTransition::Rejected => Err(SqliteReminderError::BackwardTransition {
                id,
                from: current.status,
                to: status,
            }),
            StatusTransition::Apply => {
                sqlx::query("UPDATE reminders SET status = ?, updated_at = ? WHERE id = ?")
                    .bind(status.as_str())
                    .bind(Utc::now())
                    .bind(id)
                    .execute(&self.pool)
                    .await?;

                Ok(())
            }
        }
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Reminder>, Self::Error> {
        let rows = sqlx::query_as::<_, ReminderRow>(
            "SELECT * FROM reminders WHERE user_id = ? ORDER BY time ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_pending(&self) -> Result<Vec<Reminder>, Self::Error> {
        let rows = sqlx::query_as::<_, ReminderRow>(
            "SELECT * FROM reminders WHERE status = ? ORDER BY time ASC",
        )
        .bind(ReminderStatus::Pending.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;
    use crate::storage::{NewUser, UserStorage, sqlite::SqliteUserStorage};
    use crate::test_support::sqlite_pool;

    #[tokio::test]
    async fn created_reminders_start_pending_and_round_trip() {
        let pool = sqlite_pool().await;
        let user = SqliteUserStorage::new(pool.clone())
            .create(NewUser {
                email: "student@example.com".to_string(),
            })
            .await
            .unwrap();
        let storage = SqliteReminderStorage::new(pool);

        let time = Utc::now() + TimeDelta::minutes(45);
        let created = storage
            .create(NewReminder {
                user_id: user.id,
                title: "Algorithms revision".to_string(),
                description: Some("chapter 12".to_string()),
                time,
            })
            .await
            .unwrap();

        assert_eq!(created.status, ReminderStatus::Pending);

        let stored = storage.get(created.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Algorithms revision");
        assert_eq!(stored.description.as_deref(), Some("chapter 12"));
        assert_eq!(stored.time, time);
        assert_eq!(stored.user_id, user.id);
    }

    #[tokio::test]
    async fn marking_sent_twice_in_a_row_is_a_noop() {
        let (storage, reminder) = stored_reminder().await;

        storage
            .update_status(reminder.id, ReminderStatus::Sent)
            .await
            .unwrap();
        storage
            .update_status(reminder.id, ReminderStatus::Sent)
            .await
            .unwrap();

        let stored = storage.get(reminder.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ReminderStatus::Sent);
        assert!(stored.updated_at >= stored.created_at);
    }

    #[tokio::test]
    async fn a_recorded_send_is_not_clobbered_by_a_late_failure() {
        let (storage, reminder) = stored_reminder().await;

        storage
            .update_status(reminder.id, ReminderStatus::Sent)
            .await
            .unwrap();
        storage
            .update_status(reminder.id, ReminderStatus::Failed)
            .await
            .unwrap();

        let stored = storage.get(reminder.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ReminderStatus::Sent);
    }

    #[tokio::test]
    async fn a_failed_reminder_becomes_sent_after_a_successful_retry() {
        let (storage, reminder) = stored_reminder().await;

        storage
            .update_status(reminder.id, ReminderStatus::Failed)
            .await
            .unwrap();
        storage
            .update_status(reminder.id, ReminderStatus::Sent)
            .await
            .unwrap();

        let stored = storage.get(reminder.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ReminderStatus::Sent);
    }

    #[tokio::test]
    async fn updating_a_missing_reminder_fails() {
        let pool = sqlite_pool().await;
        let storage = SqliteReminderStorage::new(pool);

        let result = storage.update_status(42, ReminderStatus::Sent).await;

        assert!(matches!(result, Err(SqliteReminderError::Missing(42))));
    }

    #[tokio::test]
    async fn pending_reminders_are_listed_without_terminal_ones() {
        let (storage, first) = stored_reminder().await;
        let second = storage
            .create(NewReminder {
                user_id: first.user_id,
                title: "Second block".to_string(),
                description: None,
                time: Utc::now() + TimeDelta::minutes(90),
            })
            .await
            .unwrap();

        storage
            .update_status(first.id, ReminderStatus::Sent)
            .await
            .unwrap();

        let pending = storage.list_pending().await.unwrap();
        let ids: Vec<_> = pending.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![second.id]);
    }

    async fn stored_reminder() -> (SqliteReminderStorage, Reminder) {
        let pool = sqlite_pool().await;
        let user = SqliteUserStorage::new(pool.clone())
            .create(NewUser {
                email: "student@example.com".to_string(),
            })
            .await
            .unwrap();
        let storage = SqliteReminderStorage::new(pool);
        let reminder = storage
            .create(NewReminder {
                user_id: user.id,
                title: "Study session".to_string(),
                description: None,
                time: Utc::now() + TimeDelta::minutes(30),
            })
            .await
            .unwrap();

        (storage, reminder)
    }
}
