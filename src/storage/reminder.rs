use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{
    reminder::{Reminder, ReminderId, ReminderStatus},
    user::UserId,
};

pub struct NewReminder {
    pub user_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub time: DateTime<Utc>,
}

#[async_trait]
pub trait ReminderStorage: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn create(&self, reminder: NewReminder) -> Result<Reminder, Self::Error>;
    async fn get(&self, id: ReminderId) -> Result<Option<Reminder>, Self::Error>;
    async fn update_status(
        &self,
        id: ReminderId,
        status: ReminderStatus,
    ) -> Result<(), Self::Error>;
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Reminder>, Self::Error>;
    async fn list_pending(&self) -> Result<Vec<Reminder>, Self::Error>;
}
