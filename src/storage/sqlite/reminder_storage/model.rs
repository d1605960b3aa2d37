use chrono::{DateTime, Utc};

use crate::models::reminder::{Reminder, ReminderStatus};

#[derive(sqlx::FromRow)]
pub struct ReminderRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub time: DateTime<Utc>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ReminderRow> for Reminder {
    fn from(value: ReminderRow) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            title: value.title,
            description: value.description,
            time: value.time,
            status: parse_status(&value.status),
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

fn parse_status(status: &str) -> ReminderStatus {
    ReminderStatus::parse(status).unwrap_or_else(|| {
        log::warn!("Unknown reminder status {}, defaulting to PENDING", status);
        ReminderStatus::Pending
    })
}
