use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::user::UserId;

pub type ReminderId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReminderStatus {
    Pending,
    Sent,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTransition {
    Apply,
    Noop,
    Rejected,
}

impl ReminderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderStatus::Pending => "PENDING",
            ReminderStatus::Sent => "SENT",
            ReminderStatus::Failed => "FAILED",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "PENDING" => Some(ReminderStatus::Pending),
            "SENT" => Some(ReminderStatus::Sent),
            "FAILED" => Some(ReminderStatus::Failed),
            _ => None,
        }
    }

    // Status moves forward only: a reminder never returns to Pending, and a
    // recorded send is never overwritten. A Failed attempt may still become
    // Sent when the queue redelivers and the send succeeds.
    pub fn transition_to(self, next: ReminderStatus) -> StatusTransition {
        use ReminderStatus::*;

        match (self, next) {
            (Pending, Pending) | (Sent, Sent) | (Failed, Failed) => StatusTransition::Noop,
            (Pending, Sent) | (Pending, Failed) | (Failed, Sent) => StatusTransition::Apply,
            (Sent, Failed) => StatusTransition::Noop,
            (Sent, Pending) | (Failed, Pending) => StatusTransition::Rejected,
        }
    }
}

impl fmt::Display for ReminderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Reminder {
    pub id: ReminderId,
    pub user_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub time: DateTime<Utc>,
    pub status: ReminderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
