use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::{
    reminder::{Reminder, ReminderId, ReminderStatus, StatusTransition},
    user::{User, UserId},
};

use super::{NewReminder, NewUser, ReminderStorage, UserStorage};

#[derive(Debug, Error)]
pub enum InMemoryStorageError {
    #[error("reminder {0} does not exist")]
    ReminderMissing(ReminderId),
    #[error("reminder {id} cannot move from {from} back to {to}")]
    BackwardTransition {
        id: ReminderId,
        from: ReminderStatus,
        to: ReminderStatus,
    },
}

pub struct InMemoryReminderStorage {
    store: RwLock<(ReminderId, HashMap<ReminderId, Reminder>)>,
}

impl InMemoryReminderStorage {
    pub fn new() -> Self {
        InMemoryReminderStorage {
            store: RwLock::new((0, HashMap::new())),
        }
    }
}

impl Default for InMemoryReminderStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReminderStorage for InMemoryReminderStorage {
    type Error = InMemoryStorageError;

    async fn create(&self, reminder: NewReminder) -> Result<Reminder, Self::Error> {
        let mut store = self.store.write().await;
        store.0 += 1;
        let id = store.0;

        let now = Utc::now();
        let created = Reminder {
            id,
            user_id: reminder.user_id,
            title: reminder.title,
            description: reminder.description,
            time: reminder.time,
            status: ReminderStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        store.1.insert(id, created.clone());

        Ok(created)
    }

    async fn get(&self, id: ReminderId) -> Result<Option<Reminder>, Self::Error> {
        let store = self.store.read().await;
        Ok(store.1.get(&id).cloned())
    }

    async fn update_status(
        &self,
        id: ReminderId,
        status: ReminderStatus,
    ) -> Result<(), Self::Error> {
        let mut store = self.store.write().await;
        let reminder = store
            .1
            .get_mut(&id)
            .ok_or(InMemoryStorageError::ReminderMissing(id))?;

        match reminder.status.transition_to(status) {
            StatusTransition::Noop => Ok(()),
            StatusTransition::Rejected => Err(InMemoryStorageError::BackwardTransition {
                id,
                from: reminder.status,
                to: status,
            }),
            StatusTransition::Apply => {
                reminder.status = status;
                reminder.updated_at = Utc::now();
                Ok(())
            }
        }
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Reminder>, Self::Error> {
        let store = self.store.read().await;
        let mut reminders: Vec<_> = store
            .1
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        reminders.sort_by_key(|r| r.time);

        Ok(reminders)
    }

    async fn list_pending(&self) -> Result<Vec<Reminder>, Self::Error> {
        let store = self.store.read().await;
        let mut reminders: Vec<_> = store
            .1
            .values()
            .filter(|r| r.status == ReminderStatus::Pending)
            .cloned()
            .collect();
        reminders.sort_by_key(|r| r.time);

        Ok(reminders)
    }
}

pub struct InMemoryUserStorage {
    store: RwLock<(UserId, HashMap<UserId, User>)>,
}

impl InMemoryUserStorage {
    pub fn new() -> Self {
        InMemoryUserStorage {
            store: RwLock::new((0, HashMap::new())),
        }
    }
}

impl Default for InMemoryUserStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStorage for InMemoryUserStorage {
    type Error = InMemoryStorageError;

    async fn create(&self, user: NewUser) -> Result<User, Self::Error> {
        let mut store = self.store.write().await;
        store.0 += 1;
        let id = store.0;

        let created = User {
            id,
            email: user.email,
        };
        store.1.insert(id, created.clone());

        Ok(created)
    }

    async fn get(&self, id: UserId) -> Result<Option<User>, Self::Error> {
        let store = self.store.read().await;
        Ok(store.1.get(&id).cloned())
    }
}
