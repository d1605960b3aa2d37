mod memory;
mod reminder;
pub mod sqlite;
mod user;

pub use memory::{InMemoryReminderStorage, InMemoryStorageError, InMemoryUserStorage};
pub use reminder::{NewReminder, ReminderStorage};
pub use user::{NewUser, UserStorage};
