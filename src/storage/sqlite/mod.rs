pub mod reminder_storage;
pub mod user_storage;

pub use reminder_storage::SqliteReminderStorage;
pub use user_storage::SqliteUserStorage;
