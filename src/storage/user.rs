use async_trait::async_trait;

use crate::models::user::{User, UserId};

pub struct NewUser {
    pub email: String,
}

#[async_trait]
pub trait UserStorage: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn create(&self, user: NewUser) -> Result<User, Self::Error>;
    async fn get(&self, id: UserId) -> Result<Option<User>, Self::Error>;
}
