use async_trait::async_trait;
use thiserror::Error;

use crate::models::user::{User, UserId};
use crate::storage::{NewUser, UserStorage};

#[derive(Debug, Error)]
pub enum SqliteUserError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
}

impl From<UserRow> for User {
    fn from(value: UserRow) -> Self {
        Self {
            id: value.id,
            email: value.email,
        }
    }
}

pub struct SqliteUserStorage {
    pool: sqlx::SqlitePool,
}

impl SqliteUserStorage {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStorage for SqliteUserStorage {
    type Error = SqliteUserError;

    async fn create(&self, user: NewUser) -> Result<User, Self::Error> {
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (email) VALUES (?) RETURNING id, email",
        )
        .bind(user.email)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get(&self, id: UserId) -> Result<Option<User>, Self::Error> {
        let row = sqlx::query_as::<_, UserRow>("SELECT id, email FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }
}
