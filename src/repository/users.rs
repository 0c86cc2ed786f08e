//! Users repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::user::{NewUser, User},
};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a new user; a taken username is a conflict
    async fn create(&self, user: NewUser) -> AppResult<User>;

    /// Get user by username
    async fn get_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Get user by ID
    async fn get_by_id(&self, user_id: Uuid) -> AppResult<User>;
}

const USER_COLUMNS: &str = "user_id, username, password_hash, email, role, created_at";

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UsersRepository {
    async fn create(&self, user: NewUser) -> AppResult<User> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (user_id, username, password_hash, email, role, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(user.user_id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.email)
        .bind(user.role)
        .bind(user.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::from_write(e, "username"));

        super::finish(tx, result).await
    }

    async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_by_id(&self, user_id: Uuid) -> AppResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE user_id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", user_id)))
    }
}
