use chrono::Utc;
use uuid::Uuid;

use crate::{
    db::{encode_timestamp, DbPool},
    error::{AppError, Result},
    models::user::{NewUser, User},
    services::auth_service::hash_password_blocking,
};

/// User store for database operations
#[derive(Clone)]
pub struct UserStore {
    pool: DbPool,
}

impl UserStore {
    /// Create a new UserStore with the provided database pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a user by ID
    pub async fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(user)
    }

    /// Get a user by login name
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(user)
    }

    pub async fn count_users(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(count.0)
    }

    /// Create a user, hashing the plain-text password
    pub async fn create_user(&self, user: NewUser) -> Result<User> {
        let id = Uuid::new_v4().to_string();
        let password_hash = hash_password_blocking(user.password.clone()).await?;

        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, full_name, role, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&password_hash)
        .bind(&user.full_name)
        .bind(user.role)
        .bind(encode_timestamp(&Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        self.get_user_by_id(&id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("user {id} vanished after insert")))
    }
}
