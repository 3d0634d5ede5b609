//! MySQL-backed store

use super::{Snippet, SnippetStore, StoreError, User, UserId, UserStore, LATEST_LIMIT};
use crate::auth::password::PasswordHasher;
use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};

/// Store backed by a MySQL connection pool
#[derive(Debug, Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
    hasher: PasswordHasher,
}

impl MySqlStore {
    /// Wrap an existing pool
    #[must_use]
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            pool,
            hasher: PasswordHasher::default(),
        }
    }

    /// Open a pool and verify connectivity
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Apply the embedded schema migrations
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.into()))
    }
}

#[async_trait]
impl SnippetStore for MySqlStore {
    async fn insert(&self, title: &str, content: &str, expires_in_days: i64) -> Result<i64, StoreError> {
        let result = sqlx::query(
            "INSERT INTO snippets (title, content, created, expires) \
             VALUES (?, ?, UTC_TIMESTAMP(), DATE_ADD(UTC_TIMESTAMP(), INTERVAL ? DAY))",
        )
        .bind(title)
        .bind(content)
        .bind(expires_in_days)
        .execute(&self.pool)
        .await?;

        i64::try_from(result.last_insert_id())
            .map_err(|e| StoreError::Database(sqlx::Error::Decode(Box::new(e))))
    }

    async fn get(&self, id: i64) -> Result<Snippet, StoreError> {
        sqlx::query_as::<_, Snippet>(
            "SELECT id, title, content, created, expires FROM snippets \
             WHERE expires > UTC_TIMESTAMP() AND id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn latest(&self) -> Result<Vec<Snippet>, StoreError> {
        let snippets = sqlx::query_as::<_, Snippet>(
            "SELECT id, title, content, created, expires FROM snippets \
             WHERE expires > UTC_TIMESTAMP() ORDER BY created DESC LIMIT ?",
        )
        .bind(LATEST_LIMIT as u64)
        .fetch_all(&self.pool)
        .await?;
        Ok(snippets)
    }
}

#[async_trait]
impl UserStore for MySqlStore {
    async fn insert(&self, name: &str, email: &str, password: &str) -> Result<(), StoreError> {
        let hashed_password = self.hasher.hash_blocking(password.to_string()).await?;

        let result = sqlx::query(
            "INSERT INTO users (name, email, hashed_password, created) \
             VALUES (?, ?, ?, UTC_TIMESTAMP())",
        )
        .bind(name)
        .bind(email)
        .bind(hashed_password)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(StoreError::DuplicateEmail),
            Err(e) => Err(e.into()),
        }
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<UserId, StoreError> {
        let row: Option<(i64, String)> = sqlx::query_as(
            "SELECT id, hashed_password FROM users WHERE email = ? AND active = TRUE",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        let (id, hashed_password) = row.ok_or(StoreError::InvalidCredentials)?;
        if self
            .hasher
            .verify_blocking(password.to_string(), hashed_password)
            .await?
        {
            Ok(id)
        } else {
            Err(StoreError::InvalidCredentials)
        }
    }

    async fn get(&self, id: UserId) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            "SELECT id, name, email, hashed_password, created, active FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }
}
