//! Snippet and user records and the store interface
//!
//! Handlers and the auth gate only talk to the [`SnippetStore`] and
//! [`UserStore`] traits. Failures the request pipeline reacts to are typed:
//! [`StoreError::NotFound`], [`StoreError::DuplicateEmail`] and
//! [`StoreError::InvalidCredentials`]. Everything else is a server error.

mod memory;
mod mysql;

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

use crate::auth::password::PasswordError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Database identifier of a user
pub type UserId = i64;

/// A short-lived text snippet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Snippet {
    /// Snippet ID
    pub id: i64,
    /// Title
    pub title: String,
    /// Body text
    pub content: String,
    /// Creation time
    pub created: DateTime<Utc>,
    /// Time after which the snippet is no longer shown
    pub expires: DateTime<Utc>,
}

/// A registered user
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    /// User ID
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Unique email address
    pub email: String,
    /// Argon2 PHC hash string
    pub hashed_password: String,
    /// Registration time
    pub created: DateTime<Utc>,
    /// Deactivated users can neither log in nor stay logged in
    pub active: bool,
}

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// No matching record
    #[error("no matching record found")]
    NotFound,

    /// Email address already registered
    #[error("duplicate email")]
    DuplicateEmail,

    /// Unknown email, wrong password or inactive account
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Password hashing failure
    #[error("password error: {0}")]
    Password(#[from] PasswordError),

    /// Backend failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Snippet persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnippetStore: Send + Sync {
    /// Insert a snippet expiring `expires_in_days` from now, returning its ID
    async fn insert(&self, title: &str, content: &str, expires_in_days: i64) -> Result<i64, StoreError>;

    /// Fetch an unexpired snippet
    async fn get(&self, id: i64) -> Result<Snippet, StoreError>;

    /// The ten most recently created unexpired snippets, newest first
    async fn latest(&self) -> Result<Vec<Snippet>, StoreError>;
}

/// User persistence and credential checks
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Register a user, hashing the password
    async fn insert(&self, name: &str, email: &str, password: &str) -> Result<(), StoreError>;

    /// Check credentials of an active user, returning the user ID
    async fn authenticate(&self, email: &str, password: &str) -> Result<UserId, StoreError>;

    /// Fetch a user by ID
    async fn get(&self, id: UserId) -> Result<User, StoreError>;
}

/// Number of snippets listed on the home page
pub const LATEST_LIMIT: usize = 10;
