//! In-process store used when no database is configured, and by the tests

use super::{Snippet, SnippetStore, StoreError, User, UserId, UserStore, LATEST_LIMIT};
use crate::auth::password::PasswordHasher;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Tables {
    snippets: Vec<Snippet>,
    users: Vec<User>,
    last_snippet_id: i64,
    last_user_id: UserId,
}

impl Tables {
    /// IDs only ever grow, so a deleted row's ID is never handed out again
    fn next_snippet_id(&mut self) -> i64 {
        self.last_snippet_id += 1;
        self.last_snippet_id
    }

    fn next_user_id(&mut self) -> UserId {
        self.last_user_id += 1;
        self.last_user_id
    }
}

/// Store backed by process memory
///
/// Cloning shares the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    hasher: PasswordHasher,
}

impl MemoryStore {
    /// Create an empty store with default Argon2 costs
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with a specific password hasher
    #[must_use]
    pub fn with_hasher(hasher: PasswordHasher) -> Self {
        Self {
            tables: Arc::default(),
            hasher,
        }
    }

    /// Activate or deactivate a user
    pub fn set_active(&self, id: UserId, active: bool) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::NotFound)?;
        user.active = active;
        Ok(())
    }

    /// Delete a user
    pub fn delete_user(&self, id: UserId) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        if tables.users.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Number of stored snippets, expired ones included
    #[must_use]
    pub fn snippet_count(&self) -> usize {
        self.tables.read().snippets.len()
    }

    fn user_by_email(&self, email: &str) -> Option<User> {
        self.tables
            .read()
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned()
    }
}

#[async_trait]
impl SnippetStore for MemoryStore {
    async fn insert(&self, title: &str, content: &str, expires_in_days: i64) -> Result<i64, StoreError> {
        let created = Utc::now();
        let mut tables = self.tables.write();
        let id = tables.next_snippet_id();
        tables.snippets.push(Snippet {
            id,
            title: title.to_string(),
            content: content.to_string(),
            created,
            expires: created + Duration::days(expires_in_days),
        });
        Ok(id)
    }

    async fn get(&self, id: i64) -> Result<Snippet, StoreError> {
        let now = Utc::now();
        self.tables
            .read()
            .snippets
            .iter()
            .find(|s| s.id == id && s.expires > now)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn latest(&self) -> Result<Vec<Snippet>, StoreError> {
        let now = Utc::now();
        let mut snippets: Vec<Snippet> = self
            .tables
            .read()
            .snippets
            .iter()
            .filter(|s| s.expires > now)
            .cloned()
            .collect();
        snippets.sort_by(|a, b| b.created.cmp(&a.created).then(b.id.cmp(&a.id)));
        snippets.truncate(LATEST_LIMIT);
        Ok(snippets)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, name: &str, email: &str, password: &str) -> Result<(), StoreError> {
        if self.user_by_email(email).is_some() {
            return Err(StoreError::DuplicateEmail);
        }
        let hashed_password = self.hasher.hash_blocking(password.to_string()).await?;

        let mut tables = self.tables.write();
        // re-check under the write lock; hashing ran unlocked
        if tables.users.iter().any(|u| u.email == email) {
            return Err(StoreError::DuplicateEmail);
        }
        let id = tables.next_user_id();
        tables.users.push(User {
            id,
            name: name.to_string(),
            email: email.to_string(),
            hashed_password,
            created: Utc::now(),
            active: true,
        });
        Ok(())
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<UserId, StoreError> {
        let user = self
            .user_by_email(email)
            .filter(|u| u.active)
            .ok_or(StoreError::InvalidCredentials)?;

        let matches = self
            .hasher
            .verify_blocking(password.to_string(), user.hashed_password)
            .await?;
        if matches {
            Ok(user.id)
        } else {
            Err(StoreError::InvalidCredentials)
        }
    }

    async fn get(&self, id: UserId) -> Result<User, StoreError> {
        self.tables
            .read()
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}
