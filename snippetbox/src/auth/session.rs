//! Server-side sessions identified by an opaque cookie value
//!
//! A [`SessionStore`] owns the table of live sessions shared by every request.
//! Each request works on its own [`Session`] handle, loaded before the handler
//! runs and committed back when the response is produced. Only dirty handles
//! are written back, and every write restarts the session lifetime.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Session key holding the logged-in user's ID
pub const AUTHENTICATED_USER_ID: &str = "authenticatedUserID";

/// Session key holding a one-time flash message
pub const FLASH: &str = "flash";

/// Session key holding the CSRF token
pub const CSRF_TOKEN: &str = "csrf_token";

/// Longest accepted session lifetime
const MAX_LIFETIME_DAYS: i64 = 36_500;

/// Unique session identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a new random session ID
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from a string (validates format)
    pub fn try_from_string(s: String) -> Result<Self, SessionError> {
        Uuid::parse_str(&s)
            .map(|_| Self(s))
            .map_err(|_| SessionError::InvalidSessionId)
    }

    /// Get the session ID as a string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SessionId {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from_string(s.to_string())
    }
}

#[derive(Debug)]
struct SessionState {
    id: SessionId,
    data: HashMap<String, Value>,
    dirty: bool,
    // the client holds a cookie for `id`
    persisted: bool,
}

/// Per-request session handle
///
/// Clones share state, so a value put by a handler is visible to the
/// session middleware when it commits the response.
#[derive(Debug, Clone)]
pub struct Session {
    state: Arc<Mutex<SessionState>>,
}

impl Session {
    fn from_state(id: SessionId, data: HashMap<String, Value>, persisted: bool) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState {
                id,
                data,
                dirty: false,
                persisted,
            })),
        }
    }

    /// A new, empty, anonymous session
    #[must_use]
    pub fn fresh() -> Self {
        Self::from_state(SessionId::generate(), HashMap::new(), false)
    }

    /// Session identifier
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.state.lock().id.clone()
    }

    /// Get a typed value
    #[must_use]
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let state = self.state.lock();
        state
            .data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Get a string value
    #[must_use]
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get(key)
    }

    /// Get an integer value
    #[must_use]
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key)
    }

    /// Whether a key is present
    #[must_use]
    pub fn exists(&self, key: &str) -> bool {
        self.state.lock().data.contains_key(key)
    }

    /// Store a value, marking the session dirty
    pub fn put<T: Serialize>(&self, key: &str, value: T) -> Result<(), SessionError> {
        let value = serde_json::to_value(value)?;
        let mut state = self.state.lock();
        state.data.insert(key.to_string(), value);
        state.dirty = true;
        Ok(())
    }

    /// Remove a value; the session only becomes dirty if the key existed
    pub fn remove(&self, key: &str) -> Option<Value> {
        let mut state = self.state.lock();
        let removed = state.data.remove(key);
        if removed.is_some() {
            state.dirty = true;
        }
        removed
    }

    /// Read and delete a string value
    ///
    /// Returns an empty string when the key is absent or not a string.
    #[must_use]
    pub fn pop_string(&self, key: &str) -> String {
        match self.remove(key) {
            Some(Value::String(s)) => s,
            _ => String::new(),
        }
    }

    /// Remove every key
    pub fn clear(&self) {
        let mut state = self.state.lock();
        if !state.data.is_empty() {
            state.data.clear();
            state.dirty = true;
        }
    }

    /// Whether the handle was mutated during this request
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.state.lock().dirty
    }

    /// Whether the session holds no keys
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().data.is_empty()
    }
}

#[derive(Debug)]
struct SessionRecord {
    data: HashMap<String, Value>,
    expires_at: DateTime<Utc>,
}

impl SessionRecord {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Result of committing a session handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Commit {
    /// Nothing to write; no cookie is issued
    Unchanged,
    /// Record written; the cookie must be (re)issued
    Saved(SessionId),
    /// Record deleted; the client's cookie must be expired
    Destroyed(SessionId),
}

/// Shared table of live sessions
///
/// All reads and writes go through one lock, so concurrent requests carrying
/// the same cookie are serialized and the last commit wins.
#[derive(Debug, Clone)]
pub struct SessionStore {
    records: Arc<Mutex<HashMap<SessionId, SessionRecord>>>,
    lifetime: Duration,
}

impl SessionStore {
    /// Create a store whose sessions live `lifetime` past their last write
    ///
    /// Lifetimes over a century fall back to 12 hours.
    #[must_use]
    pub fn new(lifetime: std::time::Duration) -> Self {
        let lifetime = Duration::from_std(lifetime)
            .ok()
            .filter(|lifetime| *lifetime <= Duration::days(MAX_LIFETIME_DAYS))
            .unwrap_or_else(|| {
                tracing::warn!(?lifetime, "session lifetime out of range; using 12 hours");
                Duration::hours(12)
            });
        Self {
            records: Arc::default(),
            lifetime,
        }
    }

    /// Session lifetime
    #[must_use]
    pub const fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Load the session for a cookie value
    ///
    /// Unknown or expired IDs degrade to a fresh anonymous session.
    #[must_use]
    pub fn load(&self, id: Option<&SessionId>) -> Session {
        let Some(id) = id else {
            return Session::fresh();
        };

        let now = Utc::now();
        let mut records = self.records.lock();
        match records.get(id) {
            Some(record) if !record.is_expired(now) => {
                Session::from_state(id.clone(), record.data.clone(), true)
            }
            Some(_) => {
                records.remove(id);
                tracing::debug!(session_id = %id, "session expired");
                Session::fresh()
            }
            None => Session::fresh(),
        }
    }

    /// Write a handle back to the table if it is dirty
    pub fn commit(&self, session: &Session) -> Commit {
        let mut state = session.state.lock();
        if !state.dirty {
            return Commit::Unchanged;
        }
        state.dirty = false;

        let mut records = self.records.lock();
        if state.data.is_empty() {
            let existed = records.remove(&state.id).is_some();
            if state.persisted || existed {
                state.persisted = false;
                return Commit::Destroyed(state.id.clone());
            }
            return Commit::Unchanged;
        }

        records.insert(
            state.id.clone(),
            SessionRecord {
                data: state.data.clone(),
                expires_at: Utc::now()
                    .checked_add_signed(self.lifetime)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC),
            },
        );
        state.persisted = true;
        Commit::Saved(state.id.clone())
    }

    /// Drop expired records, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut records = self.records.lock();
        let before = records.len();
        records.retain(|_, record| !record.is_expired(now));
        before - records.len()
    }

    /// Periodically purge expired records on the tokio runtime
    #[must_use]
    pub fn spawn_reaper(&self, every: std::time::Duration) -> tokio::task::JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let purged = store.purge_expired();
                if purged > 0 {
                    tracing::debug!(purged, "purged expired sessions");
                }
            }
        })
    }

    /// Number of live records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

/// Session-related errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Invalid session ID format
    #[error("invalid session ID")]
    InvalidSessionId,

    /// No session handle on the request
    #[error("session not loaded for this request")]
    Missing,

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SessionStore {
        SessionStore::new(std::time::Duration::from_secs(12 * 3600))
    }

    #[test]
    fn test_oversized_lifetime_falls_back() {
        // about 31,000 years: a valid chrono Duration, far past the cap
        let store = SessionStore::new(std::time::Duration::from_secs(1_000_000_000_000));
        assert_eq!(store.lifetime(), Duration::hours(12));

        let session = Session::fresh();
        session.put(FLASH, "x").unwrap();
        assert!(matches!(store.commit(&session), Commit::Saved(_)));
        assert!(store.load(Some(&session.id())).exists(FLASH));
    }

    #[test]
    fn test_century_lifetime_is_kept() {
        let century = std::time::Duration::from_secs(36_500 * 24 * 3600);
        let store = SessionStore::new(century);
        assert_eq!(store.lifetime(), Duration::days(36_500));

        let session = Session::fresh();
        session.put(FLASH, "x").unwrap();
        assert!(matches!(store.commit(&session), Commit::Saved(_)));
    }

    #[test]
    fn test_session_id_generate() {
        assert_ne!(SessionId::generate(), SessionId::generate());
    }

    #[test]
    fn test_session_id_invalid() {
        assert!(SessionId::try_from_string("not-a-uuid".to_string()).is_err());
        assert!("550e8400-e29b-41d4-a716-446655440000".parse::<SessionId>().is_ok());
    }

    #[test]
    fn test_put_get_marks_dirty() {
        let session = Session::fresh();
        assert!(!session.is_dirty());
        session.put(AUTHENTICATED_USER_ID, 42_i64).unwrap();
        assert!(session.is_dirty());
        assert_eq!(session.get_int(AUTHENTICATED_USER_ID), Some(42));
        assert!(session.exists(AUTHENTICATED_USER_ID));
    }

    #[test]
    fn test_pop_string_returns_value_once() {
        let session = Session::fresh();
        session.put(FLASH, "Saved!").unwrap();
        assert_eq!(session.pop_string(FLASH), "Saved!");
        assert_eq!(session.pop_string(FLASH), "");
        assert!(!session.exists(FLASH));
    }

    #[test]
    fn test_pop_string_non_string_is_empty() {
        let session = Session::fresh();
        session.put("count", 3).unwrap();
        assert_eq!(session.pop_string("count"), "");
    }

    #[test]
    fn test_remove_missing_key_stays_clean() {
        let session = Session::fresh();
        assert!(session.remove("nothing").is_none());
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_unknown_id_loads_fresh() {
        let store = store();
        let id = SessionId::generate();
        let session = store.load(Some(&id));
        assert_ne!(session.id(), id);
        assert!(session.is_empty());
    }

    #[test]
    fn test_commit_clean_session_is_unchanged() {
        let store = store();
        let session = store.load(None);
        assert_eq!(store.commit(&session), Commit::Unchanged);
        assert!(store.is_empty());
    }

    #[test]
    fn test_commit_and_reload() {
        let store = store();
        let session = store.load(None);
        session.put(FLASH, "hello").unwrap();
        let Commit::Saved(id) = store.commit(&session) else {
            panic!("expected save");
        };
        assert!(!session.is_dirty());

        let reloaded = store.load(Some(&id));
        assert_eq!(reloaded.id(), id);
        assert_eq!(reloaded.pop_string(FLASH), "hello");
        assert!(matches!(store.commit(&reloaded), Commit::Destroyed(_)));

        let after = store.load(Some(&id));
        assert_eq!(after.pop_string(FLASH), "");
    }

    #[test]
    fn test_emptying_a_fresh_session_issues_nothing() {
        let store = store();
        let session = store.load(None);
        session.put(FLASH, "x").unwrap();
        session.clear();
        assert_eq!(store.commit(&session), Commit::Unchanged);
    }

    #[test]
    fn test_expired_session_loads_fresh() {
        let store = SessionStore::new(std::time::Duration::ZERO);
        let session = store.load(None);
        session.put(AUTHENTICATED_USER_ID, 1).unwrap();
        let Commit::Saved(id) = store.commit(&session) else {
            panic!("expected save");
        };

        let reloaded = store.load(Some(&id));
        assert_ne!(reloaded.id(), id);
        assert!(!reloaded.exists(AUTHENTICATED_USER_ID));
        assert!(store.is_empty());
    }

    #[test]
    fn test_purge_expired() {
        let store = SessionStore::new(std::time::Duration::ZERO);
        for _ in 0..3 {
            let session = store.load(None);
            session.put(FLASH, "x").unwrap();
            store.commit(&session);
        }
        assert_eq!(store.len(), 3);
        assert_eq!(store.purge_expired(), 3);
        assert!(store.is_empty());
    }
}
