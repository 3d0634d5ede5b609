//! Sessions, authentication state and password hashing

pub mod extractors;
pub mod password;
pub mod session;

pub use session::{Commit, Session, SessionError, SessionId, SessionStore};

use crate::models::UserId;

/// Authentication status of the current request
///
/// Resolved once per request by the
/// [`Authenticate`](crate::middleware::Authenticate) interceptor and stored in
/// the request extensions. Downstream stages only read it; a request that never
/// passed through the resolver is anonymous.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthState {
    /// No valid logged-in user
    #[default]
    Anonymous,
    /// An active user is logged in
    Authenticated(UserId),
}

impl AuthState {
    /// Whether an active user is logged in
    #[must_use]
    pub const fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// ID of the logged-in user
    #[must_use]
    pub const fn user_id(self) -> Option<UserId> {
        match self {
            Self::Authenticated(id) => Some(id),
            Self::Anonymous => None,
        }
    }
}
