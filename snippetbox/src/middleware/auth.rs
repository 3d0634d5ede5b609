//! Authentication resolution and the login gate
//!
//! [`Authenticate`] runs on every application request and decides, once, who
//! the request is from. A session claiming a user ID is only trusted while
//! that user still exists and is active; otherwise the stale ID is removed
//! from the session and the request continues anonymously. The outcome is
//! stored as an [`AuthState`] request extension.
//!
//! [`RequireAuthentication`] guards protected routes using that state.

use super::chain::{Handler, Interceptor};
use super::session::request_session;
use crate::auth::session::AUTHENTICATED_USER_ID;
use crate::auth::{AuthState, Session};
use crate::error::AppError;
use crate::models::{StoreError, UserId, UserStore};
use async_trait::async_trait;
use axum::{
    extract::Request,
    http::{header::CACHE_CONTROL, HeaderValue},
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

/// Where anonymous visitors of protected pages are sent
pub const LOGIN_PATH: &str = "/user/login";

/// Per-request authentication outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    /// No user ID in the session
    Anonymous,
    /// The session names an active user
    Authenticated(UserId),
    /// The session names a user that is gone or deactivated
    Invalidated,
}

/// Resolves the [`AuthState`] of each request
#[derive(Clone)]
pub struct Authenticate {
    users: Arc<dyn UserStore>,
}

impl std::fmt::Debug for Authenticate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticate").finish_non_exhaustive()
    }
}

impl Authenticate {
    /// Resolve users against `users`
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    async fn resolve(&self, session: &Session) -> Result<Resolution, StoreError> {
        if !session.exists(AUTHENTICATED_USER_ID) {
            return Ok(Resolution::Anonymous);
        }
        let Some(user_id) = session.get_int(AUTHENTICATED_USER_ID) else {
            return Ok(Resolution::Invalidated);
        };

        match self.users.get(user_id).await {
            Ok(user) if user.active => Ok(Resolution::Authenticated(user_id)),
            Ok(_) | Err(StoreError::NotFound) => Ok(Resolution::Invalidated),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl Interceptor for Authenticate {
    async fn intercept(&self, mut request: Request, next: Handler) -> Response {
        let Some(session) = request_session(&request) else {
            tracing::warn!("authentication skipped: no session on request");
            request.extensions_mut().insert(AuthState::Anonymous);
            return next.run(request).await;
        };

        let state = match self.resolve(&session).await {
            Ok(Resolution::Anonymous) => AuthState::Anonymous,
            Ok(Resolution::Authenticated(user_id)) => AuthState::Authenticated(user_id),
            Ok(Resolution::Invalidated) => {
                let stale = session.remove(AUTHENTICATED_USER_ID);
                tracing::info!(user_id = ?stale, "dropped stale user from session");
                AuthState::Anonymous
            }
            Err(e) => return AppError::from(e).into_response(),
        };

        request.extensions_mut().insert(state);
        next.run(request).await
    }
}

/// Redirects anonymous requests to the login page
///
/// Authenticated responses are marked `Cache-Control: no-store`.
#[derive(Clone, Debug)]
pub struct RequireAuthentication {
    login_path: String,
}

impl Default for RequireAuthentication {
    fn default() -> Self {
        Self {
            login_path: LOGIN_PATH.to_string(),
        }
    }
}

impl RequireAuthentication {
    /// Gate redirecting to [`LOGIN_PATH`]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gate redirecting to a custom login path
    #[must_use]
    pub fn with_login_path(login_path: impl Into<String>) -> Self {
        Self {
            login_path: login_path.into(),
        }
    }
}

#[async_trait]
impl Interceptor for RequireAuthentication {
    async fn intercept(&self, request: Request, next: Handler) -> Response {
        let authenticated = request
            .extensions()
            .get::<AuthState>()
            .is_some_and(|state| state.is_authenticated());

        if !authenticated {
            return Redirect::to(&self.login_path).into_response();
        }

        let mut response = next.run(request).await;
        response
            .headers_mut()
            .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
        response
    }
}
