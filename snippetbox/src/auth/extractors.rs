//! Extractors for the per-request session and authentication state
//!
//! ```rust,no_run
//! use snippetbox::auth::{AuthState, Session};
//!
//! async fn handler(auth: AuthState, session: Session) -> String {
//!     match auth.user_id() {
//!         Some(id) => format!("user {id}, session {}", session.id()),
//!         None => "anonymous".to_string(),
//!     }
//! }
//! ```

use super::{AuthState, Session, SessionError};
use crate::error::AppError;
use axum::{extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| SessionError::Missing.into())
    }
}

impl<S> FromRequestParts<S> for AuthState
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().copied().unwrap_or_default())
    }
}
