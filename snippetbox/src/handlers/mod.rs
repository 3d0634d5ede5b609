//! Route handlers
//!
//! Handlers run inside the dynamic chain, so the session, CSRF token and
//! authentication state are already attached to the request. Validation
//! problems and the domain failures a visitor can cause are turned into a
//! re-rendered page here; everything else propagates as an [`AppError`].

pub mod snippets;
pub mod users;

pub use snippets::{create_snippet, create_snippet_form, home, show_snippet};
pub use users::{login_user, login_user_form, logout_user, signup_user, signup_user_form};

use crate::error::AppError;

/// Fallback for unknown routes
///
/// # Errors
///
/// Always returns [`AppError::NotFound`].
pub async fn not_found() -> Result<(), AppError> {
    Err(AppError::NotFound)
}
