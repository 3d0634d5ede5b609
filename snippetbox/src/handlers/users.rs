//! Signup, login and logout

use crate::auth::session::{AUTHENTICATED_USER_ID, FLASH};
use crate::auth::Session;
use crate::error::AppError;
use crate::forms::{Form, EMAIL_RX};
use crate::models::StoreError;
use crate::state::AppState;
use crate::template::{PageContext, TemplateData, LOGIN_PAGE, SIGNUP_PAGE};
use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};

/// Shortest accepted password
pub const PASSWORD_MIN_CHARS: usize = 10;

/// Longest accepted name or email
pub const FIELD_MAX_CHARS: usize = 255;

/// Blank signup form
pub async fn signup_user_form(
    State(state): State<AppState>,
    page: PageContext,
) -> Result<Html<String>, AppError> {
    Ok(page.render(state.renderer(), SIGNUP_PAGE, TemplateData::with_form(Form::empty()))?)
}

/// Validate and register a new user
///
/// A taken email address is reported on the `email` field. The name is
/// stored trimmed; the email pattern already rejects surrounding blanks.
pub async fn signup_user(
    State(state): State<AppState>,
    page: PageContext,
    session: Session,
    mut form: Form,
) -> Result<Response, AppError> {
    form.required(&["name", "email", "password"]);
    form.max_length("name", FIELD_MAX_CHARS);
    form.max_length("email", FIELD_MAX_CHARS);
    form.matches_pattern("email", &EMAIL_RX);
    form.min_length("password", PASSWORD_MIN_CHARS);

    if form.valid() {
        match state
            .users()
            .insert(
                form.get("name").trim(),
                form.get("email"),
                form.get("password"),
            )
            .await
        {
            Ok(()) => {
                session.put(FLASH, "Your signup was successful. Please log in.")?;
                return Ok(Redirect::to("/user/login").into_response());
            }
            Err(StoreError::DuplicateEmail) => {
                form.errors.add("email", "Address is already in use");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let html = page.render(state.renderer(), SIGNUP_PAGE, TemplateData::with_form(form))?;
    Ok(html.into_response())
}

/// Blank login form
pub async fn login_user_form(
    State(state): State<AppState>,
    page: PageContext,
) -> Result<Html<String>, AppError> {
    Ok(page.render(state.renderer(), LOGIN_PAGE, TemplateData::with_form(Form::empty()))?)
}

/// Check credentials and log the user in
///
/// Failures never say whether the email or the password was wrong.
pub async fn login_user(
    State(state): State<AppState>,
    page: PageContext,
    session: Session,
    mut form: Form,
) -> Result<Response, AppError> {
    match state
        .users()
        .authenticate(form.get("email"), form.get("password"))
        .await
    {
        Ok(user_id) => {
            session.put(AUTHENTICATED_USER_ID, user_id)?;
            tracing::info!(user_id, "user logged in");
            Ok(Redirect::to("/snippet/create").into_response())
        }
        Err(StoreError::InvalidCredentials) => {
            form.errors.add("generic", "Email or Password is incorrect");
            let html = page.render(state.renderer(), LOGIN_PAGE, TemplateData::with_form(form))?;
            Ok(html.into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Log the current user out
pub async fn logout_user(session: Session) -> Result<Response, AppError> {
    session.remove(AUTHENTICATED_USER_ID);
    session.put(FLASH, "You've been logged out successfully!")?;
    Ok(Redirect::to("/").into_response())
}
